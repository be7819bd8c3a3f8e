//! A renderable object in the scene and its per-frame behavior.
//!
//! An [`Entity`] is plain state until [`Entity::initialize`] gives it GPU
//! resources. Everything that moves it (trajectory playback, interactive
//! commands, the auto-rotate spin) works without a GPU, and drawing an entity
//! that has no geometry is a no-op.

use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};

use crate::geometry::load_model;
use crate::gpu::GpuContext;
use crate::lit_pass::{EntityBinding, EntityUniforms, LitPass};
use crate::material::Material;
use crate::mesh::Mesh;
use crate::scene::FrameContext;
use crate::texture::Texture;
use crate::trajectory::Trajectory;

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 1.0;
/// Scale change per scale command.
pub const SCALE_STEP: f32 = 0.1;
/// Distance moved along world Z per move command.
pub const MOVE_STEP: f32 = 0.1;

/// A world axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// Which axis, if any, the entity spins around.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AutoRotate {
    #[default]
    None,
    X,
    Y,
    Z,
}

impl AutoRotate {
    pub fn axis(self) -> Option<Axis> {
        match self {
            AutoRotate::None => None,
            AutoRotate::X => Some(Axis::X),
            AutoRotate::Y => Some(Axis::Y),
            AutoRotate::Z => Some(Axis::Z),
        }
    }

    /// Toggling the active axis stops the spin, any other axis replaces it.
    pub fn toggled(self, axis: Axis) -> Self {
        if self.axis() == Some(axis) {
            AutoRotate::None
        } else {
            match axis {
                Axis::X => AutoRotate::X,
                Axis::Y => AutoRotate::Y,
                Axis::Z => AutoRotate::Z,
            }
        }
    }
}

/// Construction parameters for an [`Entity`].
#[derive(Clone, Debug, PartialEq)]
pub struct EntityDescriptor {
    /// Display name. Empty uses the model's file stem.
    pub name: String,
    pub position: Vec3,
    /// Initial rotation in degrees.
    pub rotation: Vec3,
    pub scale: f32,
    /// Carried for scene authors, not used by the lit shader.
    pub color: Vec3,
    pub model: PathBuf,
    pub material: PathBuf,
    /// Empty means no texture.
    pub texture: PathBuf,
}

impl Default for EntityDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            color: Vec3::ONE,
            model: PathBuf::new(),
            material: PathBuf::new(),
            texture: PathBuf::new(),
        }
    }
}

/// GPU state created once by `initialize`.
#[derive(Debug)]
struct EntityGpu {
    mesh: Mesh,
    binding: EntityBinding,
    #[allow(dead_code)]
    texture: Option<Texture>,
    texture_bind_group: Option<wgpu::BindGroup>,
}

#[derive(Debug)]
pub struct Entity {
    name: String,
    position: Vec3,
    /// Radians.
    rotation: Vec3,
    /// Radians.
    initial_rotation: Vec3,
    scale: f32,
    color: Vec3,
    auto_rotate: AutoRotate,
    material: Material,
    trajectory: Option<Trajectory>,
    model_path: PathBuf,
    material_path: PathBuf,
    texture_path: PathBuf,
    initialized: bool,
    gpu: Option<EntityGpu>,
}

impl Entity {
    pub fn new(desc: EntityDescriptor) -> Self {
        let name = if desc.name.is_empty() {
            desc.model
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "entity".to_string())
        } else {
            desc.name
        };

        let rotation = Vec3::new(
            desc.rotation.x.to_radians(),
            desc.rotation.y.to_radians(),
            desc.rotation.z.to_radians(),
        );

        Self {
            name,
            position: desc.position,
            rotation,
            initial_rotation: rotation,
            scale: desc.scale.clamp(MIN_SCALE, MAX_SCALE),
            color: desc.color,
            auto_rotate: AutoRotate::None,
            material: Material::default(),
            trajectory: None,
            model_path: desc.model,
            material_path: desc.material,
            texture_path: desc.texture,
            initialized: false,
            gpu: None,
        }
    }

    /// Loads a trajectory file and starts following it, optionally with a
    /// custom progress step.
    ///
    /// Returns `false` (and keeps the static pose) if the file cannot be used.
    pub fn load_trajectory(&mut self, path: impl AsRef<Path>, step: Option<f32>) -> bool {
        let path = path.as_ref();
        match Trajectory::load(path) {
            Ok(trajectory) => {
                self.set_trajectory(match step {
                    Some(step) => trajectory.with_step(step),
                    None => trajectory,
                });
                true
            }
            Err(e) => {
                log::warn!("{}: {}; keeping static pose", self.name, e);
                false
            }
        }
    }

    /// Starts following `trajectory`, snapping to its first control point.
    pub fn set_trajectory(&mut self, trajectory: Trajectory) {
        let (position, rotation) = trajectory.start();
        self.position = position;
        self.rotation = rotation;
        self.trajectory = Some(trajectory);
    }

    /// Loads geometry, material and texture. Only the first call does work.
    pub fn initialize(&mut self, gpu: &GpuContext, lit_pass: &LitPass) {
        if self.initialized {
            log::debug!("{}: already initialized", self.name);
            return;
        }
        self.initialized = true;

        match load_model(gpu, &self.model_path, &self.material_path, &self.texture_path) {
            Ok(loaded) => {
                self.material = loaded.material;
                let texture_bind_group = loaded
                    .texture
                    .as_ref()
                    .map(|texture| lit_pass.create_texture_bind_group(gpu, texture));
                self.gpu = Some(EntityGpu {
                    mesh: loaded.mesh,
                    binding: lit_pass.create_entity_binding(gpu, &self.name),
                    texture: loaded.texture,
                    texture_bind_group,
                });
            }
            Err(e) => {
                log::error!("{}: {}; entity will not be drawn", self.name, e);
            }
        }
    }

    /// Advances the trajectory, if one is active.
    pub fn update(&mut self) {
        if let Some(trajectory) = &mut self.trajectory {
            let (position, rotation) = trajectory.advance();
            self.position = position;
            self.rotation = rotation;
        }
    }

    /// Translation, uniform scale, base rotation (X then Y then Z), then the
    /// auto-rotate spin of `time` radians.
    pub fn model_matrix(&self, time: f32) -> Mat4 {
        let rotation = if self.follows_trajectory() {
            self.rotation
        } else {
            self.initial_rotation
        };

        let mut model = Mat4::from_translation(self.position)
            * Mat4::from_scale(Vec3::splat(self.scale))
            * Mat4::from_rotation_x(rotation.x)
            * Mat4::from_rotation_y(rotation.y)
            * Mat4::from_rotation_z(rotation.z);

        if let Some(axis) = self.auto_rotate.axis() {
            model *= Mat4::from_axis_angle(axis.unit(), time);
        }

        model
    }

    /// Records a draw of this entity into `render_pass`.
    pub fn draw(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        lit_pass: &LitPass,
        frame: &FrameContext,
    ) {
        let Some(res) = &self.gpu else {
            return;
        };
        if res.mesh.is_empty() || !lit_pass.bind(render_pass) {
            return;
        }

        let uniforms = EntityUniforms::new(self.model_matrix(frame.time), &self.material);
        res.binding.write(gpu, &uniforms);

        let texture_bind_group = res
            .texture_bind_group
            .as_ref()
            .unwrap_or(lit_pass.default_texture_bind_group());

        render_pass.set_bind_group(1, &res.binding.bind_group, &[]);
        render_pass.set_bind_group(2, texture_bind_group, &[]);
        render_pass.set_vertex_buffer(0, res.mesh.vertex_buffer.slice(..));
        render_pass.draw(0..res.mesh.vertex_count, 0..1);
    }

    pub fn toggle_rotate(&mut self, axis: Axis) {
        self.auto_rotate = self.auto_rotate.toggled(axis);
        log::debug!("{}: auto-rotate {:?}", self.name, self.auto_rotate);
    }

    pub fn toggle_rotate_x(&mut self) {
        self.toggle_rotate(Axis::X);
    }

    pub fn toggle_rotate_y(&mut self) {
        self.toggle_rotate(Axis::Y);
    }

    pub fn toggle_rotate_z(&mut self) {
        self.toggle_rotate(Axis::Z);
    }

    pub fn scale_up(&mut self) {
        self.scale = (self.scale + SCALE_STEP).min(MAX_SCALE);
    }

    pub fn scale_down(&mut self) {
        self.scale = (self.scale - SCALE_STEP).max(MIN_SCALE);
    }

    /// Moves along world -Z.
    pub fn move_forward(&mut self) {
        self.position.z -= MOVE_STEP;
    }

    pub fn move_backward(&mut self) {
        self.position.z += MOVE_STEP;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current rotation in radians.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn auto_rotate(&self) -> AutoRotate {
        self.auto_rotate
    }

    pub fn follows_trajectory(&self) -> bool {
        self.trajectory.is_some()
    }

    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.trajectory.as_ref()
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn vertex_count(&self) -> u32 {
        self.gpu.as_ref().map_or(0, |res| res.mesh.vertex_count())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a draw call would actually emit geometry.
    pub fn is_drawable(&self) -> bool {
        self.vertex_count() > 0
    }
}
