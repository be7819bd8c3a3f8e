//! Scene description, entity list and per-frame orchestration.
//!
//! A scene file is JSON:
//!
//! ```json
//! {
//!   "camera": { "position": [0, 0, 3], "front": [0, 0, -1], "up": [0, 1, 0], "fov": 100 },
//!   "light": { "position": [1, 2, 3] },
//!   "entities": [
//!     {
//!       "position": [0, 0, 0], "rotation": [0, 45, 0], "scale": 0.5,
//!       "obj": "models/cube.obj", "mtl": "models/cube.mtl",
//!       "texture": "textures/crate.png", "trajectory": ""
//!     }
//!   ]
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the scene file.
//! An empty `texture` or `trajectory` means "none".

use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};
use serde::Deserialize;

use crate::camera::Camera;
use crate::entity::{Entity, EntityDescriptor};
use crate::gpu::GpuContext;
use crate::input::Command;
use crate::lit_pass::LitPass;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to read scene '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scene description: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraDescription {
    pub position: [f32; 3],
    pub front: [f32; 3],
    pub up: [f32; 3],
    /// Degrees.
    pub fov: f32,
}

impl Default for CameraDescription {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            front: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
            fov: 100.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightDescription {
    pub position: [f32; 3],
}

impl Default for LightDescription {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, 5.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EntityDescription {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: [f32; 3],
    /// Degrees.
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: f32,
    pub obj: PathBuf,
    #[serde(default)]
    pub mtl: PathBuf,
    #[serde(default)]
    pub texture: PathBuf,
    #[serde(default)]
    pub trajectory: PathBuf,
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    #[serde(default)]
    pub trajectory_step: Option<f32>,
}

fn default_scale() -> f32 {
    1.0
}

fn default_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl EntityDescription {
    pub fn descriptor(&self) -> EntityDescriptor {
        EntityDescriptor {
            name: self.name.clone().unwrap_or_default(),
            position: Vec3::from(self.position),
            rotation: Vec3::from(self.rotation),
            scale: self.scale,
            color: Vec3::from(self.color),
            model: self.obj.clone(),
            material: self.mtl.clone(),
            texture: self.texture.clone(),
        }
    }
}

/// The deserialized scene file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub camera: CameraDescription,
    pub light: LightDescription,
    pub entities: Vec<EntityDescription>,
}

impl SceneDescription {
    /// Parses JSON. Paths are left exactly as written.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a scene file and resolves its asset paths against the file's
    /// directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut desc = Self::from_json(&json)?;
        if let Some(dir) = path.parent() {
            desc.resolve_paths(dir);
        }
        Ok(desc)
    }

    /// Joins every non-empty relative asset path onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for entity in &mut self.entities {
            for path in [
                &mut entity.obj,
                &mut entity.mtl,
                &mut entity.texture,
                &mut entity.trajectory,
            ] {
                if !path.as_os_str().is_empty() && path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }
}

/// Per-frame render state shared read-only by every entity draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub light_position: Vec3,
    /// Seconds since the viewer started.
    pub time: f32,
}

/// The camera, the light and the ordered entity list.
#[derive(Debug)]
pub struct Scene {
    camera: Camera,
    light_position: Vec3,
    entities: Vec<Entity>,
    selected: usize,
}

impl Default for Scene {
    fn default() -> Self {
        Self::empty()
    }
}

impl Scene {
    /// An empty scene with a default camera.
    pub fn empty() -> Self {
        Self {
            camera: Camera::default(),
            light_position: Vec3::from(LightDescription::default().position),
            entities: Vec::new(),
            selected: 0,
        }
    }

    /// Builds the camera, light and entities, loading trajectories.
    pub fn from_description(desc: SceneDescription) -> Self {
        let mut camera = Camera::default()
            .with_position(desc.camera.position)
            .with_world_up(desc.camera.up)
            .with_fov(desc.camera.fov);
        camera.look_toward(desc.camera.front);

        let entities = desc
            .entities
            .iter()
            .map(|ed| {
                let mut entity = Entity::new(ed.descriptor());
                if !ed.trajectory.as_os_str().is_empty() {
                    entity.load_trajectory(&ed.trajectory, ed.trajectory_step);
                }
                entity
            })
            .collect();

        Self {
            camera,
            light_position: Vec3::from(desc.light.position),
            entities,
            selected: 0,
        }
    }

    /// Loads a scene file. Any failure is logged and yields an empty scene.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match SceneDescription::load(path) {
            Ok(desc) => {
                log::info!(
                    "Loaded scene '{}' with {} entities",
                    path.display(),
                    desc.entities.len()
                );
                Self::from_description(desc)
            }
            Err(e) => {
                log::error!("{}; starting with an empty scene", e);
                Self::empty()
            }
        }
    }

    /// Uploads every entity's assets.
    pub fn initialize(&mut self, gpu: &GpuContext, lit_pass: &LitPass) {
        for entity in &mut self.entities {
            entity.initialize(gpu, lit_pass);
        }
        let drawable = self.entities.iter().filter(|e| e.is_drawable()).count();
        log::info!("{}/{} entities drawable", drawable, self.entities.len());
    }

    /// Advances every trajectory, in scene order.
    pub fn update(&mut self) {
        for entity in &mut self.entities {
            entity.update();
        }
    }

    pub fn frame_context(&self, aspect: f32, time: f32) -> FrameContext {
        FrameContext {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(aspect),
            camera_position: self.camera.position,
            light_position: self.light_position,
            time,
        }
    }

    /// Writes the frame uniforms and draws every entity, in scene order.
    pub fn draw(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        lit_pass: &LitPass,
        frame: &FrameContext,
    ) {
        lit_pass.write_frame(gpu, frame);
        for entity in &self.entities {
            entity.draw(gpu, render_pass, lit_pass, frame);
        }
    }

    /// Applies an input command. `Quit` is left to the caller.
    pub fn apply(&mut self, command: Command) {
        if let Command::Camera(movement) = command {
            self.camera.process_keyboard(movement);
            return;
        }

        if command == Command::SelectNext {
            if !self.entities.is_empty() {
                self.selected = (self.selected + 1) % self.entities.len();
                log::info!(
                    "Selected entity {} ('{}')",
                    self.selected,
                    self.entities[self.selected].name()
                );
            }
            return;
        }

        let Some(entity) = self.entities.get_mut(self.selected) else {
            return;
        };
        match command {
            Command::ToggleRotate(axis) => entity.toggle_rotate(axis),
            Command::ScaleUp => entity.scale_up(),
            Command::ScaleDown => entity.scale_down(),
            Command::MoveForward => entity.move_forward(),
            Command::MoveBackward => entity.move_backward(),
            Command::Camera(_) | Command::SelectNext | Command::Quit => {}
        }
    }

    /// Mouse look. Positive `dy` looks up.
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.camera.process_mouse_movement(dx, dy);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn light_position(&self) -> Vec3 {
        self.light_position
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn push(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&Entity> {
        self.entities.get(self.selected)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraMovement;
    use crate::entity::{AutoRotate, Axis};

    const SCENE: &str = r#"{
        "camera": { "position": [0, 1, 5], "front": [0, 0, -1], "up": [0, 1, 0], "fov": 60 },
        "light": { "position": [2, 4, 6] },
        "entities": [
            {
                "position": [1, 0, 0], "rotation": [0, 90, 0], "scale": 0.5,
                "obj": "models/a.obj", "mtl": "models/a.mtl",
                "texture": "", "trajectory": "", "name": "first"
            },
            { "obj": "/abs/b.obj", "color": [1, 0, 0] }
        ]
    }"#;

    fn scene() -> Scene {
        Scene::from_description(SceneDescription::from_json(SCENE).unwrap())
    }

    #[test]
    fn parses_with_defaults() {
        let desc = SceneDescription::from_json(SCENE).unwrap();
        assert_eq!(desc.camera.fov, 60.0);
        assert_eq!(desc.light.position, [2.0, 4.0, 6.0]);
        assert_eq!(desc.entities.len(), 2);

        let second = &desc.entities[1];
        assert_eq!(second.name, None);
        assert_eq!(second.scale, 1.0);
        assert_eq!(second.position, [0.0, 0.0, 0.0]);
        assert_eq!(second.color, [1.0, 0.0, 0.0]);
        assert!(second.texture.as_os_str().is_empty());
        assert_eq!(second.trajectory_step, None);
    }

    #[test]
    fn empty_document_is_default_scene() {
        let desc = SceneDescription::from_json("{}").unwrap();
        assert_eq!(desc, SceneDescription::default());
        assert_eq!(desc.camera.fov, 100.0);
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert!(matches!(
            SceneDescription::from_json("{ not json"),
            Err(SceneError::Parse(_))
        ));
    }

    #[test]
    fn relative_paths_resolve_against_scene_dir() {
        let mut desc = SceneDescription::from_json(SCENE).unwrap();
        desc.resolve_paths(Path::new("assets"));

        let first = &desc.entities[0];
        assert_eq!(first.obj, PathBuf::from("assets/models/a.obj"));
        assert_eq!(first.mtl, PathBuf::from("assets/models/a.mtl"));
        assert!(first.texture.as_os_str().is_empty());
        assert!(first.trajectory.as_os_str().is_empty());
        assert_eq!(desc.entities[1].obj, PathBuf::from("/abs/b.obj"));
    }

    #[test]
    fn builds_camera_light_and_entities() {
        let scene = scene();
        assert_eq!(scene.camera().position, Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(scene.camera().fov, 60.0);
        assert!((scene.camera().front() - Vec3::NEG_Z).length() < 1e-5);
        assert_eq!(scene.light_position(), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.entities()[0].name(), "first");
        assert_eq!(scene.entities()[0].scale(), 0.5);
        assert_eq!(scene.entities()[1].name(), "b");
    }

    #[test]
    fn missing_scene_file_is_empty_scene() {
        let scene = Scene::load("definitely/not/here.json");
        assert!(scene.is_empty());
        assert_eq!(scene.camera().position, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn load_resolves_and_loads_trajectory() {
        let dir = std::env::temp_dir().join(format!("vitrine-scene-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("path.txt"),
            "5 0 0 0 0 0\n6 0 0 0 0 0\n7 0 0 0 0 0\n8 0 0 0 0 0\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("scene.json"),
            r#"{ "entities": [ { "obj": "m.obj", "trajectory": "path.txt", "trajectory_step": 0.25 } ] }"#,
        )
        .unwrap();

        let mut scene = Scene::load(dir.join("scene.json"));
        std::fs::remove_dir_all(&dir).ok();

        let entity = &scene.entities()[0];
        assert!(entity.follows_trajectory());
        assert_eq!(entity.position(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(entity.trajectory().map(|t| t.step()), Some(0.25));

        scene.update();
        scene.update();
        assert_eq!(scene.entities()[0].trajectory().map(|t| t.progress()), Some(0.5));
    }

    #[test]
    fn bundled_scene_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/scene.json");
        let scene = Scene::load(&path);
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.entities()[0].name(), "center cube");
        assert!(!scene.entities()[0].follows_trajectory());
        assert!(scene.entities()[1].follows_trajectory());
        assert_eq!(scene.entities()[1].position(), Vec3::new(-2.0, 0.0, 0.0));
    }

    #[test]
    fn select_next_wraps() {
        let mut scene = scene();
        assert_eq!(scene.selected_index(), 0);
        scene.apply(Command::SelectNext);
        assert_eq!(scene.selected_index(), 1);
        scene.apply(Command::SelectNext);
        assert_eq!(scene.selected_index(), 0);
    }

    #[test]
    fn entity_commands_hit_selected_entity() {
        let mut scene = scene();
        scene.apply(Command::SelectNext);
        scene.apply(Command::ToggleRotate(Axis::X));
        scene.apply(Command::ScaleDown);
        scene.apply(Command::MoveForward);

        let [first, second] = scene.entities() else {
            panic!("expected two entities");
        };
        assert_eq!(first.auto_rotate(), AutoRotate::None);
        assert_eq!(first.scale(), 0.5);
        assert_eq!(second.auto_rotate(), AutoRotate::X);
        assert!((second.scale() - 0.9).abs() < 1e-6);
        assert!((second.position().z + 0.1).abs() < 1e-6);
    }

    #[test]
    fn empty_scene_ignores_entity_commands() {
        let mut scene = Scene::empty();
        scene.apply(Command::SelectNext);
        scene.apply(Command::ScaleUp);
        scene.apply(Command::MoveBackward);
        scene.apply(Command::Quit);
        assert_eq!(scene.selected_index(), 0);
        assert!(scene.selected().is_none());
    }

    #[test]
    fn camera_commands_and_look() {
        let mut scene = Scene::empty();
        scene.apply(Command::Camera(CameraMovement::Forward));
        assert!((scene.camera().position.z - 2.95).abs() < 1e-6);

        scene.look(0.0, 100.0);
        assert!((scene.camera().pitch() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn frame_context_carries_camera_and_light() {
        let scene = scene();
        let frame = scene.frame_context(1.0, 3.0);
        assert_eq!(frame.camera_position, Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(frame.light_position, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(frame.time, 3.0);
        assert_eq!(frame.view, scene.camera().view_matrix());
        assert_eq!(frame.projection, scene.camera().projection_matrix(1.0));
    }

    #[test]
    fn up_parallel_to_front_keeps_a_valid_camera() {
        let desc = SceneDescription::from_json(
            r#"{ "camera": { "front": [0, 0, -1], "up": [0, 0, -1] } }"#,
        )
        .unwrap();
        let scene = Scene::from_description(desc);
        let camera = scene.camera();
        assert_eq!(camera.world_up(), Vec3::Y);
        assert!(camera.right().is_finite() && camera.up().is_finite());
        assert!(camera.view_matrix().is_finite());
    }
}
