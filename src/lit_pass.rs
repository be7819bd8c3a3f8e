//! Phong-lit entity rendering with depth testing.
//!
//! [`LitPass`] owns everything entities share: the pipeline, the per-frame
//! uniform buffer, the bind group layouts, a default white texture and the
//! depth buffer. Each entity owns its own uniform buffer and bind groups,
//! created through [`LitPass::create_entity_binding`] and
//! [`LitPass::create_texture_bind_group`].
//!
//! # Bind Groups
//!
//! - **Group 0**: [`FrameUniforms`] (view, projection, camera and light position)
//! - **Group 1**: [`EntityUniforms`] (model and normal matrices, Phong coefficients)
//! - **Group 2**: texture and sampler
//!
//! If the shader fails to compile the pass has no pipeline. Entities then skip
//! drawing and the rest of the frame carries on.

use glam::Mat4;

use crate::gpu::GpuContext;
use crate::material::Material;
use crate::mesh::Vertex3d;
use crate::scene::FrameContext;
use crate::shader::{LIT_SHADER, compile_shader};
use crate::texture::Texture;

/// Per-frame uniforms, written once before any entity draws.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    /// Elapsed time in seconds.
    pub time: f32,
    pub light_pos: [f32; 3],
    pub _pad: f32,
}

impl FrameUniforms {
    pub fn new(frame: &FrameContext) -> Self {
        Self {
            view: frame.view.to_cols_array_2d(),
            proj: frame.projection.to_cols_array_2d(),
            camera_pos: frame.camera_position.to_array(),
            time: frame.time,
            light_pos: frame.light_position.to_array(),
            _pad: 0.0,
        }
    }
}

/// Per-entity uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EntityUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix.
    pub normal_matrix: [[f32; 4]; 4],
    pub ka: f32,
    pub kd: f32,
    pub ks: f32,
    pub shininess: f32,
}

impl EntityUniforms {
    pub fn new(model: Mat4, material: &Material) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            ka: material.ka,
            kd: material.kd,
            ks: material.ks,
            shininess: material.shininess,
        }
    }
}

/// GPU resources backing one entity's group 1 binding.
#[derive(Debug)]
pub struct EntityBinding {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
}

impl EntityBinding {
    pub fn write(&self, gpu: &GpuContext, uniforms: &EntityUniforms) {
        gpu.queue
            .write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniforms));
    }
}

/// Shared state for drawing lit entities.
pub struct LitPass {
    pipeline: Option<wgpu::RenderPipeline>,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    entity_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    default_texture_bind_group: wgpu::BindGroup,
    #[allow(dead_code)]
    default_texture: Texture,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl LitPass {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates the pass, compiling the built-in lit shader.
    pub fn new(gpu: &GpuContext) -> Self {
        Self::with_shader(gpu, LIT_SHADER)
    }

    /// Creates the pass with custom WGSL source.
    ///
    /// The source must expose `vs` and `fs` entry points matching the bind
    /// group layout above.
    pub fn with_shader(gpu: &GpuContext, source: &str) -> Self {
        let device = &gpu.device;

        // Frame uniform buffer (group 0)
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group_layout = uniform_layout(device, "Frame Bind Group Layout");

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // Entity uniforms (group 1), one buffer per entity
        let entity_bind_group_layout = uniform_layout(device, "Entity Bind Group Layout");

        // Texture bind group layout (group 2)
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let default_texture = Texture::white(gpu);
        let default_texture_bind_group =
            texture_bind_group(gpu, &texture_bind_group_layout, &default_texture);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lit Pipeline Layout"),
            bind_group_layouts: &[
                &frame_bind_group_layout,
                &entity_bind_group_layout,
                &texture_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let pipeline = match compile_shader(gpu, "Lit Shader", source) {
            Ok(shader) => Some(Self::create_pipeline(gpu, &pipeline_layout, &shader)),
            Err(e) => {
                log::error!("{}; entities will not be drawn", e);
                None
            }
        };

        let (depth_texture, depth_view) = Self::create_depth_texture(gpu);

        Self {
            pipeline,
            frame_buffer,
            frame_bind_group,
            entity_bind_group_layout,
            texture_bind_group_layout,
            default_texture_bind_group,
            default_texture,
            depth_texture,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    fn create_pipeline(
        gpu: &GpuContext,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        gpu.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Lit Pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                // No culling: model winding is not guaranteed.
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: Self::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    /// Whether the pipeline compiled and entities can be drawn.
    pub fn is_ready(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Allocates a uniform buffer and bind group for one entity.
    pub fn create_entity_binding(&self, gpu: &GpuContext, label: &str) -> EntityBinding {
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Uniforms", label)),
            size: std::mem::size_of::<EntityUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", label)),
            layout: &self.entity_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        EntityBinding { buffer, bind_group }
    }

    /// Creates a group 2 bind group for a texture.
    pub fn create_texture_bind_group(&self, gpu: &GpuContext, texture: &Texture) -> wgpu::BindGroup {
        texture_bind_group(gpu, &self.texture_bind_group_layout, texture)
    }

    /// Bind group for the 1x1 white texture.
    pub fn default_texture_bind_group(&self) -> &wgpu::BindGroup {
        &self.default_texture_bind_group
    }

    /// Uploads the frame uniforms. Call once per frame before drawing.
    pub fn write_frame(&self, gpu: &GpuContext, frame: &FrameContext) {
        let uniforms = FrameUniforms::new(frame);
        gpu.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Sets the pipeline and frame bind group.
    ///
    /// Returns `false` without touching the pass when there is no pipeline.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass) -> bool {
        let Some(pipeline) = &self.pipeline else {
            return false;
        };
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
        true
    }

    fn create_depth_texture(gpu: &GpuContext) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            let (texture, view) = Self::create_depth_texture(gpu);
            self.depth_texture = texture;
            self.depth_view = view;
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn depth_texture(&self) -> &wgpu::Texture {
        &self.depth_texture
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn texture_bind_group(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
) -> wgpu::BindGroup {
    gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Lit Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 160);
        assert_eq!(std::mem::size_of::<EntityUniforms>(), 144);
    }

    #[test]
    fn entity_uniforms_carry_material() {
        let material = Material {
            ka: 0.2,
            kd: 0.4,
            ks: 0.6,
            shininess: 8.0,
        };
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let u = EntityUniforms::new(model, &material);
        assert_eq!(u.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!((u.ka, u.kd, u.ks, u.shininess), (0.2, 0.4, 0.6, 8.0));
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let u = EntityUniforms::new(model, &Material::default());
        let n = Mat4::from_cols_array_2d(&u.normal_matrix);
        let normal = n.transform_vector3(Vec3::X);
        assert!((normal - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn frame_uniforms_from_context() {
        let frame = FrameContext {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::new(0.0, 0.0, 3.0),
            light_position: Vec3::new(1.0, 5.0, 1.0),
            time: 2.5,
        };
        let u = FrameUniforms::new(&frame);
        assert_eq!(u.camera_pos, [0.0, 0.0, 3.0]);
        assert_eq!(u.light_pos, [1.0, 5.0, 1.0]);
        assert_eq!(u.time, 2.5);
    }
}
