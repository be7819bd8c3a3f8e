//! Vertex format and GPU-resident mesh geometry.
//!
//! Entities are drawn from a flat, non-indexed triangle list: every face of a
//! model file is expanded into three [`Vertex3d`] values at load time, so a
//! [`Mesh`] is nothing more than a vertex buffer and the number of vertices to
//! draw.
//!
//! # Vertex Layout
//!
//! The [`Vertex3d`] struct uses the following GPU layout (32 bytes per vertex):
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | uv        | Float32x2 | 12     | 1               |
//! | normal    | Float32x3 | 20     | 2               |
//!
//! This layout is exposed via [`Vertex3d::LAYOUT`] for pipeline creation.

use crate::gpu::GpuContext;

/// A vertex with position, texture coordinates and normal, 8 floats wide.
///
/// `#[repr(C)]` keeps the interleaved layout predictable for GPU upload, and
/// the [`bytemuck`] derives allow casting a vertex slice straight to bytes.
///
/// # Example
///
/// ```
/// use vitrine::Vertex3d;
///
/// let vertex = Vertex3d::new(
///     [0.0, 1.0, 0.0], // position
///     [0.5, 0.5],      // uv
///     [0.0, 1.0, 0.0], // normal
/// );
/// assert_eq!(vertex.to_array()[3], 0.5);
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Model-space position.
    pub position: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
    /// Surface normal as written in the source file (not re-normalized).
    pub normal: [f32; 3],
}

impl Vertex3d {
    /// Number of floats per vertex in the interleaved buffer.
    pub const FLOATS: usize = 8;

    /// The wgpu vertex buffer layout for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 20,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    /// Creates a new vertex from its three attributes.
    pub fn new(position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }

    /// Returns the vertex as its 8 interleaved floats.
    pub fn to_array(&self) -> [f32; Self::FLOATS] {
        let [px, py, pz] = self.position;
        let [u, v] = self.uv;
        let [nx, ny, nz] = self.normal;
        [px, py, pz, u, v, nx, ny, nz]
    }
}

/// GPU-resident, non-indexed triangle list.
///
/// A `Mesh` is immutable after creation. It is drawn with a plain
/// `draw(0..vertex_count)` call, three vertices per triangle.
#[derive(Debug)]
pub struct Mesh {
    /// The GPU buffer containing interleaved vertex data.
    pub(crate) vertex_buffer: wgpu::Buffer,
    /// Number of vertices to draw.
    pub(crate) vertex_count: u32,
}

impl Mesh {
    /// Uploads the given vertices into a new vertex buffer.
    ///
    /// An empty slice produces a valid mesh that draws nothing.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", label)),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    /// Number of vertices in the buffer.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Returns true when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_eight_floats() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 8 * 4);
        assert_eq!(Vertex3d::LAYOUT.array_stride, 32);
    }

    #[test]
    fn vertex_interleaves_position_uv_normal() {
        let v = Vertex3d::new([1.0, 2.0, 3.0], [4.0, 5.0], [6.0, 7.0, 8.0]);
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);

        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&v));
        assert_eq!(floats, &v.to_array());
    }
}
