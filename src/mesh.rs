//! GPU meshes and the vertex format they share.
//!
//! - [`Vertex`]: position, normal, texture coordinate and tangent
//! - [`Mesh`]: immutable vertex + index buffers on the GPU
//!
//! # Vertex Layout
//!
//! Interleaved, 44 bytes per vertex:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | texcoord  | Float32x2 | 24     | 2               |
//! | tangent   | Float32x3 | 32     | 3               |
//!
//! # Winding Order
//!
//! Built-in primitives use counter-clockwise front faces, matching the
//! back-face culling of the geometry and shadow passes.

use std::hash::{Hash, Hasher};

use crate::geometry::RawGeometry;
use crate::gpu::GpuContext;

/// A mesh vertex.
///
/// Equality and hashing consider position, normal and texcoord only; the
/// tangent is derived data and two vertices that differ only there are the
/// same vertex for deduplication.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
    pub tangent: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
            3 => Float32x3,
        ],
    };

    /// Creates a vertex with a zero tangent.
    pub fn new(position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            texcoord,
            tangent: [0.0; 3],
        }
    }

    fn key(&self) -> impl Iterator<Item = f32> + '_ {
        self.position
            .iter()
            .chain(self.normal.iter())
            .chain(self.texcoord.iter())
            .copied()
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.key().eq(other.key())
    }
}

// NaN components make a vertex unequal to itself; such vertices simply never
// merge during deduplication.
impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for component in self.key() {
            // -0.0 == 0.0, so both must hash alike.
            let canonical = if component == 0.0 { 0.0f32 } else { component };
            canonical.to_bits().hash(state);
        }
    }
}

/// GPU-resident geometry with vertex and index buffers.
///
/// Immutable after creation. [`Mesh::bind`] only sets the buffers on a pass;
/// the renderer issues the indexed draw of [`element_count`](Self::element_count)
/// indices.
#[derive(Debug)]
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    element_count: u32,
}

impl Mesh {
    /// Uploads vertex and index data (u32 indices, triangle list).
    pub fn new(gpu: &GpuContext, vertices: &[Vertex], indices: &[u32]) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        log::debug!(
            "mesh: {} indices, {} vertices",
            indices.len(),
            vertices.len()
        );

        Self {
            vertex_buffer,
            index_buffer,
            element_count: indices.len() as u32,
        }
    }

    /// Number of indices drawn for this mesh.
    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    /// Sets this mesh's vertex and index buffers on `pass`.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Unit cube centered at the origin with per-face normals and tangents.
    pub fn cube(gpu: &GpuContext) -> Self {
        RawGeometry::cube().upload(gpu)
    }

    /// UV sphere of radius 0.5.
    pub fn sphere(gpu: &GpuContext, segments: u32, rings: u32) -> Self {
        RawGeometry::sphere(segments, rings).upload(gpu)
    }

    /// Square on the XZ plane facing +Y.
    pub fn plane(gpu: &GpuContext, size: f32) -> Self {
        RawGeometry::plane(size).upload(gpu)
    }

    /// Two triangles covering clip space, used by the lighting pass.
    pub fn fullscreen_quad(gpu: &GpuContext) -> Self {
        RawGeometry::fullscreen_quad().upload(gpu)
    }
}
