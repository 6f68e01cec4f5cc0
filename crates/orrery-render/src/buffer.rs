//! Vertex and index buffer management for GPU rendering.

use bytemuck::{Pod, Zeroable};
use orrery_assets::MeshData;
use wgpu::util::DeviceExt;

/// A complete mesh buffer containing vertex and index data ready for GPU rendering.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub index_format: wgpu::IndexFormat,
}

impl MeshBuffer {
    /// Bind vertex and index buffers to a render pass.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), self.index_format);
    }

    /// Draw the entire mesh using indexed rendering.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Index data that can be either u16 or u32 format.
pub enum IndexData<'a> {
    U16(&'a [u16]),
    U32(&'a [u32]),
}

impl IndexData<'_> {
    /// Get the appropriate wgpu index format for this data.
    pub fn format(&self) -> wgpu::IndexFormat {
        match self {
            IndexData::U16(_) => wgpu::IndexFormat::Uint16,
            IndexData::U32(_) => wgpu::IndexFormat::Uint32,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            IndexData::U16(data) => data.len() as u32,
            IndexData::U32(data) => data.len() as u32,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(data) => bytemuck::cast_slice(data),
            IndexData::U32(data) => bytemuck::cast_slice(data),
        }
    }
}

/// GPU buffer allocator for creating vertex and index buffers.
pub struct BufferAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferAllocator<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    /// Create a complete mesh buffer from vertex and index data.
    pub fn create_mesh(&self, label: &str, vertices: &[u8], indices: IndexData) -> MeshBuffer {
        let vertex_buffer = self.create_buffer(
            &format!("{label}-vertices"),
            vertices,
            wgpu::BufferUsages::VERTEX,
        );
        let index_buffer = self.create_buffer(
            &format!("{label}-indices"),
            indices.as_bytes(),
            wgpu::BufferUsages::INDEX,
        );
        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: indices.count(),
            index_format: indices.format(),
        }
    }

    /// Upload a loaded mesh, using 16-bit indices when they fit.
    pub fn upload_mesh(&self, label: &str, mesh: &MeshData) -> MeshBuffer {
        let vertices: Vec<VertexPositionNormalUv> =
            mesh.vertices.iter().map(VertexPositionNormalUv::from).collect();
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);

        if mesh.vertices.len() <= usize::from(u16::MAX) {
            let narrow: Vec<u16> = mesh.indices.iter().map(|&i| i as u16).collect();
            self.create_mesh(label, bytes, IndexData::U16(&narrow))
        } else {
            self.create_mesh(label, bytes, IndexData::U32(&mesh.indices))
        }
    }

    /// Uniform buffer initialised from `data`, writable every frame.
    pub fn create_uniform_buffer(&self, label: &str, data: &[u8]) -> wgpu::Buffer {
        self.create_buffer(label, data, wgpu::BufferUsages::UNIFORM)
    }

    fn create_buffer(&self, label: &str, data: &[u8], usage: wgpu::BufferUsages) -> wgpu::Buffer {
        // Index and vertex buffers must be a multiple of 4 bytes; an odd u16 count is padded.
        let padded;
        let contents = if data.len() % 4 == 0 {
            data
        } else {
            let mut v = data.to_vec();
            v.resize(data.len().next_multiple_of(4), 0);
            padded = v;
            &padded
        };
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            })
    }
}

/// Position, normal and UV, 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPositionNormalUv {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl From<&orrery_assets::MeshVertex> for VertexPositionNormalUv {
    fn from(v: &orrery_assets::MeshVertex) -> Self {
        Self {
            position: v.position.to_array(),
            normal: v.normal.to_array(),
            uv: v.uv.to_array(),
        }
    }
}

impl VertexPositionNormalUv {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    /// Get the vertex buffer layout for this vertex type.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPositionNormalUv>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// One triangle in the XY plane facing +Z.
#[cfg(test)]
pub(crate) fn triangle() -> MeshData {
    use glam::{Vec2, Vec3};
    use orrery_assets::MeshVertex;

    let vertices = vec![
        MeshVertex {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            uv: Vec2::ZERO,
        },
        MeshVertex {
            position: Vec3::X,
            normal: Vec3::Z,
            uv: Vec2::X,
        },
        MeshVertex {
            position: Vec3::Y,
            normal: Vec3::Z,
            uv: Vec2::Y,
        },
    ];
    MeshData {
        bounds: orrery_math::Aabb::from_points(vertices.iter().map(|v| v.position)),
        vertices,
        indices: vec![0, 1, 2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device_queue;

    #[test]
    fn test_vertex_layout_stride() {
        let layout = VertexPositionNormalUv::layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[2].offset, 24);
    }

    #[test]
    fn test_vertex_from_mesh_vertex() {
        let mesh = triangle();
        let v = VertexPositionNormalUv::from(&mesh.vertices[1]);
        assert_eq!(v.position, [1.0, 0.0, 0.0]);
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        assert_eq!(v.uv, [1.0, 0.0]);
    }

    #[test]
    fn test_index_data_as_bytes() {
        assert_eq!(IndexData::U16(&[0, 1, 2]).as_bytes().len(), 6);
        assert_eq!(IndexData::U32(&[0, 1, 2]).as_bytes().len(), 12);
        assert_eq!(IndexData::U16(&[0]).format(), wgpu::IndexFormat::Uint16);
        assert_eq!(IndexData::U32(&[0]).format(), wgpu::IndexFormat::Uint32);
    }

    #[test]
    fn test_upload_small_mesh_uses_u16() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mesh = BufferAllocator::new(&device).upload_mesh("tri", &triangle());
        assert_eq!(mesh.index_count, 3);
        assert_eq!(mesh.index_format, wgpu::IndexFormat::Uint16);
        // 3 u16 indices are padded to 8 bytes.
        assert_eq!(mesh.index_buffer.size(), 8);
        assert_eq!(mesh.vertex_buffer.size(), 96);
    }
}
