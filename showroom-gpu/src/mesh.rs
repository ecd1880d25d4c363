//! Mesh vertex format and GPU-resident meshes

use crate::GpuContext;
use bytemuck::{Pod, Zeroable};
use showroom_core::TriangleMesh;

/// Color used for vertices without one
pub const DEFAULT_VERTEX_COLOR: [f32; 3] = [0.7, 0.7, 0.72];

/// Vertex data for mesh rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

    /// Vertex buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Flatten a triangle mesh into vertex and index arrays.
///
/// Missing normals are computed; colors are converted from 8-bit to `[0, 1]`.
pub fn mesh_to_vertices(mesh: &TriangleMesh) -> (Vec<MeshVertex>, Vec<u32>) {
    let computed;
    let normals = match &mesh.normals {
        Some(normals) if normals.len() == mesh.vertices.len() => normals,
        _ => {
            let mut copy = mesh.clone();
            copy.compute_vertex_normals();
            computed = copy.normals.unwrap_or_default();
            &computed
        }
    };

    let vertices = mesh
        .vertices
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let normal = normals.get(i).map(|n| [n.x, n.y, n.z]).unwrap_or([0.0, 0.0, 1.0]);
            let color = mesh
                .colors
                .as_ref()
                .and_then(|c| c.get(i))
                .map(|c| [c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0])
                .unwrap_or(DEFAULT_VERTEX_COLOR);
            MeshVertex {
                position: [p.x, p.y, p.z],
                normal,
                color,
            }
        })
        .collect();

    let indices = mesh
        .faces
        .iter()
        .flat_map(|face| face.iter().map(|&i| i as u32))
        .collect();

    (vertices, indices)
}

/// A mesh uploaded to vertex and index buffers
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    /// Upload a mesh once; the buffers are immutable afterwards
    pub fn upload(context: &GpuContext, mesh: &TriangleMesh) -> Self {
        let (vertices, indices) = mesh_to_vertices(mesh);
        log::debug!("Uploading mesh: {} vertices, {} indices", vertices.len(), indices.len());

        Self {
            vertex_buffer: context.create_buffer_init("Mesh Vertex Buffer", &vertices, wgpu::BufferUsages::VERTEX),
            index_buffer: context.create_buffer_init("Mesh Index Buffer", &indices, wgpu::BufferUsages::INDEX),
            index_count: indices.len() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.index_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use showroom_core::{Point3f, Vector3f};

    fn triangle() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 36);
        assert_eq!(MeshVertex::desc().array_stride, 36);
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let (vertices, indices) = mesh_to_vertices(&triangle());
        assert_eq!(indices, vec![0, 1, 2]);
        for v in &vertices {
            assert_relative_eq!(v.normal[2], 1.0, epsilon = 1e-6);
            assert_eq!(v.color, DEFAULT_VERTEX_COLOR);
        }
    }

    #[test]
    fn test_colors_and_normals_are_carried() {
        let mut mesh = triangle();
        mesh.set_normals(vec![Vector3f::new(0.0, 1.0, 0.0); 3]);
        mesh.set_colors(vec![[255, 0, 51]; 3]);

        let (vertices, _) = mesh_to_vertices(&mesh);
        assert_eq!(vertices[1].normal, [0.0, 1.0, 0.0]);
        assert_relative_eq!(vertices[2].color[0], 1.0);
        assert_relative_eq!(vertices[2].color[2], 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_upload_when_gpu_available() {
        let context = match pollster::block_on(GpuContext::new()) {
            Ok(context) => context,
            Err(_) => {
                println!("⚠️  GPU not available, skipping GPU-dependent test");
                return;
            }
        };

        let gpu_mesh = GpuMesh::upload(&context, &TriangleMesh::demo_machine());
        assert!(!gpu_mesh.is_empty());
        assert_eq!(gpu_mesh.index_count as usize, TriangleMesh::demo_machine().face_count() * 3);
    }
}
