//! Mesh data structures and functionality

use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices and faces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
    pub colors: Option<Vec<[u8; 3]>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
            colors: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
            colors: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Calculate face normals
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];

                let edge1 = v1 - v0;
                let edge2 = v2 - v0;

                edge1.cross(&edge2).try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::zeros)
            })
            .collect()
    }

    /// Compute smooth vertex normals by accumulating area-weighted face normals.
    ///
    /// Vertices not referenced by any face get `+Z`.
    pub fn compute_vertex_normals(&mut self) {
        let mut accum = vec![Vector3f::zeros(); self.vertices.len()];

        for face in &self.faces {
            let v0 = self.vertices[face[0]];
            let v1 = self.vertices[face[1]];
            let v2 = self.vertices[face[2]];
            // Unnormalized cross product is proportional to the triangle area
            let n = (v1 - v0).cross(&(v2 - v0));
            for &i in face {
                accum[i] += n;
            }
        }

        let normals = accum
            .into_iter()
            .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::z))
            .collect();
        self.normals = Some(normals);
    }

    /// Set vertex normals
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }

    /// Set vertex colors
    pub fn set_colors(&mut self, colors: Vec<[u8; 3]>) {
        if colors.len() == self.vertices.len() {
            self.colors = Some(colors);
        }
    }

    /// Append another mesh, re-indexing its faces.
    ///
    /// Per-vertex attributes are kept only when both meshes carry them.
    pub fn append(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len();
        let was_empty = self.vertices.is_empty();

        self.normals = match (self.normals.take(), &other.normals) {
            (Some(mut a), Some(b)) => {
                a.extend_from_slice(b);
                Some(a)
            }
            (None, Some(b)) if was_empty => Some(b.clone()),
            _ => None,
        };
        self.colors = match (self.colors.take(), &other.colors) {
            (Some(mut a), Some(b)) => {
                a.extend_from_slice(b);
                Some(a)
            }
            (None, Some(b)) if was_empty => Some(b.clone()),
            _ => None,
        };

        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
    }

    /// Axis-aligned box centered at `center`, flat shaded and uniformly colored.
    pub fn cuboid(center: Point3f, half_extents: Vector3f, color: [u8; 3]) -> Self {
        let (hx, hy, hz) = (half_extents.x, half_extents.y, half_extents.z);
        // (normal, four corners counter-clockwise seen from outside)
        let sides: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]]),
            ([0.0, 0.0, -1.0], [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]]),
            ([0.0, 1.0, 0.0], [[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]]),
            ([0.0, -1.0, 0.0], [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]]),
            ([1.0, 0.0, 0.0], [[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]]),
            ([-1.0, 0.0, 0.0], [[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]]),
        ];

        let mut mesh = TriangleMesh::new();
        let mut normals = Vec::with_capacity(24);
        for (normal, corners) in sides.iter() {
            let base = mesh.vertices.len();
            for c in corners {
                mesh.add_vertex(center + Vector3f::new(c[0], c[1], c[2]));
                normals.push(Vector3f::new(normal[0], normal[1], normal[2]));
            }
            mesh.add_face([base, base + 1, base + 2]);
            mesh.add_face([base + 2, base + 3, base]);
        }
        mesh.normals = Some(normals);
        mesh.colors = Some(vec![color; mesh.vertices.len()]);
        mesh
    }

    /// Procedural stand-in product shown when no model file is given:
    /// a base plate, a column and an arm with a camera head.
    pub fn demo_machine() -> Self {
        let mut mesh = TriangleMesh::cuboid(
            Point3f::new(0.0, -0.9, 0.0),
            Vector3f::new(0.8, 0.1, 0.6),
            [70, 78, 90],
        );
        mesh.append(&TriangleMesh::cuboid(
            Point3f::new(0.0, -0.1, 0.0),
            Vector3f::new(0.15, 0.7, 0.15),
            [200, 205, 210],
        ));
        mesh.append(&TriangleMesh::cuboid(
            Point3f::new(0.45, 0.55, 0.0),
            Vector3f::new(0.45, 0.08, 0.1),
            [200, 205, 210],
        ));
        mesh.append(&TriangleMesh::cuboid(
            Point3f::new(0.9, 0.4, 0.0),
            Vector3f::new(0.12, 0.12, 0.12),
            [40, 150, 220],
        ));
        mesh
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Drawable;
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_normals_of_flat_quad() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [2, 3, 0]],
        );
        mesh.compute_vertex_normals();

        let normals = mesh.normals.as_ref().unwrap();
        assert_eq!(normals.len(), 4);
        for n in normals {
            assert_relative_eq!(n.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_unreferenced_vertex_gets_default_normal() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![Point3f::origin(), Point3f::new(1.0, 0.0, 0.0)],
            vec![],
        );
        mesh.compute_vertex_normals();
        assert_eq!(mesh.normals.unwrap()[1], Vector3f::z());
    }

    #[test]
    fn test_cuboid_layout() {
        let cube = TriangleMesh::cuboid(Point3f::origin(), Vector3f::new(1.0, 2.0, 3.0), [1, 2, 3]);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.face_count(), 12);

        let (min, max) = cube.bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -2.0, -3.0));
        assert_eq!(max, Point3f::new(1.0, 2.0, 3.0));

        // Winding must agree with the stored outward normals
        let face_normals = cube.calculate_face_normals();
        let normals = cube.normals.as_ref().unwrap();
        for (face, fn_) in cube.faces.iter().zip(face_normals.iter()) {
            assert_relative_eq!(fn_.dot(&normals[face[0]]), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_append_reindexes_faces() {
        let mut a = TriangleMesh::cuboid(Point3f::origin(), Vector3f::repeat(0.5), [0, 0, 0]);
        let b = TriangleMesh::cuboid(Point3f::new(2.0, 0.0, 0.0), Vector3f::repeat(0.5), [9, 9, 9]);
        a.append(&b);

        assert_eq!(a.vertex_count(), 48);
        assert_eq!(a.face_count(), 24);
        assert_eq!(a.faces[12], [24, 25, 26]);
        assert_eq!(a.colors.as_ref().unwrap()[30], [9, 9, 9]);
        assert_eq!(a.normals.as_ref().unwrap().len(), 48);
    }

    #[test]
    fn test_demo_machine_is_renderable() {
        let machine = TriangleMesh::demo_machine();
        assert!(!machine.is_empty());
        assert!(machine.faces.iter().flatten().all(|&i| i < machine.vertex_count()));
        assert_eq!(machine.colors.as_ref().unwrap().len(), machine.vertex_count());
    }
}
