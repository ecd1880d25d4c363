//! glTF 2.0 support (`.glb` and `.gltf`)
//!
//! The default scene (or the first one) is flattened into a single mesh:
//! node transforms are baked into the vertices, normals come from the file
//! when every primitive has them and are recomputed otherwise, and vertex
//! colors are the material's base color factor times any `COLOR_0`.
//! Textures, skins and animations are ignored. Only triangle-list
//! primitives are read.

use crate::progress::{LoadProgress, ProgressReader};
use crate::MeshReader;
use gltf::mesh::Mode;
use gltf::{Document, Gltf, Node, Primitive};
use nalgebra::{Matrix3, Matrix4};
use showroom_core::{Error, Point3f, Result, TriangleMesh, Vector3f};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub struct GltfReader;

impl GltfReader {
    /// Parse a `.glb` blob or `.gltf` JSON document.
    ///
    /// External buffers of a `.gltf` are resolved relative to `base`.
    pub fn read_from_slice(bytes: &[u8], base: Option<&Path>) -> Result<TriangleMesh> {
        let Gltf { document, blob } = Gltf::from_slice(bytes).map_err(gltf_error)?;
        let buffers = gltf::import_buffers(&document, base, blob).map_err(gltf_error)?;
        flatten(&document, &buffers)
    }

    /// Read a glTF file, reporting byte progress
    pub fn read_mesh_with_progress<P, F>(path: P, mut on_progress: F) -> Result<TriangleMesh>
    where
        P: AsRef<Path>,
        F: FnMut(LoadProgress),
    {
        let path = path.as_ref();
        let file = File::open(path)?;
        let total = file.metadata()?.len();
        on_progress(LoadProgress::new(0, total));

        let mut bytes = Vec::with_capacity(total as usize);
        ProgressReader::new(file, total, &mut on_progress).read_to_end(&mut bytes)?;

        let mesh = Self::read_from_slice(&bytes, path.parent())?;
        on_progress(LoadProgress::complete(total));
        Ok(mesh)
    }
}

impl MeshReader for GltfReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        Self::read_mesh_with_progress(path, |_| {})
    }
}

fn gltf_error(error: gltf::Error) -> Error {
    match error {
        gltf::Error::Io(e) => Error::Io(e),
        other => Error::InvalidData(format!("glTF error: {}", other)),
    }
}

fn flatten(document: &Document, buffers: &[gltf::buffer::Data]) -> Result<TriangleMesh> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| Error::InvalidData("glTF document has no scene".to_string()))?;

    let mut builder = MeshBuilder::new(buffers);
    for node in scene.nodes() {
        builder.visit(&node, &Matrix4::identity())?;
    }
    Ok(builder.finish())
}

struct MeshBuilder<'a> {
    buffers: &'a [gltf::buffer::Data],
    vertices: Vec<Point3f>,
    normals: Vec<Vector3f>,
    colors: Vec<[u8; 3]>,
    faces: Vec<[usize; 3]>,
    complete_normals: bool,
}

impl<'a> MeshBuilder<'a> {
    fn new(buffers: &'a [gltf::buffer::Data]) -> Self {
        Self {
            buffers,
            vertices: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            faces: Vec::new(),
            complete_normals: true,
        }
    }

    fn visit(&mut self, node: &Node, parent: &Matrix4<f32>) -> Result<()> {
        let world = parent * Matrix4::from(node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                self.add_primitive(&primitive, &world)?;
            }
        }
        for child in node.children() {
            self.visit(&child, &world)?;
        }
        Ok(())
    }

    fn add_primitive(&mut self, primitive: &Primitive, world: &Matrix4<f32>) -> Result<()> {
        if primitive.mode() != Mode::Triangles {
            log::debug!("Skipping glTF primitive with mode {:?}", primitive.mode());
            return Ok(());
        }

        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

        let Some(positions) = reader.read_positions() else {
            log::warn!("Skipping glTF primitive without positions");
            return Ok(());
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let count = positions.len();
        let base = self.vertices.len();

        let linear = world.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix3::identity);

        self.vertices
            .extend(positions.iter().map(|p| world.transform_point(&Point3f::new(p[0], p[1], p[2]))));

        match reader.read_normals() {
            Some(normals) => {
                let normals: Vec<[f32; 3]> = normals.collect();
                if normals.len() != count {
                    return Err(Error::InvalidData(format!(
                        "glTF primitive has {} normals for {} positions",
                        normals.len(),
                        count
                    )));
                }
                self.normals.extend(normals.iter().map(|n| {
                    (normal_matrix * Vector3f::new(n[0], n[1], n[2]))
                        .try_normalize(f32::EPSILON)
                        .unwrap_or_else(Vector3f::z)
                }));
            }
            None => {
                self.complete_normals = false;
                self.normals.extend(std::iter::repeat(Vector3f::z()).take(count));
            }
        }

        let factor = primitive.material().pbr_metallic_roughness().base_color_factor();
        let vertex_colors: Option<Vec<[u8; 3]>> = reader.read_colors(0).map(|c| c.into_rgb_u8().collect());
        match vertex_colors {
            Some(colors) if colors.len() == count => {
                self.colors.extend(colors.iter().map(|c| tint(*c, factor)));
            }
            Some(colors) => {
                return Err(Error::InvalidData(format!(
                    "glTF primitive has {} colors for {} positions",
                    colors.len(),
                    count
                )));
            }
            None => self.colors.extend(std::iter::repeat(tint([255; 3], factor)).take(count)),
        }

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..count as u32).collect(),
        };
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= count) {
            return Err(Error::InvalidData(format!(
                "glTF index {} out of range for {} vertices",
                index, count
            )));
        }
        if indices.len() % 3 != 0 {
            log::warn!("glTF triangle list has {} indices, ignoring the remainder", indices.len());
        }

        // A mirroring transform flips the winding
        let mirrored = linear.determinant() < 0.0;
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize + base, tri[1] as usize + base, tri[2] as usize + base];
            self.faces.push(if mirrored { [a, c, b] } else { [a, b, c] });
        }
        Ok(())
    }

    fn finish(self) -> TriangleMesh {
        let complete_normals = self.complete_normals;
        let mut mesh = TriangleMesh::from_vertices_and_faces(self.vertices, self.faces);
        mesh.set_colors(self.colors);
        if complete_normals {
            mesh.set_normals(self.normals);
        } else {
            mesh.compute_vertex_normals();
        }
        mesh
    }
}

fn tint(color: [u8; 3], factor: [f32; 4]) -> [u8; 3] {
    let channel = |c: u8, f: f32| (c as f32 * f).round().clamp(0.0, 255.0) as u8;
    [
        channel(color[0], factor[0]),
        channel(color[1], factor[1]),
        channel(color[2], factor[2]),
    ]
}
