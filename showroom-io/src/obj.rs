//! OBJ format support
//!
//! Faces with more than three corners are fan-triangulated. Texture
//! coordinates and file normals are ignored; smooth vertex normals are
//! recomputed from the geometry.

use crate::progress::{LoadProgress, ProgressReader};
use crate::MeshReader;
use obj::raw::object::Polygon;
use obj::raw::{parse_obj, RawObj};
use showroom_core::{Error, Point3f, Result, TriangleMesh};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub struct ObjReader;

impl ObjReader {
    /// Parse OBJ data from any buffered reader
    pub fn read_from<R: BufRead>(reader: R) -> Result<TriangleMesh> {
        let raw = parse_obj(reader).map_err(|e| Error::InvalidData(format!("OBJ parse error: {}", e)))?;
        build_mesh(raw)
    }

    /// Read an OBJ file, reporting byte progress
    pub fn read_mesh_with_progress<P, F>(path: P, mut on_progress: F) -> Result<TriangleMesh>
    where
        P: AsRef<Path>,
        F: FnMut(LoadProgress),
    {
        let file = File::open(path.as_ref())?;
        let total = file.metadata()?.len();
        on_progress(LoadProgress::new(0, total));

        let mesh = {
            let reader = ProgressReader::new(file, total, &mut on_progress);
            Self::read_from(BufReader::new(reader))?
        };

        on_progress(LoadProgress::complete(total));
        Ok(mesh)
    }
}

impl MeshReader for ObjReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        Self::read_mesh_with_progress(path, |_| {})
    }
}

fn build_mesh(raw: RawObj) -> Result<TriangleMesh> {
    let vertices: Vec<Point3f> = raw
        .positions
        .iter()
        .map(|&(x, y, z, _w)| Point3f::new(x, y, z))
        .collect();

    let mut faces = Vec::with_capacity(raw.polygons.len());
    for polygon in &raw.polygons {
        let corners = polygon_positions(polygon);
        if corners.len() < 3 {
            log::debug!("Skipping degenerate OBJ face with {} corners", corners.len());
            continue;
        }
        if let Some(&index) = corners.iter().find(|&&i| i >= vertices.len()) {
            return Err(Error::InvalidData(format!(
                "OBJ face references vertex {} but only {} are defined",
                index + 1,
                vertices.len()
            )));
        }
        for i in 1..corners.len() - 1 {
            faces.push([corners[0], corners[i], corners[i + 1]]);
        }
    }

    if faces.is_empty() && !vertices.is_empty() {
        log::warn!("OBJ data contains {} vertices but no faces", vertices.len());
    }

    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
    mesh.compute_vertex_normals();
    Ok(mesh)
}

fn polygon_positions(polygon: &Polygon) -> Vec<usize> {
    match polygon {
        Polygon::P(indices) => indices.clone(),
        Polygon::PT(indices) => indices.iter().map(|&(p, _)| p).collect(),
        Polygon::PN(indices) => indices.iter().map(|&(p, _)| p).collect(),
        Polygon::PTN(indices) => indices.iter().map(|&(p, _, _)| p).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;
    use std::io::Cursor;

    const QUAD: &str = "\
# unit quad in the XY plane
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 1.0
f 1//1 2//1 3//1 4//1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = ObjReader::read_from(Cursor::new(QUAD)).unwrap();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);

        let normals = mesh.normals.as_ref().unwrap();
        for n in normals {
            assert_relative_eq!(n.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mixed_index_forms() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1 2 3
f 1/1 2/2 4/3
f 2/2/1 3/3/1 4/1/1
";
        let mesh = ObjReader::read_from(Cursor::new(source)).unwrap();
        assert_eq!(mesh.face_count(), 3);
        assert_eq!(mesh.faces[2], [1, 2, 3]);
    }

    #[test]
    fn test_out_of_range_index_is_invalid_data() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n";
        let result = ObjReader::read_from(Cursor::new(source));
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_file_progress_is_monotone_and_completes() {
        let path = std::env::temp_dir().join("showroom_io_progress.obj");
        let mut source = String::new();
        for i in 0..2000 {
            source.push_str(&format!("v {} 0 0\nv {} 1 0\nv {} 0 1\n", i, i, i));
            source.push_str(&format!("f {} {} {}\n", 3 * i + 1, 3 * i + 2, 3 * i + 3));
        }
        fs::write(&path, &source).unwrap();

        let mut reports = Vec::new();
        let mesh = ObjReader::read_mesh_with_progress(&path, |p| reports.push(p)).unwrap();
        assert_eq!(mesh.face_count(), 2000);

        assert!(reports.len() > 2);
        assert_eq!(reports.first().unwrap().percent(), 0.0);
        assert_eq!(reports.last().unwrap().percent(), 100.0);
        for pair in reports.windows(2) {
            assert!(pair[0].bytes_read <= pair[1].bytes_read);
        }

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ObjReader::read_mesh("definitely/not/here.obj");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
