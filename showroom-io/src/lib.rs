//! Model loading for showroom
//!
//! Reads meshes from disk (Wavefront OBJ and glTF), reports byte progress
//! while doing so and can run the whole load on a background thread.

pub mod obj;
pub mod gltf;
pub mod progress;
pub mod loader;

pub use loader::{AssetLoader, AssetSource, LoadEvent};
pub use progress::{LoadProgress, ProgressReader};

use showroom_core::{Error, Result, TriangleMesh};
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh>;
}

/// Auto-detect format and read mesh
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    read_mesh_with_progress(path, |_| {})
}

/// Auto-detect format and read mesh, calling `on_progress` as bytes are consumed
pub fn read_mesh_with_progress<P, F>(path: P, on_progress: F) -> Result<TriangleMesh>
where
    P: AsRef<Path>,
    F: FnMut(LoadProgress),
{
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("obj") => obj::ObjReader::read_mesh_with_progress(path, on_progress),
        Some("glb") | Some("gltf") => gltf::GltfReader::read_mesh_with_progress(path, on_progress),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}
