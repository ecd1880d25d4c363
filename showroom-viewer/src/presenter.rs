//! The displayed model: its mesh, its load state and its transform

use showroom_core::{ModelTransform, SceneObject, TriangleMesh};
use showroom_io::{AssetLoader, AssetSource, LoadProgress};

/// Where the model is in its lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Loading(LoadProgress),
    Ready,
    /// Loading failed; the scene stays empty
    Failed(String),
}

/// Owns the model shown by an experience.
///
/// A freshly available mesh is handed out once through
/// [`ModelPresenter::take_mesh`] so the renderer uploads it a single time.
pub struct ModelPresenter {
    transform: ModelTransform,
    status: ModelStatus,
    loader: Option<AssetLoader>,
    fresh_mesh: Option<TriangleMesh>,
}

impl ModelPresenter {
    /// Present a mesh that is already in memory
    pub fn with_mesh(mesh: TriangleMesh, transform: ModelTransform) -> Self {
        Self {
            transform,
            status: ModelStatus::Ready,
            loader: None,
            fresh_mesh: Some(mesh),
        }
    }

    /// Start loading a model in the background
    pub fn load(source: AssetSource, transform: ModelTransform) -> Self {
        Self::from_loader(AssetLoader::spawn(source), transform)
    }

    /// Present whatever a running loader produces
    pub fn from_loader(loader: AssetLoader, transform: ModelTransform) -> Self {
        Self {
            transform,
            status: ModelStatus::Loading(loader.progress()),
            loader: Some(loader),
            fresh_mesh: None,
        }
    }

    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    /// Drain loader events; call once per frame
    pub fn poll(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };

        match loader.poll() {
            None => self.status = ModelStatus::Loading(loader.progress()),
            Some(Ok(mesh)) => {
                self.status = ModelStatus::Ready;
                self.fresh_mesh = Some(mesh);
                self.loader = None;
            }
            Some(Err(e)) => {
                log::error!("Model could not be loaded: {}", e);
                self.status = ModelStatus::Failed(e.to_string());
                self.loader = None;
            }
        }
    }

    /// Take a mesh that has not been handed out yet
    pub fn take_mesh(&mut self) -> Option<TriangleMesh> {
        self.fresh_mesh.take()
    }
}

impl SceneObject for ModelPresenter {
    fn transform(&self) -> ModelTransform {
        self.transform
    }

    fn set_transform(&mut self, transform: ModelTransform) {
        self.transform = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showroom_core::Vector3f;
    use std::path::PathBuf;

    fn poll_until_settled(presenter: &mut ModelPresenter) {
        for _ in 0..10_000 {
            presenter.poll();
            if !matches!(presenter.status(), ModelStatus::Loading(_)) {
                return;
            }
            std::thread::yield_now();
        }
        panic!("loader did not finish");
    }

    #[test]
    fn test_in_memory_mesh_is_handed_out_once() {
        let mut presenter = ModelPresenter::with_mesh(TriangleMesh::demo_machine(), ModelTransform::identity());
        assert_eq!(presenter.status(), &ModelStatus::Ready);
        assert!(presenter.take_mesh().is_some());
        assert!(presenter.take_mesh().is_none());
    }

    #[test]
    fn test_failed_load_leaves_empty_scene() {
        let source = AssetSource::Path(PathBuf::from("does/not/exist.obj"));
        let mut presenter = ModelPresenter::load(source, ModelTransform::identity());
        poll_until_settled(&mut presenter);

        assert!(matches!(presenter.status(), ModelStatus::Failed(_)));
        assert!(presenter.take_mesh().is_none());
    }

    #[test]
    fn test_transform_is_scene_object_state() {
        let mut presenter = ModelPresenter::with_mesh(TriangleMesh::new(), ModelTransform::identity());
        let moved = ModelTransform::scaled(2.0).with_position(Vector3f::new(1.0, 0.0, 0.0));
        presenter.set_transform(moved);
        assert_eq!(presenter.transform(), moved);
    }
}
