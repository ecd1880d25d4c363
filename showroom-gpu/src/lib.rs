//! # Showroom GPU
//!
//! wgpu rendering for the showroom viewer: a lit triangle mesh drawn into a
//! window surface, with room left in each frame for a UI overlay.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use showroom_core::{Lighting, TriangleMesh};
//! use showroom_gpu::MeshRenderer;
//! use std::sync::Arc;
//! use winit::window::Window;
//!
//! async fn example(window: Arc<Window>) -> showroom_core::Result<()> {
//!     let mut renderer = MeshRenderer::new(window, &Lighting::orbit(), [0.0, 0.0, 0.0, 1.0]).await?;
//!     let mesh = renderer.upload(&TriangleMesh::demo_machine());
//!
//!     if let Some(mut frame) = renderer.begin_frame()? {
//!         renderer.draw(&mut frame, Some(&mesh));
//!         renderer.present(frame);
//!     }
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod lighting;
pub mod mesh;
pub mod renderer;

pub use device::GpuContext;
pub use lighting::{LightingUniform, MAX_DIRECTIONAL_LIGHTS};
pub use mesh::{mesh_to_vertices, GpuMesh, MeshVertex};
pub use renderer::{Frame, MeshCameraUniform, MeshRenderer, ModelUniform};
