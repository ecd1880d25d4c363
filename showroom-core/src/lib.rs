//! Core data structures and view-state logic for showroom
//!
//! This crate holds everything the viewer decides without touching a GPU:
//! the model transform, the camera transition state machine, the model
//! controls with their one-shot pulses, view mode selection, and the
//! configuration profiles. Rendering backends plug in through the
//! [`SceneObject`] and [`CameraRig`] traits.

pub mod point;
pub mod mesh;
pub mod traits;
pub mod transform;
pub mod explore;
pub mod controls;
pub mod mode;
pub mod profile;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use traits::*;
pub use transform::*;
pub use explore::*;
pub use controls::*;
pub use mode::*;
pub use profile::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
