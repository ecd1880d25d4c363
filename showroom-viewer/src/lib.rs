//! Interactive product viewer
//!
//! This crate turns the controllers of `showroom-core` into a windowed
//! application:
//! - Landing page with the orbit or AR viewer picked for the platform
//! - Showcase page with the one-shot "Explore" camera move
//! - Camera with orbit, pan and zoom controls
//! - egui overlay with the control buttons, load progress and captions

pub mod camera;
pub mod capability;
pub mod orbit;
pub mod presenter;
pub mod experience;
pub mod ui;
pub mod app;

pub use camera::*;
pub use capability::CapabilityQuery;
pub use orbit::*;
pub use presenter::*;
pub use experience::*;
pub use app::ViewerApp;
