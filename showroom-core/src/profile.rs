//! Viewer profiles and the TOML configuration file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::controls::ControlSettings;
use crate::error::{Error, Result};
use crate::explore::TransitionTarget;
use crate::point::*;
use crate::transform::ModelTransform;

/// Which mouse gestures the orbit controls accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitFlags {
    pub rotate: bool,
    pub pan: bool,
    pub zoom: bool,
}

impl OrbitFlags {
    pub fn all() -> Self {
        Self { rotate: true, pan: true, zoom: true }
    }

    pub fn none() -> Self {
        Self { rotate: false, pan: false, zoom: false }
    }
}

impl Default for OrbitFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// A light source of the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Light {
    /// Constant term applied to every surface
    Ambient { intensity: f32 },
    /// Light arriving from `position` towards the origin
    Directional { position: Point3f, intensity: f32 },
    /// Sky light from above blended with a dark ground from below
    Hemisphere { intensity: f32 },
}

/// Lights of one experience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lighting {
    pub lights: Vec<Light>,
}

impl Lighting {
    /// Soft single-key setup of the orbit viewer
    pub fn orbit() -> Self {
        Self {
            lights: vec![
                Light::Ambient { intensity: 0.8 },
                Light::Directional { position: Point3f::new(5.0, 5.0, 5.0), intensity: 1.0 },
            ],
        }
    }

    /// Dimmer setup used in AR so the model sits in the camera feed
    pub fn ar() -> Self {
        Self {
            lights: vec![
                Light::Ambient { intensity: 0.5 },
                Light::Directional { position: Point3f::new(2.0, 2.0, 2.0), intensity: 1.2 },
            ],
        }
    }

    /// Key, fill, top and sky lights of the showcase page
    pub fn studio() -> Self {
        Self {
            lights: vec![
                Light::Ambient { intensity: 1.0 },
                Light::Directional { position: Point3f::new(5.0, 5.0, 5.0), intensity: 1.5 },
                Light::Directional { position: Point3f::new(-5.0, 5.0, -5.0), intensity: 0.8 },
                Light::Directional { position: Point3f::new(0.0, 3.0, 3.0), intensity: 1.2 },
                Light::Hemisphere { intensity: 0.6 },
            ],
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::orbit()
    }
}

/// Camera placement at start-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSetup {
    pub position: Point3f,
    pub target: Point3f,
    /// Vertical field of view in degrees
    pub field_of_view: f32,
}

impl Default for CameraSetup {
    fn default() -> Self {
        Self {
            position: Point3f::new(0.0, 0.0, 5.0),
            target: Point3f::origin(),
            field_of_view: 45.0,
        }
    }
}

/// Everything that differs between the orbit viewer and the AR viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerProfile {
    pub camera: CameraSetup,
    pub orbit: OrbitFlags,
    pub controls: ControlSettings,
    pub initial_transform: ModelTransform,
    /// Spin the model from the first frame
    pub rotate_on_start: bool,
    pub lighting: Lighting,
    /// Clear color, linear RGBA
    pub background: [f64; 4],
}

impl ViewerProfile {
    pub fn orbit() -> Self {
        Self {
            camera: CameraSetup {
                position: Point3f::new(2.0, 2.0, 4.0),
                target: Point3f::origin(),
                field_of_view: 50.0,
            },
            orbit: OrbitFlags::all(),
            controls: ControlSettings::orbit(),
            initial_transform: ModelTransform::identity(),
            rotate_on_start: false,
            lighting: Lighting::orbit(),
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn ar() -> Self {
        Self {
            camera: CameraSetup {
                position: Point3f::origin(),
                target: Point3f::new(0.0, 0.0, -1.0),
                field_of_view: 50.0,
            },
            orbit: OrbitFlags::none(),
            controls: ControlSettings::ar(),
            initial_transform: ModelTransform::identity().with_position(Vector3f::new(0.0, 0.0, -1.0)),
            rotate_on_start: true,
            lighting: Lighting::ar(),
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Default for ViewerProfile {
    fn default() -> Self {
        Self::orbit()
    }
}

/// The explore page: fixed model, one camera move, then a caption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseProfile {
    pub camera: CameraSetup,
    pub model_transform: ModelTransform,
    pub transition: TransitionTarget,
    pub caption: String,
    pub lighting: Lighting,
    pub background: [f64; 4],
}

impl Default for ShowcaseProfile {
    fn default() -> Self {
        Self {
            camera: CameraSetup::default(),
            model_transform: ModelTransform::scaled(0.5)
                .with_position(Vector3f::new(0.5, -0.5, 0.0))
                .with_rotation(Vector3f::new(0.0, -0.87266, 0.0)),
            transition: TransitionTarget::default(),
            caption: "1\u{2033} CMOS Primary Wide-Angle Camera".to_string(),
            lighting: Lighting::studio(),
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Top-level configuration, usually read from `showroom.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowroomConfig {
    pub title: String,
    pub tagline: String,
    /// Local model file; the built-in demo model is shown when unset
    pub model: Option<PathBuf>,
    /// Public URL of the model handed to external AR viewers
    pub ar_asset_url: String,
    pub orbit: ViewerProfile,
    pub ar: ViewerProfile,
    pub showcase: ShowcaseProfile,
}

impl Default for ShowroomConfig {
    fn default() -> Self {
        Self {
            title: "3D + AR Experience".to_string(),
            tagline: "Rotate, zoom, and interact with the robotic system. \
                      On mobile, experience it in your room!"
                .to_string(),
            model: None,
            ar_asset_url: "https://example.com/models/machine.glb".to_string(),
            orbit: ViewerProfile::orbit(),
            ar: ViewerProfile::ar(),
            showcase: ShowcaseProfile::default(),
        }
    }
}

impl ShowroomConfig {
    /// Parse a configuration.
    ///
    /// The file is layered over [`ShowroomConfig::default`] table by table,
    /// so a partially given `[ar]` section keeps the AR defaults for the
    /// keys it leaves out. Arrays are replaced as a whole. A showcase
    /// transition that could never finish is rejected.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let overrides: toml::Table = toml::from_str(source)?;

        let defaults = toml::Value::try_from(ShowroomConfig::default())
            .map_err(|e| Error::Config(e.to_string()))?;
        let mut merged = match defaults {
            toml::Value::Table(table) => table,
            _ => return Err(Error::Config("defaults did not serialize to a table".to_string())),
        };
        merge_tables(&mut merged, overrides);

        let config: Self = toml::Value::Table(merged).try_into()?;
        config.showcase.transition.validate()?;
        Ok(config)
    }

    /// Read a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Profile for a viewer kind
    pub fn viewer_profile(&self, viewer: crate::mode::ViewerKind) -> &ViewerProfile {
        match viewer {
            crate::mode::ViewerKind::Orbit => &self.orbit,
            crate::mode::ViewerKind::Ar => &self.ar,
        }
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        if let toml::Value::Table(nested) = value {
            if let Some(toml::Value::Table(base_nested)) = base.get_mut(&key) {
                merge_tables(base_nested, nested);
                continue;
            }
            base.insert(key, toml::Value::Table(nested));
        } else {
            base.insert(key, value);
        }
    }
}
