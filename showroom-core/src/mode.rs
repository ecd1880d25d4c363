//! Choosing between the orbit viewer and the AR viewer

use std::future::Future;

use crate::error::{Error, Result};

/// What the platform can do, as far as the viewer cares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformCapability {
    pub is_android: bool,
    pub supports_immersive_ar: bool,
}

/// Which viewer to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKind {
    /// Static viewer with orbit controls
    Orbit,
    /// Immersive AR placement viewer
    Ar,
}

/// Outcome of view mode selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSelection {
    pub viewer: ViewerKind,
    /// Link handing the asset to an external AR viewer app, if offered
    pub deep_link: Option<String>,
}

/// True if the user agent belongs to an Android device
pub fn detect_android(user_agent: &str) -> bool {
    user_agent.to_lowercase().contains("android")
}

/// Android intent opening `asset_url` in Google's Scene Viewer, preferring AR
pub fn scene_viewer_intent(asset_url: &str) -> String {
    format!(
        "intent://arvr.google.com/scene-viewer/1.0?file={}&mode=ar_preferred\
         #Intent;scheme=https;package=com.google.ar.core;\
         action=android.intent.action.VIEW;end;",
        asset_url
    )
}

/// Pick the viewer for a platform.
///
/// | immersive AR | Android | result                    |
/// |--------------|---------|---------------------------|
/// | yes          | any     | AR viewer                 |
/// | no           | yes     | orbit viewer + deep link  |
/// | no           | no      | orbit viewer              |
pub fn select_view(capability: PlatformCapability, asset_url: &str) -> ViewSelection {
    if capability.supports_immersive_ar {
        ViewSelection {
            viewer: ViewerKind::Ar,
            deep_link: None,
        }
    } else if capability.is_android {
        ViewSelection {
            viewer: ViewerKind::Orbit,
            deep_link: Some(scene_viewer_intent(asset_url)),
        }
    } else {
        ViewSelection {
            viewer: ViewerKind::Orbit,
            deep_link: None,
        }
    }
}

/// Access to the device's AR session runtime
pub trait ArRuntime {
    /// Ask the runtime whether immersive AR sessions are available
    fn is_immersive_ar_supported(&self) -> impl Future<Output = Result<bool>>;

    /// Start an immersive AR session
    fn request_session(&self) -> Result<()>;
}

/// Runtime for platforms without any AR support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArRuntime;

impl ArRuntime for NoArRuntime {
    async fn is_immersive_ar_supported(&self) -> Result<bool> {
        Ok(false)
    }

    fn request_session(&self) -> Result<()> {
        Err(Error::Unsupported("immersive AR is not available on this platform".to_string()))
    }
}

/// Runtime answering the capability query with a fixed value
#[derive(Debug, Clone, Copy)]
pub struct SimulatedArRuntime {
    pub supported: bool,
}

impl SimulatedArRuntime {
    pub fn new(supported: bool) -> Self {
        Self { supported }
    }
}

impl ArRuntime for SimulatedArRuntime {
    async fn is_immersive_ar_supported(&self) -> Result<bool> {
        Ok(self.supported)
    }

    fn request_session(&self) -> Result<()> {
        if self.supported {
            log::info!("Simulated immersive AR session started");
            Ok(())
        } else {
            Err(Error::Unsupported("simulated runtime has AR disabled".to_string()))
        }
    }
}

/// Resolves the view mode once the asynchronous capability query answers.
///
/// Until then it reports the orbit viewer. Only the first resolution counts
/// and a failed query counts as "unsupported".
#[derive(Debug, Clone)]
pub struct ViewModeSelector {
    is_android: bool,
    asset_url: String,
    resolved: Option<bool>,
}

impl ViewModeSelector {
    pub fn new(is_android: bool, asset_url: impl Into<String>) -> Self {
        Self {
            is_android,
            asset_url: asset_url.into(),
            resolved: None,
        }
    }

    /// Build a selector from a user agent string
    pub fn from_user_agent(user_agent: &str, asset_url: impl Into<String>) -> Self {
        Self::new(detect_android(user_agent), asset_url)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Capability as currently known
    pub fn capability(&self) -> PlatformCapability {
        PlatformCapability {
            is_android: self.is_android,
            supports_immersive_ar: self.resolved.unwrap_or(false),
        }
    }

    /// Current selection
    pub fn selection(&self) -> ViewSelection {
        select_view(self.capability(), &self.asset_url)
    }

    /// Record the capability answer. Returns `false` if already resolved.
    pub fn resolve(&mut self, answer: Result<bool>) -> bool {
        if self.resolved.is_some() {
            return false;
        }

        let supported = match answer {
            Ok(supported) => supported,
            Err(e) => {
                log::warn!("AR capability query failed, assuming unsupported: {}", e);
                false
            }
        };
        self.resolved = Some(supported);
        log::info!(
            "Immersive AR supported: {} (android: {}) -> {:?}",
            supported,
            self.is_android,
            self.selection().viewer
        );
        true
    }

    /// Query the runtime and resolve with its answer
    pub async fn query<R: ArRuntime>(&mut self, runtime: &R) -> ViewSelection {
        let answer = runtime.is_immersive_ar_supported().await;
        self.resolve(answer);
        self.selection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSET: &str = "https://example.com/machine.glb";
    const PIXEL_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";
    const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

    struct FailingRuntime;

    impl ArRuntime for FailingRuntime {
        async fn is_immersive_ar_supported(&self) -> Result<bool> {
            Err(Error::Unsupported("no xr".to_string()))
        }

        fn request_session(&self) -> Result<()> {
            Err(Error::Unsupported("no xr".to_string()))
        }
    }

    #[test]
    fn test_detect_android() {
        assert!(detect_android(PIXEL_UA));
        assert!(detect_android("ANDROID"));
        assert!(!detect_android(DESKTOP_UA));
    }

    #[test]
    fn test_decision_table() {
        let ar = select_view(
            PlatformCapability { is_android: true, supports_immersive_ar: true },
            ASSET,
        );
        assert_eq!(ar.viewer, ViewerKind::Ar);
        assert!(ar.deep_link.is_none());

        let android = select_view(
            PlatformCapability { is_android: true, supports_immersive_ar: false },
            ASSET,
        );
        assert_eq!(android.viewer, ViewerKind::Orbit);
        assert!(android.deep_link.is_some());

        let desktop = select_view(PlatformCapability::default(), ASSET);
        assert_eq!(desktop.viewer, ViewerKind::Orbit);
        assert!(desktop.deep_link.is_none());
    }

    #[test]
    fn test_scene_viewer_intent() {
        let link = scene_viewer_intent(ASSET);
        assert!(link.starts_with("intent://arvr.google.com/scene-viewer/1.0?file=https://example.com/machine.glb"));
        assert!(link.contains("&mode=ar_preferred#Intent;scheme=https;package=com.google.ar.core;"));
        assert!(link.ends_with("action=android.intent.action.VIEW;end;"));
    }

    #[test]
    fn test_pending_selector_shows_orbit_viewer() {
        let selector = ViewModeSelector::from_user_agent(PIXEL_UA, ASSET);
        assert!(!selector.is_resolved());
        assert_eq!(selector.selection().viewer, ViewerKind::Orbit);
    }

    #[test]
    fn test_first_resolution_wins() {
        let mut selector = ViewModeSelector::new(false, ASSET);
        assert!(selector.resolve(Ok(true)));
        assert!(!selector.resolve(Ok(false)));
        assert_eq!(selector.selection().viewer, ViewerKind::Ar);
    }

    #[test]
    fn test_query_failure_counts_as_unsupported() {
        let mut selector = ViewModeSelector::from_user_agent(PIXEL_UA, ASSET);
        let selection = pollster::block_on(selector.query(&FailingRuntime));
        assert_eq!(selection.viewer, ViewerKind::Orbit);
        assert_eq!(selection.deep_link, Some(scene_viewer_intent(ASSET)));
        assert!(selector.is_resolved());
    }

    #[test]
    fn test_runtimes() {
        let mut selector = ViewModeSelector::new(false, ASSET);
        let selection = pollster::block_on(selector.query(&SimulatedArRuntime::new(true)));
        assert_eq!(selection.viewer, ViewerKind::Ar);

        assert!(SimulatedArRuntime::new(true).request_session().is_ok());
        assert!(NoArRuntime.request_session().is_err());
        assert!(!pollster::block_on(NoArRuntime.is_immersive_ar_supported()).unwrap());
    }
}
