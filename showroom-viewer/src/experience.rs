//! The two pages of the viewer and their per-frame logic
//!
//! Nothing here touches the GPU: an experience owns the camera, the orbit
//! controls and the displayed model, reacts to [`UiAction`]s and advances
//! its controllers once per [`Experience::tick`].

use crate::camera::Camera;
use crate::capability::CapabilityQuery;
use crate::orbit::OrbitControls;
use crate::presenter::ModelPresenter;
use nalgebra::Matrix4;
use showroom_core::{
    ArRuntime, CameraTransition, FrameEffects, Lighting, ModelController, ModelTransform, OrbitFlags,
    SceneObject, ShowcaseProfile, ShowroomConfig, TransitionPhase, TriangleMesh, ViewModeSelector, ViewSelection,
    ViewState, ViewerKind, ViewerProfile,
};
use showroom_io::AssetSource;

/// Something the user asked for through the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    ToggleRotation,
    Reset,
    Recenter,
    Explore,
    StartArSession,
}

/// State of the immersive AR session of the AR viewer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArSessionState {
    #[default]
    Inactive,
    Active,
    Failed(String),
}

fn presenter_for(source: Option<AssetSource>, transform: ModelTransform) -> ModelPresenter {
    match source {
        Some(source) => ModelPresenter::load(source, transform),
        None => {
            log::info!("No model given, showing the built-in demo machine");
            ModelPresenter::with_mesh(TriangleMesh::demo_machine(), transform)
        }
    }
}

fn controller_for(profile: &ViewerProfile) -> ModelController {
    let mut controller = ModelController::new(profile.controls);
    controller.set_rotating(profile.rotate_on_start);
    controller
}

/// Product landing page: heading, tagline and the viewer picked for the platform.
///
/// The page opens on whatever the selector reports right away, which is the
/// orbit viewer while the capability query is still pending. When the answer
/// arrives the viewer is swapped in place.
pub struct LandingExperience {
    pub title: String,
    pub tagline: String,
    config: ShowroomConfig,
    selector: ViewModeSelector,
    capability: Option<CapabilityQuery>,
    selection: ViewSelection,
    controller: ModelController,
    presenter: ModelPresenter,
    camera: Camera,
    orbit: OrbitControls,
    ar_session: ArSessionState,
}

impl LandingExperience {
    pub fn new(
        config: &ShowroomConfig,
        selector: ViewModeSelector,
        source: Option<AssetSource>,
        aspect_ratio: f32,
    ) -> Self {
        let selection = selector.selection();
        let profile = config.viewer_profile(selection.viewer);

        log::info!(
            "Landing page with {:?} viewer{}",
            selection.viewer,
            if selector.is_resolved() { "" } else { " until the AR capability is known" }
        );

        Self {
            title: config.title.clone(),
            tagline: config.tagline.clone(),
            camera: Camera::from_setup(&profile.camera, aspect_ratio),
            orbit: OrbitControls::new(profile.orbit),
            presenter: presenter_for(source, profile.initial_transform),
            controller: controller_for(profile),
            config: config.clone(),
            selector,
            capability: None,
            selection,
            ar_session: ArSessionState::Inactive,
        }
    }

    /// Resolve the viewer from `query` once it answers
    pub fn with_capability_query(mut self, query: CapabilityQuery) -> Self {
        self.capability = Some(query);
        self
    }

    /// True while the capability answer is still outstanding
    pub fn is_resolving(&self) -> bool {
        self.capability.is_some()
    }

    pub fn selection(&self) -> &ViewSelection {
        &self.selection
    }

    pub fn viewer(&self) -> ViewerKind {
        self.selection.viewer
    }

    pub fn controller(&self) -> &ModelController {
        &self.controller
    }

    pub fn ar_session(&self) -> &ArSessionState {
        &self.ar_session
    }

    pub fn profile(&self) -> &ViewerProfile {
        self.config.viewer_profile(self.selection.viewer)
    }

    /// Advance one frame
    pub fn tick(&mut self) -> FrameEffects {
        self.poll_capability();
        self.presenter.poll();
        self.controller.apply_frame(&mut self.presenter)
    }

    fn poll_capability(&mut self) {
        let Some(answer) = self.capability.as_ref().and_then(CapabilityQuery::poll) else {
            return;
        };
        self.capability = None;
        if self.selector.resolve(answer) {
            self.apply_selection(self.selector.selection());
        }
    }

    fn apply_selection(&mut self, selection: ViewSelection) {
        let switched = selection.viewer != self.selection.viewer;
        self.selection = selection;
        if !switched {
            return;
        }

        log::info!("Switching to the {:?} viewer", self.selection.viewer);
        let profile = self.config.viewer_profile(self.selection.viewer).clone();
        self.camera = Camera::from_setup(&profile.camera, self.camera.aspect_ratio);
        self.orbit = OrbitControls::new(profile.orbit);
        self.controller = controller_for(&profile);
        self.presenter.set_transform(profile.initial_transform);
        self.ar_session = ArSessionState::Inactive;
    }

    pub fn handle<R: ArRuntime>(&mut self, action: UiAction, runtime: &R) {
        match action {
            UiAction::ToggleRotation => {
                let rotating = self.controller.toggle_rotation();
                log::debug!("Rotation {}", if rotating { "started" } else { "stopped" });
            }
            UiAction::Reset => {
                self.controller.request_reset();
            }
            UiAction::Recenter => {
                self.controller.request_recenter();
            }
            UiAction::StartArSession => self.start_ar_session(runtime),
            UiAction::Explore => log::debug!("Explore is not available on the landing page"),
        }
    }

    fn start_ar_session<R: ArRuntime>(&mut self, runtime: &R) {
        if self.selection.viewer != ViewerKind::Ar {
            log::debug!("Ignoring AR session request in the orbit viewer");
            return;
        }
        if self.ar_session == ArSessionState::Active {
            return;
        }

        self.ar_session = match runtime.request_session() {
            Ok(()) => {
                log::info!("Immersive AR session started");
                ArSessionState::Active
            }
            Err(e) => {
                log::warn!("Could not start AR session: {}", e);
                ArSessionState::Failed(e.to_string())
            }
        };
    }
}

/// Explore page: a fixed model, one camera move and a caption
pub struct ShowcaseExperience {
    profile: ShowcaseProfile,
    transition: CameraTransition,
    presenter: ModelPresenter,
    camera: Camera,
    orbit: OrbitControls,
}

impl ShowcaseExperience {
    pub fn new(config: &ShowroomConfig, source: Option<AssetSource>, aspect_ratio: f32) -> Self {
        let profile = config.showcase.clone();
        let mut experience = Self {
            transition: CameraTransition::new(profile.transition),
            presenter: presenter_for(source, profile.model_transform),
            camera: Camera::from_setup(&profile.camera, aspect_ratio),
            orbit: OrbitControls::new(OrbitFlags::none()),
            profile,
        };
        experience.sync_orbit_flags();
        experience
    }

    pub fn caption(&self) -> &str {
        &self.profile.caption
    }

    pub fn view_state(&self) -> ViewState {
        self.transition.state()
    }

    pub fn phase(&self) -> TransitionPhase {
        self.transition.phase()
    }

    /// Advance one frame
    pub fn tick(&mut self) -> TransitionPhase {
        self.presenter.poll();
        let phase = self.transition.step(&mut self.camera);
        self.sync_orbit_flags();
        phase
    }

    pub fn handle(&mut self, action: UiAction) {
        match action {
            UiAction::Explore => {
                self.transition.explore();
            }
            other => log::debug!("{:?} is not available on the showcase page", other),
        }
    }

    // Rotate and zoom stay off; panning is only allowed while the camera is not being driven
    fn sync_orbit_flags(&mut self) {
        self.orbit.set_flags(OrbitFlags {
            rotate: false,
            pan: !self.transition.state().exploring,
            zoom: false,
        });
    }
}

/// One of the two top-level pages
pub enum Experience {
    Landing(LandingExperience),
    Showcase(ShowcaseExperience),
}

impl Experience {
    /// Advance one frame
    pub fn tick(&mut self) {
        match self {
            Experience::Landing(landing) => {
                landing.tick();
            }
            Experience::Showcase(showcase) => {
                showcase.tick();
            }
        }
    }

    pub fn handle<R: ArRuntime>(&mut self, action: UiAction, runtime: &R) {
        match self {
            Experience::Landing(landing) => landing.handle(action, runtime),
            Experience::Showcase(showcase) => showcase.handle(action),
        }
    }

    pub fn camera(&self) -> &Camera {
        match self {
            Experience::Landing(landing) => &landing.camera,
            Experience::Showcase(showcase) => &showcase.camera,
        }
    }

    /// Put the camera back where the page started it. Returns whether it moved.
    ///
    /// Once the explore transition has started the showcase camera belongs
    /// to it, so only an idle showcase page can be reset.
    pub fn reset_camera(&mut self) -> bool {
        match self {
            Experience::Landing(landing) => {
                landing.camera.reset();
                true
            }
            Experience::Showcase(showcase) => {
                if showcase.phase() != TransitionPhase::Idle {
                    log::debug!("Camera reset ignored during {:?}", showcase.phase());
                    return false;
                }
                showcase.camera.reset();
                true
            }
        }
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.navigation().1.set_aspect_ratio(aspect_ratio);
    }

    /// Orbit controls together with the camera they move
    pub fn navigation(&mut self) -> (&mut OrbitControls, &mut Camera) {
        match self {
            Experience::Landing(landing) => (&mut landing.orbit, &mut landing.camera),
            Experience::Showcase(showcase) => (&mut showcase.orbit, &mut showcase.camera),
        }
    }

    pub fn presenter(&self) -> &ModelPresenter {
        match self {
            Experience::Landing(landing) => &landing.presenter,
            Experience::Showcase(showcase) => &showcase.presenter,
        }
    }

    pub fn presenter_mut(&mut self) -> &mut ModelPresenter {
        match self {
            Experience::Landing(landing) => &mut landing.presenter,
            Experience::Showcase(showcase) => &mut showcase.presenter,
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.presenter().transform().matrix()
    }

    pub fn lighting(&self) -> &Lighting {
        match self {
            Experience::Landing(landing) => &landing.profile().lighting,
            Experience::Showcase(showcase) => &showcase.profile.lighting,
        }
    }

    pub fn background(&self) -> [f64; 4] {
        match self {
            Experience::Landing(landing) => landing.profile().background,
            Experience::Showcase(showcase) => showcase.profile.background,
        }
    }

    pub fn window_title(&self) -> String {
        match self {
            Experience::Landing(landing) => landing.title.clone(),
            Experience::Showcase(_) => "Explore".to_string(),
        }
    }
}
