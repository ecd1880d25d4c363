//! Camera transition driven by the "Explore" button
//!
//! Once armed, every frame moves the camera a fixed fraction of the remaining
//! way towards a target pose (exponential decay). When the camera gets close
//! enough the transition stops for good, the button is hidden and the
//! caption is revealed.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::point::*;
use crate::traits::CameraRig;

/// Where the explore transition takes the camera and how fast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionTarget {
    pub position: Point3f,
    /// Field of view in degrees
    pub field_of_view: f32,
    /// Fraction of the remaining distance covered per frame, in `(0, 1]`
    pub factor: f32,
    /// Distance below which the transition is considered finished
    pub threshold: f32,
}

impl Default for TransitionTarget {
    fn default() -> Self {
        Self {
            position: Point3f::new(2.0, 0.0, 4.0),
            field_of_view: 30.0,
            factor: 0.15,
            threshold: 0.05,
        }
    }
}

impl TransitionTarget {
    /// Check that the transition can finish.
    ///
    /// `factor` must lie in `(0, 1]` and `threshold` must be positive,
    /// otherwise the camera never gets within reach of the target.
    pub fn validate(&self) -> Result<()> {
        if !(self.factor > 0.0 && self.factor <= 1.0) {
            return Err(Error::Config(format!(
                "transition factor must be in (0, 1], got {}",
                self.factor
            )));
        }
        if !(self.threshold > 0.0) {
            return Err(Error::Config(format!(
                "transition threshold must be positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// UI flags of the explore page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub exploring: bool,
    pub button_visible: bool,
    pub show_caption: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            exploring: false,
            button_visible: true,
            show_caption: false,
        }
    }
}

/// Phase of the explore transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Idle,
    Transitioning,
    Done,
}

/// One interpolation step: `current + (target - current) * factor`
pub fn lerp_step(current: &Point3f, target: &Point3f, factor: f32) -> Point3f {
    *current + (*target - *current) * factor
}

/// Number of frames the transition needs to get within `threshold` of
/// `target` when starting at `start`.
///
/// After `n` steps the remaining distance is `d0 * |1 - factor|^n`, so this
/// is the smallest `n` for which that drops below `threshold`. Returns
/// `None` when the distance never shrinks (`factor <= 0` or `factor >= 2`)
/// or when `threshold` is not positive.
pub fn steps_to_converge(start: &Point3f, target: &Point3f, factor: f32, threshold: f32) -> Option<usize> {
    if !(threshold > 0.0) {
        return None;
    }
    let d0 = (*target - *start).norm() as f64;
    let decay = (1.0 - factor as f64).abs();
    if d0 < threshold as f64 && decay <= 1.0 {
        // Still one frame: the distance is checked after stepping
        return Some(1);
    }
    if decay >= 1.0 || decay.is_nan() {
        return None;
    }
    if decay == 0.0 {
        return Some(1);
    }

    let n = ((threshold as f64 / d0).ln() / decay.ln()).floor() as usize + 1;
    Some(n.max(1))
}

/// Camera transition controller
#[derive(Debug, Clone)]
pub struct CameraTransition {
    target: TransitionTarget,
    state: ViewState,
    phase: TransitionPhase,
}

impl CameraTransition {
    pub fn new(target: TransitionTarget) -> Self {
        Self {
            target,
            state: ViewState::default(),
            phase: TransitionPhase::Idle,
        }
    }

    pub fn target(&self) -> &TransitionTarget {
        &self.target
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Handle a click on the explore button.
    ///
    /// Only arms the transition from `Idle`; returns whether it did.
    pub fn explore(&mut self) -> bool {
        if self.phase != TransitionPhase::Idle {
            return false;
        }

        log::info!("Explore transition started");
        self.phase = TransitionPhase::Transitioning;
        self.state.exploring = true;
        true
    }

    /// Advance the transition by one rendered frame
    pub fn step<C: CameraRig + ?Sized>(&mut self, camera: &mut C) -> TransitionPhase {
        if !self.state.exploring {
            return self.phase;
        }

        let target = &self.target;
        let position = lerp_step(&camera.position(), &target.position, target.factor);
        camera.set_position(position);

        let fov = camera.field_of_view();
        camera.set_field_of_view(fov + (target.field_of_view - fov) * target.factor);
        camera.update_projection();

        if (position - target.position).norm() < target.threshold {
            self.state.exploring = false;
            self.state.button_visible = false;
            self.state.show_caption = true;
            self.phase = TransitionPhase::Done;
            log::info!("Explore transition finished");
        }

        self.phase
    }
}

impl Default for CameraTransition {
    fn default() -> Self {
        Self::new(TransitionTarget::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Debug)]
    struct FakeCamera {
        position: Point3f,
        fov: f32,
        projection_updates: usize,
    }

    impl CameraRig for FakeCamera {
        fn position(&self) -> Point3f {
            self.position
        }
        fn set_position(&mut self, position: Point3f) {
            self.position = position;
        }
        fn field_of_view(&self) -> f32 {
            self.fov
        }
        fn set_field_of_view(&mut self, fov: f32) {
            self.fov = fov;
        }
        fn update_projection(&mut self) {
            self.projection_updates += 1;
        }
    }

    fn camera_at(x: f32, y: f32, z: f32) -> FakeCamera {
        FakeCamera {
            position: Point3f::new(x, y, z),
            fov: 45.0,
            projection_updates: 0,
        }
    }

    #[test]
    fn test_idle_does_not_move_camera() {
        let mut transition = CameraTransition::default();
        let mut camera = camera_at(0.0, 0.0, 5.0);

        assert_eq!(transition.step(&mut camera), TransitionPhase::Idle);
        assert_eq!(camera.position, Point3f::new(0.0, 0.0, 5.0));
        assert_eq!(camera.projection_updates, 0);
        assert_eq!(transition.state(), ViewState::default());
    }

    #[test]
    fn test_single_step_interpolates_position_and_fov() {
        let mut transition = CameraTransition::default();
        let mut camera = camera_at(0.0, 0.0, 5.0);
        transition.explore();
        transition.step(&mut camera);

        assert_relative_eq!(camera.position.x, 0.3, epsilon = 1e-6);
        assert_relative_eq!(camera.position.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.position.z, 4.85, epsilon = 1e-6);
        assert_relative_eq!(camera.fov, 45.0 - 15.0 * 0.15, epsilon = 1e-5);
        assert_eq!(camera.projection_updates, 1);
        assert!(transition.state().exploring);
        assert!(transition.state().button_visible);
    }

    #[test]
    fn test_explore_only_arms_from_idle() {
        let mut transition = CameraTransition::default();
        assert!(transition.explore());
        assert!(!transition.explore());

        let mut camera = camera_at(2.0, 0.0, 4.01);
        assert_eq!(transition.step(&mut camera), TransitionPhase::Done);
        assert!(!transition.explore());
        assert_eq!(transition.phase(), TransitionPhase::Done);
    }

    #[test]
    fn test_done_is_terminal() {
        let mut transition = CameraTransition::default();
        let mut camera = camera_at(0.0, 0.0, 5.0);
        transition.explore();
        while transition.step(&mut camera) != TransitionPhase::Done {}

        let settled = camera.position;
        for _ in 0..10 {
            transition.explore();
            assert_eq!(transition.step(&mut camera), TransitionPhase::Done);
        }
        assert_eq!(camera.position, settled);
        let state = transition.state();
        assert!(!state.exploring);
        assert!(!state.button_visible);
        assert!(state.show_caption);
    }

    #[test]
    fn test_steps_to_converge_closed_form() {
        let target = TransitionTarget::default();
        let n = steps_to_converge(&Point3f::new(0.0, 0.0, 5.0), &target.position, 0.15, 0.05);
        assert_eq!(n, Some(24));

        assert_eq!(steps_to_converge(&target.position, &target.position, 0.15, 0.05), Some(1));
        assert_eq!(steps_to_converge(&Point3f::origin(), &target.position, 1.0, 0.05), Some(1));
    }

    #[test]
    fn test_steps_to_converge_overshooting_factor() {
        // Factors in (1, 2) overshoot but still shrink the distance each frame
        let target = TransitionTarget {
            factor: 1.5,
            ..TransitionTarget::default()
        };
        let start = Point3f::new(0.0, 0.0, 5.0);
        let predicted = steps_to_converge(&start, &target.position, target.factor, target.threshold);
        assert_eq!(predicted, Some(6));

        let mut transition = CameraTransition::new(target);
        let mut camera = camera_at(0.0, 0.0, 5.0);
        transition.explore();
        let mut frames = 1;
        while transition.step(&mut camera) != TransitionPhase::Done {
            frames += 1;
            assert!(frames < 100);
        }
        assert_eq!(Some(frames), predicted);
    }

    #[test]
    fn test_steps_to_converge_never() {
        let start = Point3f::new(0.0, 0.0, 5.0);
        let target = TransitionTarget::default().position;
        assert_eq!(steps_to_converge(&start, &target, 0.0, 0.05), None);
        assert_eq!(steps_to_converge(&start, &target, -0.1, 0.05), None);
        assert_eq!(steps_to_converge(&start, &target, 2.5, 0.05), None);
        assert_eq!(steps_to_converge(&start, &target, 0.15, 0.0), None);
    }

    #[test]
    fn test_validate_rejects_stalling_targets() {
        assert!(TransitionTarget::default().validate().is_ok());
        let full_step = TransitionTarget { factor: 1.0, ..TransitionTarget::default() };
        assert!(full_step.validate().is_ok());

        for factor in [0.0, -0.1, 1.5, 2.5, f32::NAN] {
            let target = TransitionTarget { factor, ..TransitionTarget::default() };
            assert!(matches!(target.validate(), Err(Error::Config(_))), "factor {}", factor);
        }
        for threshold in [0.0, -1.0, f32::NAN] {
            let target = TransitionTarget { threshold, ..TransitionTarget::default() };
            assert!(matches!(target.validate(), Err(Error::Config(_))), "threshold {}", threshold);
        }
    }

    #[test]
    fn test_lerp_step_is_per_axis() {
        let p = lerp_step(&Point3f::new(0.0, 10.0, -4.0), &Point3f::new(10.0, 0.0, 4.0), 0.5);
        assert_eq!(p, Point3f::new(5.0, 5.0, 0.0));
    }
}
