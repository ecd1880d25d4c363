//! Rotate / reset / recenter controls for the displayed model

use serde::{Deserialize, Serialize};

use crate::point::Vector3f;
use crate::traits::SceneObject;
use crate::transform::ModelTransform;

/// One-shot edge signal.
///
/// Triggering arms it; the frame that acts on it consumes it with
/// [`Pulse::take`]. Triggering an already armed pulse is a no-op, so a
/// second press before the next frame does not queue a second event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pulse {
    armed: bool,
}

impl Pulse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the pulse. Returns `false` if it was already armed.
    pub fn trigger(&mut self) -> bool {
        !std::mem::replace(&mut self.armed, true)
    }

    /// Consume the pulse. Returns whether it was armed.
    pub fn take(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Per-viewer parameters of the model controls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Rotation about +Y per rendered frame, in radians
    pub rotation_step: f32,
    /// Transform restored by a reset
    pub reset_transform: ModelTransform,
    /// Position restored by a recenter
    pub recenter_anchor: Vector3f,
}

impl ControlSettings {
    /// Settings of the static orbit viewer
    pub fn orbit() -> Self {
        Self {
            rotation_step: 0.01,
            reset_transform: ModelTransform::scaled(0.5),
            recenter_anchor: Vector3f::zeros(),
        }
    }

    /// Settings of the AR placement viewer: slower spin, and recentering
    /// puts the model one metre in front of the viewer
    pub fn ar() -> Self {
        Self {
            rotation_step: 0.003,
            reset_transform: ModelTransform::scaled(0.5),
            recenter_anchor: Vector3f::new(0.0, 0.0, -1.0),
        }
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self::orbit()
    }
}

/// What a frame did to the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEffects {
    pub rotated: bool,
    pub reset: bool,
    pub recentered: bool,
}

/// Applies rotation and reset/recenter requests to a scene object, once per frame
#[derive(Debug, Clone)]
pub struct ModelController {
    settings: ControlSettings,
    rotating: bool,
    reset: Pulse,
    recenter: Pulse,
}

impl ModelController {
    pub fn new(settings: ControlSettings) -> Self {
        Self {
            settings,
            rotating: false,
            reset: Pulse::new(),
            recenter: Pulse::new(),
        }
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn set_rotating(&mut self, rotating: bool) {
        self.rotating = rotating;
    }

    /// Flip the rotate toggle, returning the new state
    pub fn toggle_rotation(&mut self) -> bool {
        self.rotating = !self.rotating;
        self.rotating
    }

    /// Ask for a reset on the next frame
    pub fn request_reset(&mut self) -> bool {
        self.reset.trigger()
    }

    /// Ask for a recenter on the next frame
    pub fn request_recenter(&mut self) -> bool {
        self.recenter.trigger()
    }

    pub fn reset_pending(&self) -> bool {
        self.reset.is_armed()
    }

    pub fn recenter_pending(&self) -> bool {
        self.recenter.is_armed()
    }

    /// Run the controls for one rendered frame.
    ///
    /// Rotation is advanced first so a reset in the same frame leaves the
    /// model exactly at the reset transform.
    pub fn apply_frame<O: SceneObject + ?Sized>(&mut self, object: &mut O) -> FrameEffects {
        let mut effects = FrameEffects::default();
        let mut transform = object.transform();

        if self.rotating {
            transform.rotation.y += self.settings.rotation_step;
            effects.rotated = true;
        }

        if self.reset.take() {
            transform = self.settings.reset_transform;
            effects.reset = true;
            log::debug!("Model reset to {:?}", transform);
        }

        if self.recenter.take() {
            transform.position = self.settings.recenter_anchor;
            effects.recentered = true;
            log::debug!("Model recentered at {:?}", transform.position);
        }

        if effects != FrameEffects::default() {
            object.set_transform(transform);
        }
        effects
    }
}

impl Default for ModelController {
    fn default() -> Self {
        Self::new(ControlSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn messy_transform() -> ModelTransform {
        ModelTransform::scaled(3.7)
            .with_position(Vector3f::new(4.0, -2.0, 9.0))
            .with_rotation(Vector3f::new(0.3, 1.2, -0.4))
    }

    #[test]
    fn test_pulse_edges() {
        let mut pulse = Pulse::new();
        assert!(!pulse.take());
        assert!(pulse.trigger());
        assert!(!pulse.trigger());
        assert!(pulse.take());
        assert!(!pulse.take());
        assert!(pulse.trigger());
    }

    #[test]
    fn test_rotation_advances_per_frame() {
        let mut controller = ModelController::new(ControlSettings::orbit());
        let mut model = ModelTransform::identity();

        controller.apply_frame(&mut model);
        assert_eq!(model.rotation.y, 0.0);

        assert!(controller.toggle_rotation());
        for _ in 0..10 {
            controller.apply_frame(&mut model);
        }
        assert_relative_eq!(model.rotation.y, 0.1, epsilon = 1e-5);

        assert!(!controller.toggle_rotation());
        controller.apply_frame(&mut model);
        assert_relative_eq!(model.rotation.y, 0.1, epsilon = 1e-5);
    }

    #[test]
    fn test_ar_rotation_is_slower() {
        let mut controller = ModelController::new(ControlSettings::ar());
        controller.set_rotating(true);
        let mut model = ModelTransform::identity();
        controller.apply_frame(&mut model);
        assert_relative_eq!(model.rotation.y, 0.003, epsilon = 1e-7);
    }

    #[test]
    fn test_reset_restores_defaults_even_while_rotating() {
        let mut controller = ModelController::new(ControlSettings::orbit());
        controller.set_rotating(true);
        let mut model = messy_transform();

        assert!(controller.request_reset());
        let effects = controller.apply_frame(&mut model);

        assert!(effects.reset);
        assert_eq!(model.scale, 0.5);
        assert_eq!(model.position, Vector3f::zeros());
        assert_eq!(model.rotation, Vector3f::zeros());
        assert!(!controller.reset_pending());
    }

    #[test]
    fn test_recenter_only_moves_position() {
        let mut controller = ModelController::new(ControlSettings::ar());
        let mut model = messy_transform();

        controller.request_recenter();
        controller.apply_frame(&mut model);

        assert_eq!(model.position, Vector3f::new(0.0, 0.0, -1.0));
        assert_eq!(model.scale, 3.7);
        assert_eq!(model.rotation, Vector3f::new(0.3, 1.2, -0.4));
    }

    #[test]
    fn test_double_press_before_frame_applies_once() {
        let mut controller = ModelController::new(ControlSettings::orbit());
        assert!(controller.request_recenter());
        assert!(!controller.request_recenter());
        assert!(controller.recenter_pending());

        let mut model = messy_transform();
        assert!(controller.apply_frame(&mut model).recentered);
        assert!(!controller.recenter_pending());
        assert!(!controller.apply_frame(&mut model).recentered);

        // Re-armed after consumption
        assert!(controller.request_recenter());
    }

    #[test]
    fn test_idle_frame_leaves_object_untouched() {
        let mut controller = ModelController::default();
        let mut model = messy_transform();
        let effects = controller.apply_frame(&mut model);
        assert_eq!(effects, FrameEffects::default());
        assert_eq!(model, messy_transform());
    }
}
