//! Mouse-driven orbit, pan and zoom

use crate::camera::Camera;
use showroom_core::OrbitFlags;

/// Mouse button as far as the orbit controls are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragButton {
    /// Left button rotates
    Primary,
    /// Right or middle button pans
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

/// Turns pointer input into camera moves, honoring per-gesture enable flags
#[derive(Debug, Clone)]
pub struct OrbitControls {
    flags: OrbitFlags,
    drag: Option<Drag>,
    last_cursor: Option<(f64, f64)>,
    /// Radians per pixel
    pub rotate_speed: f32,
    /// View-plane units per pixel, scaled by camera distance
    pub pan_speed: f32,
    /// Fraction of the distance per scroll line
    pub zoom_speed: f32,
}

impl OrbitControls {
    pub fn new(flags: OrbitFlags) -> Self {
        Self {
            flags,
            drag: None,
            last_cursor: None,
            rotate_speed: 0.01,
            pan_speed: 0.001,
            zoom_speed: 0.1,
        }
    }

    pub fn flags(&self) -> OrbitFlags {
        self.flags
    }

    /// Change which gestures are accepted; a drag of a disabled kind stops
    pub fn set_flags(&mut self, flags: OrbitFlags) {
        self.flags = flags;
        match self.drag {
            Some(Drag::Rotate) if !flags.rotate => self.drag = None,
            Some(Drag::Pan) if !flags.pan => self.drag = None,
            _ => {}
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Handle a button press or release
    pub fn button(&mut self, button: DragButton, pressed: bool) {
        if !pressed {
            self.drag = None;
            return;
        }

        self.drag = match button {
            DragButton::Primary if self.flags.rotate => Some(Drag::Rotate),
            DragButton::Secondary if self.flags.pan => Some(Drag::Pan),
            _ => None,
        };
    }

    /// Handle cursor movement. Returns whether the camera moved.
    pub fn cursor_moved(&mut self, x: f64, y: f64, camera: &mut Camera) -> bool {
        let last = self.last_cursor.replace((x, y));
        let (Some((last_x, last_y)), Some(drag)) = (last, self.drag) else {
            return false;
        };

        let dx = (x - last_x) as f32;
        let dy = (y - last_y) as f32;
        if dx == 0.0 && dy == 0.0 {
            return false;
        }

        match drag {
            Drag::Rotate => camera.orbit(-dx * self.rotate_speed, dy * self.rotate_speed),
            Drag::Pan => camera.pan(-dx * self.pan_speed, dy * self.pan_speed),
        }
        true
    }

    /// Handle a scroll of `lines` (positive away from the user). Returns
    /// whether the camera moved.
    pub fn scrolled(&mut self, lines: f32, camera: &mut Camera) -> bool {
        if !self.flags.zoom || lines == 0.0 {
            return false;
        }
        camera.zoom((lines * self.zoom_speed).clamp(-0.9, 0.9));
        true
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(OrbitFlags::all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn camera() -> Camera {
        Camera::new(Point3::new(0.0, 0.0, 5.0), Point3::origin(), 45.0, 1.0)
    }

    #[test]
    fn test_drag_rotates() {
        let mut controls = OrbitControls::default();
        let mut camera = camera();

        controls.cursor_moved(100.0, 100.0, &mut camera);
        controls.button(DragButton::Primary, true);
        assert!(controls.cursor_moved(150.0, 100.0, &mut camera));
        assert!(camera.position.x.abs() > 0.1);
        assert_relative_eq!(camera.distance(), 5.0, epsilon = 1e-4);

        controls.button(DragButton::Primary, false);
        let before = camera.position;
        assert!(!controls.cursor_moved(300.0, 100.0, &mut camera));
        assert_eq!(camera.position, before);
    }

    #[test]
    fn test_disabled_gestures_are_ignored() {
        let mut controls = OrbitControls::new(OrbitFlags { rotate: false, pan: true, zoom: false });
        let mut camera = camera();

        controls.cursor_moved(0.0, 0.0, &mut camera);
        controls.button(DragButton::Primary, true);
        assert!(!controls.cursor_moved(50.0, 50.0, &mut camera));
        assert!(!controls.scrolled(3.0, &mut camera));
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 5.0));

        controls.button(DragButton::Secondary, true);
        assert!(controls.cursor_moved(100.0, 50.0, &mut camera));
        assert!(camera.target.x.abs() > 0.0);
    }

    #[test]
    fn test_disabling_pan_stops_running_drag() {
        let mut controls = OrbitControls::default();
        controls.button(DragButton::Secondary, true);
        assert!(controls.is_dragging());

        controls.set_flags(OrbitFlags { rotate: false, pan: false, zoom: false });
        assert!(!controls.is_dragging());
    }

    #[test]
    fn test_scroll_zooms_in() {
        let mut controls = OrbitControls::default();
        let mut camera = camera();
        assert!(controls.scrolled(1.0, &mut camera));
        assert_relative_eq!(camera.distance(), 4.5, epsilon = 1e-5);
    }
}
