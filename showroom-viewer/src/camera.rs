//! Perspective camera with orbit, pan and zoom

use nalgebra::{Matrix4, Perspective3, Point3, Unit, UnitQuaternion, Vector3};
use showroom_core::{CameraRig, CameraSetup, Point3f};

/// Closest the camera may zoom towards its target
pub const MIN_DISTANCE: f32 = 0.2;
/// Farthest the camera may zoom away from its target
pub const MAX_DISTANCE: f32 = 50.0;
/// Keeps orbiting from flipping over the poles
const POLAR_MARGIN: f32 = 0.01;

/// A perspective camera looking at a target point.
///
/// The projection matrix is cached; changes to the field of view or the
/// aspect ratio only take effect after [`Camera::update_projection`], the
/// same contract as [`CameraRig`].
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    projection: Matrix4<f32>,
    home: CameraSetup,
}

impl Camera {
    /// Create a new camera
    pub fn new(position: Point3<f32>, target: Point3<f32>, fov: f32, aspect_ratio: f32) -> Self {
        let mut camera = Self {
            position,
            target,
            up: Vector3::y(),
            fov,
            aspect_ratio,
            near: 0.01,
            far: 100.0,
            projection: Matrix4::identity(),
            home: CameraSetup {
                position,
                target,
                field_of_view: fov,
            },
        };
        camera.update_projection();
        camera
    }

    /// Create a camera from a configured start pose
    pub fn from_setup(setup: &CameraSetup, aspect_ratio: f32) -> Self {
        Self::new(setup.position, setup.target, setup.field_of_view, aspect_ratio)
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix as of the last [`Camera::update_projection`]
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    /// Recompute the projection from the current lens parameters
    pub fn update_projection(&mut self) {
        let aspect = if self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0 {
            self.aspect_ratio
        } else {
            1.0
        };
        let fovy = self.fov.clamp(1.0, 179.0).to_radians();
        self.projection = Perspective3::new(aspect, fovy, self.near, self.far).into_inner();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.update_projection();
    }

    /// Distance between camera and target
    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }

    /// Rotate the camera around the target.
    ///
    /// `azimuth` turns about the up axis, `elevation` tilts towards it; both
    /// in radians.
    pub fn orbit(&mut self, azimuth: f32, elevation: f32) {
        let offset = self.position - self.target;
        let radius = offset.norm();
        if radius <= f32::EPSILON {
            return;
        }

        let up = Unit::new_normalize(self.up);
        let yawed = UnitQuaternion::from_axis_angle(&up, azimuth) * offset;

        // Clamp the polar angle so the camera never crosses the up axis
        let polar = up.dot(&yawed.normalize()).clamp(-1.0, 1.0).acos();
        let new_polar = (polar - elevation).clamp(POLAR_MARGIN, std::f32::consts::PI - POLAR_MARGIN);
        let rotated = match Unit::try_new(up.cross(&yawed), f32::EPSILON) {
            Some(axis) => UnitQuaternion::from_axis_angle(&axis, new_polar - polar) * yawed,
            None => yawed,
        };

        self.position = self.target + rotated.normalize() * radius;
    }

    /// Move camera and target together in the view plane
    pub fn pan(&mut self, right: f32, up: f32) {
        let forward = (self.target - self.position).normalize();
        let Some(right_axis) = forward.cross(&self.up).try_normalize(f32::EPSILON) else {
            return;
        };
        let up_axis = right_axis.cross(&forward);

        // Scale by distance so panning feels the same at any zoom level
        let scale = self.distance();
        let offset = (right_axis * right + up_axis * up) * scale;
        self.position += offset;
        self.target += offset;
    }

    /// Move towards the target; positive `amount` zooms in.
    ///
    /// The distance shrinks by the factor `1 - amount`, clamped to
    /// [`MIN_DISTANCE`]..[`MAX_DISTANCE`].
    pub fn zoom(&mut self, amount: f32) {
        let offset = self.position - self.target;
        let distance = offset.norm();
        if distance <= f32::EPSILON {
            return;
        }
        let new_distance = (distance * (1.0 - amount)).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.position = self.target + offset * (new_distance / distance);
    }

    /// Go back to the start pose
    pub fn reset(&mut self) {
        self.position = self.home.position;
        self.target = self.home.target;
        self.fov = self.home.field_of_view;
        self.update_projection();
    }
}

impl CameraRig for Camera {
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
        Camera::update_projection(self);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_setup(&CameraSetup::default(), 16.0 / 9.0)
    }
}
