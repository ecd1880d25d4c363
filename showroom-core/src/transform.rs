//! Model placement in the scene

use nalgebra::{Matrix4, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::point::Vector3f;

/// Uniform scale, translation and Euler rotation of a displayed model.
///
/// Rotation angles are radians, applied in X, then Y, then Z order
/// (`R = Rx * Ry * Rz`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelTransform {
    pub scale: f32,
    pub position: Vector3f,
    pub rotation: Vector3f,
}

impl ModelTransform {
    /// Unit scale at the origin without rotation
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            position: Vector3f::zeros(),
            rotation: Vector3f::zeros(),
        }
    }

    /// Uniform scale at the origin without rotation
    pub fn scaled(scale: f32) -> Self {
        Self {
            scale,
            ..Self::identity()
        }
    }

    pub fn with_position(mut self, position: Vector3f) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vector3f) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rotation part as a matrix
    pub fn rotation_matrix(&self) -> Rotation3<f32> {
        Rotation3::from_axis_angle(&Vector3::x_axis(), self.rotation.x)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), self.rotation.y)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.rotation.z)
    }

    /// Model matrix `T * R * S`
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.position)
            * self.rotation_matrix().to_homogeneous()
            * Matrix4::new_scaling(self.scale)
    }
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<ModelTransform> for Matrix4<f32> {
    fn from(transform: ModelTransform) -> Self {
        transform.matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point3f;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_matrix() {
        assert_eq!(ModelTransform::identity().matrix(), Matrix4::identity());
    }

    #[test]
    fn test_scale_then_rotate_then_translate() {
        let t = ModelTransform::scaled(2.0)
            .with_rotation(Vector3f::new(0.0, FRAC_PI_2, 0.0))
            .with_position(Vector3f::new(0.0, 0.0, -1.0));

        // +X scaled to 2, turned about +Y onto -Z, then pushed back by 1
        let p = t.matrix().transform_point(&Point3f::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, -3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_euler_order_is_xyz() {
        let t = ModelTransform::identity().with_rotation(Vector3f::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        // Rz first maps +X to +Y, then Rx maps +Y to +Z
        let p = t.matrix().transform_point(&Point3f::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-6);
    }
}
