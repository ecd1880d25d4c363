//! Core traits for showroom
//!
//! The view-state controllers only ever talk to a scene object and a camera
//! through these traits, so they can run against a GPU-backed scene in the
//! viewer and against plain structs in tests.

use crate::{mesh::*, point::*, transform::ModelTransform};

/// Handle to a scene object whose transform can be read and replaced
pub trait SceneObject {
    /// Current transform of the object
    fn transform(&self) -> ModelTransform;

    /// Replace the transform of the object
    fn set_transform(&mut self, transform: ModelTransform);
}

/// Handle to a perspective camera
pub trait CameraRig {
    /// Camera position in world space
    fn position(&self) -> Point3f;

    /// Move the camera
    fn set_position(&mut self, position: Point3f);

    /// Vertical field of view in degrees
    fn field_of_view(&self) -> f32;

    /// Change the vertical field of view in degrees
    fn set_field_of_view(&mut self, fov: f32);

    /// Recompute derived projection parameters.
    ///
    /// Must be called after [`CameraRig::set_field_of_view`].
    fn update_projection(&mut self);
}

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }
}

impl SceneObject for ModelTransform {
    fn transform(&self) -> ModelTransform {
        *self
    }

    fn set_transform(&mut self, transform: ModelTransform) {
        *self = transform;
    }
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        if self.vertices.is_empty() {
            return (Point3f::origin(), Point3f::origin());
        }

        let mut min = self.vertices[0];
        let mut max = self.vertices[0];

        for vertex in &self.vertices {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        (min, max)
    }
}
