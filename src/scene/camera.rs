//! Camera auto-framing

use super::Aabb;
use nalgebra::{Matrix4, Point3, Vector3};

/// Camera distance as a multiple of the largest scene extent
pub const CAMERA_DISTANCE_FACTOR: f32 = 2.0;

/// Closest the camera gets, so tiny or flat scenes still get a view
const MIN_DISTANCE: f32 = 10.0;

/// Vertical field of view in degrees
const FIELD_OF_VIEW_DEGREES: f32 = 45.0;

/// Camera placement for a scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// Eye position
    pub position: Point3<f32>,
    /// Look-at point, the center of the scene bounds
    pub target: Point3<f32>,
    /// Up direction
    pub up: Vector3<f32>,
    /// Distance from eye to target
    pub distance: f32,
}

impl CameraFrame {
    /// Frame `bounds` from the front, slightly above
    pub fn frame(bounds: &Aabb) -> Self {
        let center = bounds.center();
        let target = Point3::new(center[0] as f32, center[1] as f32, center[2] as f32);
        let distance = (bounds.largest_extent() as f32 * CAMERA_DISTANCE_FACTOR).max(MIN_DISTANCE);
        let direction = Vector3::new(0.0, 0.5, 1.0).normalize();

        Self {
            position: target + direction * distance,
            target,
            up: Vector3::new(0.0, 1.0, 0.0),
            distance,
        }
    }

    /// Right-handed view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Perspective projection whose far plane keeps the whole scene visible
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(
            aspect_ratio,
            FIELD_OF_VIEW_DEGREES.to_radians(),
            0.1,
            self.distance * 10.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_looks_at_center() {
        let bounds = Aabb {
            min: [0.0, 0.0, 0.0],
            max: [100.0, 20.0, 50.0],
        };
        let camera = CameraFrame::frame(&bounds);
        assert_eq!(camera.target, Point3::new(50.0, 10.0, 25.0));
        assert_eq!(camera.distance, 200.0);
        assert!(((camera.position - camera.target).norm() - 200.0).abs() < 1e-3);
        assert!(camera.position.y > camera.target.y);
    }

    #[test]
    fn test_distance_has_floor() {
        let bounds = Aabb {
            min: [1.0, 1.0, 1.0],
            max: [1.0, 1.0, 1.0],
        };
        let camera = CameraFrame::frame(&bounds);
        assert_eq!(camera.distance, MIN_DISTANCE);
        let view = camera.view_matrix();
        assert!(view.iter().all(|v| v.is_finite()));
    }
}
