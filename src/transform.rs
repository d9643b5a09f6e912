//! Affine transforms and axis conversion
//!
//! 3MF writes a transform as twelve numbers: the 4x3 matrix
//! `m00 m01 m02 m10 m11 m12 m20 m21 m22 m30 m31 m32` in row-major order,
//! applied to row vectors `[x y z 1]`. Here it is stored as the equivalent
//! column-vector 4x4 homogeneous matrix whose last row is `0 0 0 1`.

use log::debug;
use nalgebra::{Matrix4, Point3};

/// Size of a 3MF transformation matrix
pub const TRANSFORM_MATRIX_SIZE: usize = 12;

/// An affine transform in the source (Z-up) convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f64>,
}

impl Transform {
    /// The identity transform
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Build a transform from the twelve 3MF matrix values
    pub fn from_values(v: &[f64; TRANSFORM_MATRIX_SIZE]) -> Self {
        #[rustfmt::skip]
        let matrix = Matrix4::new(
            v[0], v[3], v[6], v[9],
            v[1], v[4], v[7], v[10],
            v[2], v[5], v[8], v[11],
            0.0,  0.0,  0.0,  1.0,
        );
        Self { matrix }
    }

    /// A pure translation
    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&nalgebra::Vector3::new(x, y, z)),
        }
    }

    /// Parse a `transform` attribute value
    ///
    /// Values that do not parse count as 0. A string that does not hold
    /// exactly twelve values yields the identity.
    pub fn parse(value: &str) -> Self {
        let values: Vec<f64> = value
            .split_whitespace()
            .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0))
            .collect();

        match <[f64; TRANSFORM_MATRIX_SIZE]>::try_from(values.as_slice()) {
            Ok(array) => Self::from_values(&array),
            Err(_) => {
                debug!(
                    "Transform must have exactly {} values (got {}), using identity",
                    TRANSFORM_MATRIX_SIZE,
                    values.len()
                );
                Self::identity()
            }
        }
    }

    /// Compose: apply `self` first, then `outer`
    pub fn then(&self, outer: &Transform) -> Transform {
        Transform {
            matrix: outer.matrix * self.matrix,
        }
    }

    /// Apply the transform to a point
    pub fn apply(&self, point: [f64; 3]) -> [f64; 3] {
        let p = self
            .matrix
            .transform_point(&Point3::new(point[0], point[1], point[2]));
        [p.x, p.y, p.z]
    }

    /// The underlying homogeneous matrix
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// Whether this is the identity transform
    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix4::identity()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Convert a Z-up source point to the Y-up output convention
///
/// Must run after every source-space transform, or rotations come out mirrored.
pub fn to_y_up(point: [f64; 3]) -> [f64; 3] {
    [point[0], point[2], point[1]]
}
