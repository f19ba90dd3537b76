//! Mathematical type aliases and angle utilities.
//!
//! Angles are signed radians normalised to `(-pi, pi]`. A positive angle
//! rotates the +x axis towards the +y axis of the actuator frame; the sign
//! ambiguity of a `[0, pi)` domain is resolved by allowing negative angles
//! instead of searching past half a turn.

use nalgebra::{DMatrix, Matrix2, Rotation2, Vector2};

/// Scalar type used throughout the workspace (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 2×2 matrix with [`Real`] entries.
pub type Mat2 = Matrix2<Real>;
/// A shift command in physical actuator units (metres).
pub type PhysicalVector = Vec2;
/// Dense greyscale image buffer, row-major `(row = y, col = x)`.
pub type ImageData = DMatrix<Real>;

/// Build the 2×2 rotation matrix for a signed angle in radians.
pub fn rotation_matrix(angle_rad: Real) -> Mat2 {
    Rotation2::new(angle_rad).into_inner()
}

/// Signed angle in radians that rotates `from` onto `to`, in `(-pi, pi]`.
///
/// Computed as `atan2(cross, dot)`, which avoids the clamp-then-`acos`
/// dance and gets the sign from the 2D cross product directly.
pub fn signed_angle(from: &Vec2, to: &Vec2) -> Real {
    from.perp(to).atan2(from.dot(to))
}

/// Wrap an angle into `(-pi, pi]`.
pub fn normalize_angle(angle_rad: Real) -> Real {
    let wrapped = angle_rad.rem_euclid(std::f64::consts::TAU);
    if wrapped > std::f64::consts::PI {
        wrapped - std::f64::consts::TAU
    } else {
        wrapped
    }
}
