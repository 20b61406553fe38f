// ekfslam_core/src/utils/geometry.rs

//! Small planar geometry helpers shared by every model in the crate.

use nalgebra::{DVector, Matrix2};
use num_traits::{Float, FloatConst};

/// Returns the 2D rotation matrix for a counter-clockwise rotation of `angle` radians.
pub fn rot_mat_2d(angle: f64) -> Matrix2<f64> {
    let (s, c) = angle.sin_cos();
    Matrix2::new(c, -s, s, c)
}

/// Wraps an angle into the half-open interval (-π, π].
///
/// `-π` itself maps to `+π` so that every heading has exactly one representation.
/// NaN is passed through untouched.
pub fn wrap_to_pi<T: Float + FloatConst>(angle: T) -> T {
    if !angle.is_finite() {
        return angle;
    }
    let pi = T::PI();
    let tau = T::TAU();

    // rem_euclid-style reduction into [0, 2π) after shifting by π.
    let shifted = angle + pi;
    let mut reduced = shifted - tau * (shifted / tau).floor();
    // Floor can round up to exactly 2π for tiny negative inputs.
    if reduced >= tau {
        reduced = reduced - tau;
    }
    let wrapped = reduced - pi;

    if wrapped <= -pi {
        wrapped + tau
    } else {
        wrapped
    }
}

/// Wraps every bearing entry of an interleaved `[r0, b0, r1, b1, ...]` vector.
pub fn wrap_bearings_in_place(v: &mut DVector<f64>) {
    for i in (1..v.len()).step_by(2) {
        v[i] = wrap_to_pi(v[i]);
    }
}
