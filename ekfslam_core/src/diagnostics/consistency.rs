// ekfslam_core/src/diagnostics/consistency.rs

use log::warn;
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

use crate::types::Pose;
use crate::utils::geometry::wrap_to_pi;

/// Returned in place of a statistic that could not be evaluated (singular
/// covariance, NaN input). Equal to the expected value for one DOF.
pub const NEUTRAL_STATISTIC: f64 = 1.0;

/// Normalized estimation error squared of a pose, split by sub-state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeesBreakdown {
    /// 3 DOF.
    pub total: f64,
    /// 2 DOF.
    pub position: f64,
    /// 1 DOF.
    pub heading: f64,
}

impl NeesBreakdown {
    pub const DOF: [usize; 3] = [3, 2, 1];

    pub fn as_array(&self) -> [f64; 3] {
        [self.total, self.position, self.heading]
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn!("consistency statistic was {value}, reporting {NEUTRAL_STATISTIC} instead");
        NEUTRAL_STATISTIC
    }
}

/// NEES of `estimate` against `truth` under `covariance`.
///
/// The heading error is wrapped before normalization.
pub fn compute_nees(estimate: &Pose, covariance: &Matrix3<f64>, truth: &Pose) -> NeesBreakdown {
    let mut error: Vector3<f64> = estimate - truth;
    error[2] = wrap_to_pi(error[2]);

    let total = covariance
        .lu()
        .solve(&error)
        .map_or(f64::NAN, |solved| error.dot(&solved));

    let position_error = error.fixed_rows::<2>(0).into_owned();
    let position = covariance
        .fixed_view::<2, 2>(0, 0)
        .into_owned()
        .lu()
        .solve(&position_error)
        .map_or(f64::NAN, |solved| position_error.dot(&solved));

    let heading = error[2] * error[2] / covariance[(2, 2)];

    NeesBreakdown {
        total: sanitize(total),
        position: sanitize(position),
        heading: sanitize(heading),
    }
}

/// Normalized innovation squared `vᵀ S⁻¹ v`.
///
/// An empty innovation or a non positive definite `s` yields [`NEUTRAL_STATISTIC`].
pub fn compute_nis(innovation: &DVector<f64>, s: &DMatrix<f64>) -> f64 {
    if innovation.is_empty() || s.nrows() != innovation.len() {
        return NEUTRAL_STATISTIC;
    }
    match s.clone().cholesky() {
        Some(chol) => sanitize(innovation.dot(&chol.solve(innovation))),
        None => {
            warn!("compute_nis: innovation covariance is not positive definite");
            NEUTRAL_STATISTIC
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{dmatrix, dvector};
    use std::f64::consts::PI;

    #[test]
    fn nees_of_exact_estimate_is_zero() {
        let pose = Vector3::new(1.0, -2.0, 0.5);
        let nees = compute_nees(&pose, &Matrix3::identity(), &pose);
        assert_eq!(nees.as_array(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn nees_splits_position_and_heading() {
        let cov = Matrix3::from_diagonal(&Vector3::new(0.25, 1.0, 0.01));
        let est = Vector3::new(1.0, 1.0, 0.1);
        let nees = compute_nees(&est, &cov, &Vector3::zeros());
        assert_relative_eq!(nees.position, 4.0 + 1.0, epsilon = 1e-12);
        assert_relative_eq!(nees.heading, 1.0, epsilon = 1e-12);
        assert_relative_eq!(nees.total, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn nees_wraps_heading_error() {
        let cov = Matrix3::identity() * 0.01;
        let est = Vector3::new(0.0, 0.0, PI - 0.05);
        let truth = Vector3::new(0.0, 0.0, -PI + 0.05);
        let nees = compute_nees(&est, &cov, &truth);
        assert_relative_eq!(nees.heading, 0.01 / 0.01, epsilon = 1e-9);
    }

    #[test]
    fn nees_with_singular_covariance_is_neutral() {
        let nees = compute_nees(&Vector3::new(1.0, 0.0, 0.0), &Matrix3::zeros(), &Vector3::zeros());
        assert_eq!(nees.as_array(), [NEUTRAL_STATISTIC; 3]);
    }

    #[test]
    fn nis_matches_hand_computation() {
        let v = dvector![1.0, 0.2];
        let s = dmatrix![2.0, 0.0; 0.0, 0.04];
        assert_relative_eq!(compute_nis(&v, &s), 0.5 + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn nis_of_degenerate_inputs_is_neutral() {
        assert_eq!(compute_nis(&DVector::zeros(0), &DMatrix::zeros(0, 0)), NEUTRAL_STATISTIC);
        let s = dmatrix![1.0, 0.0; 0.0, -1.0];
        assert_eq!(compute_nis(&dvector![1.0, 1.0], &s), NEUTRAL_STATISTIC);
    }
}
