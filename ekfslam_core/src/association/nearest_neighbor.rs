// ekfslam_core/src/association/nearest_neighbor.rs

use log::debug;
use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

use super::{Assignment, AssociationGates, DataAssociator};
use crate::diagnostics::chi2::chi2_upper_quantile;
use crate::types::LANDMARK_DIM;
use crate::utils::geometry::{wrap_bearings_in_place, wrap_to_pi};

/// Gated nearest-neighbour association with a joint-compatibility check.
///
/// 1. Every measurement/landmark pair whose Mahalanobis distance passes the
///    individual chi-square gate becomes a candidate.
/// 2. Candidates are accepted greedily from the closest, so each measurement
///    and each landmark is used at most once.
/// 3. While the accepted set as a whole fails the joint gate, the pair with
///    the largest individual distance is dropped.
#[derive(Debug, Clone, Default)]
pub struct GatedNearestNeighbor;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    measurement: usize,
    landmark: usize,
    distance: f64,
}

fn pair(v: &DVector<f64>, idx: usize) -> Vector2<f64> {
    v.fixed_rows::<2>(LANDMARK_DIM * idx).into_owned()
}

impl GatedNearestNeighbor {
    fn individual_distance(
        z_i: &Vector2<f64>,
        z_pred_j: &Vector2<f64>,
        s_jj: Matrix2<f64>,
    ) -> Option<f64> {
        let mut v = z_i - z_pred_j;
        v[1] = wrap_to_pi(v[1]);
        s_jj.cholesky().map(|chol| v.dot(&chol.solve(&v)))
    }

    /// Joint Mahalanobis distance of the accepted pairs.
    fn joint_distance(
        accepted: &[Candidate],
        z: &DVector<f64>,
        z_pred: &DVector<f64>,
        s: &DMatrix<f64>,
    ) -> Option<f64> {
        let z_rows: Vec<usize> = accepted
            .iter()
            .flat_map(|c| [2 * c.measurement, 2 * c.measurement + 1])
            .collect();
        let pred_rows: Vec<usize> = accepted
            .iter()
            .flat_map(|c| [2 * c.landmark, 2 * c.landmark + 1])
            .collect();

        let mut v = z.select_rows(&z_rows) - z_pred.select_rows(&pred_rows);
        wrap_bearings_in_place(&mut v);
        let s_joint = s.select_rows(&pred_rows).select_columns(&pred_rows);
        s_joint.cholesky().map(|chol| v.dot(&chol.solve(&v)))
    }
}

impl DataAssociator for GatedNearestNeighbor {
    fn associate(
        &self,
        z: &DVector<f64>,
        z_pred: &DVector<f64>,
        s: &DMatrix<f64>,
        gates: AssociationGates,
    ) -> Assignment {
        let num_measurements = z.len() / LANDMARK_DIM;
        let num_landmarks = z_pred.len() / LANDMARK_DIM;
        let mut assignment = vec![None; num_measurements];
        if num_measurements == 0 || num_landmarks == 0 {
            return assignment;
        }

        // 1. Individual gating.
        let gate = chi2_upper_quantile(LANDMARK_DIM, gates.individual);
        let mut candidates = Vec::new();
        for j in 0..num_landmarks {
            let z_pred_j = pair(z_pred, j);
            let s_jj = s
                .fixed_view::<2, 2>(LANDMARK_DIM * j, LANDMARK_DIM * j)
                .into_owned();
            for i in 0..num_measurements {
                match Self::individual_distance(&pair(z, i), &z_pred_j, s_jj) {
                    Some(distance) if distance < gate => candidates.push(Candidate {
                        measurement: i,
                        landmark: j,
                        distance,
                    }),
                    _ => {}
                }
            }
        }

        // 2. Greedy conflict resolution.
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        let mut landmark_taken = vec![false; num_landmarks];
        let mut accepted: Vec<Candidate> = Vec::new();
        for c in candidates {
            if assignment[c.measurement].is_none() && !landmark_taken[c.landmark] {
                assignment[c.measurement] = Some(c.landmark);
                landmark_taken[c.landmark] = true;
                accepted.push(c);
            }
        }

        // 3. Joint compatibility. `accepted` is sorted by distance, so the
        //    worst pair is always last.
        while !accepted.is_empty() {
            let dof = LANDMARK_DIM * accepted.len();
            let joint_gate = chi2_upper_quantile(dof, gates.joint);
            match Self::joint_distance(&accepted, z, z_pred, s) {
                Some(d) if d < joint_gate => break,
                _ => {
                    if let Some(worst) = accepted.pop() {
                        debug!(
                            "nearest neighbour: dropping measurement {} -> landmark {} (joint test failed)",
                            worst.measurement, worst.landmark
                        );
                        assignment[worst.measurement] = None;
                    }
                }
            }
        }

        assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    fn diag_s(num_landmarks: usize) -> DMatrix<f64> {
        let block = Matrix2::new(0.04, 0.0, 0.0, 0.0004);
        crate::utils::linalg::repeat_block_diag(&block, num_landmarks)
    }

    fn gates() -> AssociationGates {
        [0.001, 0.0001].into()
    }

    #[test]
    fn matches_each_measurement_to_its_landmark() {
        let z_pred = dvector![5.0, 0.0, 8.0, 1.0, 3.0, -1.0];
        // Shuffled, slightly perturbed measurements of landmarks 2 and 0.
        let z = dvector![3.05, -1.01, 4.9, 0.005];
        let a = GatedNearestNeighbor.associate(&z, &z_pred, &diag_s(3), gates());
        assert_eq!(a, vec![Some(2), Some(0)]);
    }

    #[test]
    fn far_measurement_stays_unmatched() {
        let z_pred = dvector![5.0, 0.0];
        let z = dvector![5.0, 0.0, 20.0, 2.0];
        let a = GatedNearestNeighbor.associate(&z, &z_pred, &diag_s(1), gates());
        assert_eq!(a, vec![Some(0), None]);
    }

    #[test]
    fn conflicting_claims_go_to_the_closest() {
        let z_pred = dvector![5.0, 0.0];
        let z = dvector![5.2, 0.0, 5.05, 0.0];
        let a = GatedNearestNeighbor.associate(&z, &z_pred, &diag_s(1), gates());
        assert_eq!(a, vec![None, Some(0)]);
    }

    #[test]
    fn bearing_difference_is_wrapped() {
        let pi = std::f64::consts::PI;
        let z_pred = dvector![5.0, pi - 0.005];
        let z = dvector![5.0, -pi + 0.005];
        let a = GatedNearestNeighbor.associate(&z, &z_pred, &diag_s(1), gates());
        assert_eq!(a, vec![Some(0)]);
    }

    #[test]
    fn no_landmarks_or_no_measurements() {
        let empty = DVector::zeros(0);
        let z = dvector![1.0, 0.0];
        assert_eq!(
            GatedNearestNeighbor.associate(&z, &empty, &DMatrix::zeros(0, 0), gates()),
            vec![None]
        );
        assert!(GatedNearestNeighbor
            .associate(&empty, &z, &diag_s(1), gates())
            .is_empty());
    }
}
