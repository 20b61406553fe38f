// ekfslam_core/src/mapping/initializer.rs

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::error::{SlamError, SlamResult};
use crate::models::measurement::range_bearing::MIN_RANGE;
use crate::models::measurement::LandmarkMeasurement;
use crate::state::SlamState;
use crate::types::{RangeBearing, LANDMARK_DIM, POSE_DIM};

/// Appends one landmark per detection in `z` (flat `[r0, φ0, r1, φ1, ...]`).
///
/// Each new landmark is correlated with the existing state only through the
/// robot pose:
///
/// ```text
/// P_new = [ P           P[:, :3]·Gxᵀ            ]
///         [ Gx·P[:3, :] Gx·P_pose·Gxᵀ + Gz·R·Gzᵀ ]
/// ```
///
/// `Gz·R·Gzᵀ` is block diagonal across the new landmarks; they share pose
/// uncertainty but not measurement noise.
///
/// A range below `MIN_RANGE` (zero, negative or NaN) would put the landmark on
/// the sensor and is rejected with `DegenerateGeometry`.
pub fn add_landmarks(
    state: &SlamState,
    z: &DVector<f64>,
    model: &dyn LandmarkMeasurement,
) -> SlamResult<SlamState> {
    state.check_shape("add_landmarks: input")?;
    if z.len() % LANDMARK_DIM != 0 {
        return Err(SlamError::OddMeasurementLength {
            stage: "add_landmarks",
            len: z.len(),
        });
    }

    let n = state.dim();
    let added = z.len();
    if added == 0 {
        return Ok(state.clone());
    }

    let pose = state.pose();
    let r = model.get_r();

    let mut new_landmarks = DVector::zeros(added);
    let mut gx_all = DMatrix::zeros(added, POSE_DIM);
    let mut r_all = DMatrix::zeros(added, added);

    for j in 0..added / LANDMARK_DIM {
        let ind = LANDMARK_DIM * j;
        if z[ind].is_nan() || z[ind] < MIN_RANGE {
            return Err(SlamError::DegenerateGeometry {
                landmark: state.num_landmarks() + j,
                range: z[ind],
            });
        }
        let detection = RangeBearing::new(z[ind], z[ind + 1]);
        let init = model.inverse(&pose, &detection);

        new_landmarks.fixed_rows_mut::<2>(ind).copy_from(&init.position);
        gx_all.fixed_view_mut::<2, 3>(ind, 0).copy_from(&init.gx);
        r_all
            .fixed_view_mut::<2, 2>(ind, ind)
            .copy_from(&(init.gz * r * init.gz.transpose()));
    }

    let p = &state.covariance;
    let p_pose = p.view((0, 0), (POSE_DIM, POSE_DIM));

    let mut p_added = DMatrix::zeros(n + added, n + added);
    p_added.view_mut((0, 0), (n, n)).copy_from(p);
    p_added
        .view_mut((n, n), (added, added))
        .copy_from(&(&gx_all * p_pose * gx_all.transpose() + r_all));

    let cross = p.columns(0, POSE_DIM) * gx_all.transpose();
    p_added.view_mut((0, n), (n, added)).copy_from(&cross);
    // Mirror rather than recompute so the result is exactly symmetric.
    p_added.view_mut((n, 0), (added, n)).copy_from(&cross.transpose());

    let mut eta_added = DVector::zeros(n + added);
    eta_added.rows_mut(0, n).copy_from(&state.vector);
    eta_added.rows_mut(n, added).copy_from(&new_landmarks);

    let augmented = SlamState {
        vector: eta_added,
        covariance: p_added,
    };
    augmented.check_consistency("add_landmarks: output", false)?;

    debug!(
        "Initialized {} landmark(s); map now holds {}.",
        added / LANDMARK_DIM,
        augmented.num_landmarks()
    );
    Ok(augmented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::measurement::RangeBearingModel;
    use approx::assert_abs_diff_eq;
    use nalgebra::{dvector, Matrix2, Matrix3, Vector2, Vector3};

    fn model() -> RangeBearingModel {
        RangeBearingModel::new(Vector2::zeros(), Matrix2::new(0.04, 0.0, 0.0, 0.0025))
    }

    #[test]
    fn single_detection_from_certain_pose_copies_r() {
        let state = SlamState::new(Vector3::zeros(), Matrix3::zeros());
        let out = add_landmarks(&state, &dvector![1.0, 0.0], &model()).unwrap();

        assert_eq!(out.dim(), 5);
        assert_abs_diff_eq!(
            out.landmark(0).unwrap(),
            Vector2::new(1.0, 0.0),
            epsilon = 1e-12
        );
        // Gz = R(0)·diag(1, 1) = I, so the block equals R.
        assert_abs_diff_eq!(
            out.landmark_covariance(0).unwrap(),
            *model().get_r(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn dimensions_grow_by_two_per_detection() {
        let state = SlamState::new(Vector3::new(1.0, 2.0, 0.4), Matrix3::identity() * 0.01);
        let z = dvector![3.0, 0.1, 5.0, -1.0, 2.0, 2.5];
        let out = add_landmarks(&state, &z, &model()).unwrap();
        assert_eq!(out.dim(), 9);
        assert_eq!(out.covariance.shape(), (9, 9));
        assert!(out.check_consistency("test", false).is_ok());
        // Prior block is untouched.
        assert_abs_diff_eq!(out.pose_covariance(), state.pose_covariance());
    }

    #[test]
    fn cross_covariance_flows_through_pose() {
        let mut p = Matrix3::identity() * 0.02;
        p[(0, 2)] = 0.005;
        p[(2, 0)] = 0.005;
        let state = SlamState::new(Vector3::new(0.0, 0.0, 0.3), p);
        let out = add_landmarks(&state, &dvector![2.0, 0.5], &model()).unwrap();

        let init = model().inverse(&state.pose(), &RangeBearing::new(2.0, 0.5));
        let expected = p * init.gx.transpose();
        let cross = out.covariance.view((0, 3), (3, 2)).clone_owned();
        assert_abs_diff_eq!(
            cross,
            DMatrix::from_column_slice(3, 2, expected.as_slice()),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            out.covariance.view((3, 0), (2, 3)).clone_owned(),
            cross.transpose()
        );
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let state = SlamState::new(Vector3::new(1.0, 1.0, 1.0), Matrix3::identity());
        let out = add_landmarks(&state, &DVector::zeros(0), &model()).unwrap();
        assert_eq!(out, state);
    }

    #[test]
    fn odd_batch_is_rejected() {
        let state = SlamState::default();
        assert!(matches!(
            add_landmarks(&state, &dvector![1.0, 0.0, 2.0], &model()),
            Err(SlamError::OddMeasurementLength { len: 3, .. })
        ));
    }

    #[test]
    fn non_positive_range_is_rejected() {
        let state = SlamState::new(Vector3::zeros(), Matrix3::identity() * 0.01);
        let one = add_landmarks(&state, &dvector![2.0, 0.3], &model()).unwrap();

        // The second detection in the batch is the bad one; index counts the existing map.
        for range in [0.0, -2.0, f64::NAN] {
            match add_landmarks(&one, &dvector![1.0, 0.0, range, 0.5], &model()) {
                Err(SlamError::DegenerateGeometry { landmark, range: r }) => {
                    assert_eq!(landmark, 2);
                    assert!(r == range || (r.is_nan() && range.is_nan()));
                }
                other => panic!("range {range}: expected DegenerateGeometry, got {other:?}"),
            }
        }
    }
}
