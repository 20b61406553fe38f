// ekfslam_core/src/models/measurement/range_bearing.rs

use nalgebra::{DMatrix, DVector, Matrix2, Matrix2x3, RowVector2, RowVector3, Vector2};
use std::f64::consts::FRAC_PI_2;

use crate::error::{SlamError, SlamResult};
use crate::models::measurement::{LandmarkInit, LandmarkMeasurement};
use crate::state::SlamState;
use crate::types::{landmark_offset, Pose, RangeBearing, LANDMARK_DIM, POSE_DIM};
use crate::utils::geometry::rot_mat_2d;

/// Ranges below this are treated as a landmark sitting on the sensor.
pub const MIN_RANGE: f64 = 1e-9;

/// A range-bearing sensor mounted at a fixed offset on the robot.
///
/// The sensor shares the robot heading, so bearings are measured relative to
/// the robot's x-axis but from the sensor's position.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBearingModel {
    /// Sensor position in the robot body frame.
    pub sensor_offset: Vector2<f64>,
    /// The 2x2 measurement noise covariance matrix, R.
    pub r_matrix: Matrix2<f64>,
}

impl RangeBearingModel {
    pub fn new(sensor_offset: Vector2<f64>, r_matrix: Matrix2<f64>) -> Self {
        Self {
            sensor_offset,
            r_matrix,
        }
    }

    /// Sensor position in the world frame for the given pose.
    pub fn sensor_position(&self, pose: &Pose) -> Vector2<f64> {
        pose.xy() + rot_mat_2d(pose.z) * self.sensor_offset
    }

    /// Landmark position relative to the sensor, still expressed in world axes.
    fn relative(&self, pose: &Pose, landmark: &Vector2<f64>) -> Vector2<f64> {
        landmark - self.sensor_position(pose)
    }

    /// The ideal detection of a single landmark from `pose`.
    pub fn observe(&self, pose: &Pose, landmark: &Vector2<f64>) -> RangeBearing {
        let delta = self.relative(pose, landmark);
        let in_sensor = rot_mat_2d(-pose.z) * delta;
        RangeBearing::new(delta.norm(), in_sensor.y.atan2(in_sensor.x))
    }
}

impl LandmarkMeasurement for RangeBearingModel {
    fn get_r(&self) -> &Matrix2<f64> {
        &self.r_matrix
    }

    fn predict_measurements(&self, state: &SlamState) -> DVector<f64> {
        let pose = state.pose();
        let mut z_pred = DVector::zeros(state.num_landmarks() * LANDMARK_DIM);
        for (i, landmark) in state.landmarks().enumerate() {
            let z = self.observe(&pose, &landmark);
            z_pred[2 * i] = z.range;
            z_pred[2 * i + 1] = z.bearing;
        }
        z_pred
    }

    fn calculate_jacobian(&self, state: &SlamState) -> SlamResult<DMatrix<f64>> {
        let pose = state.pose();
        let num_landmarks = state.num_landmarks();
        let mut h_jac = DMatrix::zeros(LANDMARK_DIM * num_landmarks, state.dim());

        // ∂zc/∂[x, y, ψ] where zc = m - ρ - R(ψ)·offset. Identical for every landmark.
        let mut dzc_dpose = Matrix2x3::<f64>::zeros();
        dzc_dpose
            .fixed_view_mut::<2, 2>(0, 0)
            .copy_from(&(-Matrix2::<f64>::identity()));
        dzc_dpose
            .column_mut(2)
            .copy_from(&(-(rot_mat_2d(pose.z + FRAC_PI_2) * self.sensor_offset)));

        let r_half_pi = rot_mat_2d(FRAC_PI_2);

        for (i, landmark) in state.landmarks().enumerate() {
            let zc = self.relative(&pose, &landmark);
            let range = zc.norm();
            if range < MIN_RANGE {
                return Err(SlamError::DegenerateGeometry { landmark: i, range });
            }

            // Gradients of range and bearing w.r.t. zc.
            let d_range: RowVector2<f64> = zc.transpose() / range;
            let d_bearing: RowVector2<f64> = (r_half_pi * zc).transpose() / (range * range);

            let range_row = d_range * dzc_dpose;
            // Bearing is measured in the rotated sensor frame, hence the -1 on ψ.
            let bearing_row = d_bearing * dzc_dpose - RowVector3::new(0.0, 0.0, 1.0);

            let row = LANDMARK_DIM * i;
            h_jac.fixed_view_mut::<1, 3>(row, 0).copy_from(&range_row);
            h_jac.fixed_view_mut::<1, 3>(row + 1, 0).copy_from(&bearing_row);

            // ∂zc/∂m = I, the negative of the pose-position block.
            let col = landmark_offset(i);
            h_jac.fixed_view_mut::<1, 2>(row, col).copy_from(&d_range);
            h_jac.fixed_view_mut::<1, 2>(row + 1, col).copy_from(&d_bearing);
        }

        debug_assert_eq!(h_jac.ncols(), POSE_DIM + LANDMARK_DIM * num_landmarks);
        Ok(h_jac)
    }

    fn inverse(&self, pose: &Pose, z: &RangeBearing) -> LandmarkInit {
        let rot = rot_mat_2d(pose.z + z.bearing);
        let offset_world = rot_mat_2d(pose.z) * self.sensor_offset;
        let offset_world_d_heading = rot_mat_2d(pose.z + FRAC_PI_2) * self.sensor_offset;

        let position = pose.xy() + rot.column(0) * z.range + offset_world;

        let mut gx = Matrix2x3::<f64>::zeros();
        gx.fixed_view_mut::<2, 2>(0, 0)
            .copy_from(&Matrix2::<f64>::identity());
        gx.column_mut(2)
            .copy_from(&(rot.column(1) * z.range + offset_world_d_heading));

        let gz = rot * Matrix2::new(1.0, 0.0, 0.0, z.range);

        LandmarkInit { position, gx, gz }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::geometry::wrap_to_pi;
    use approx::assert_abs_diff_eq;
    use nalgebra::{dvector, Matrix3, Vector3};

    fn model(offset: Vector2<f64>) -> RangeBearingModel {
        RangeBearingModel::new(offset, Matrix2::new(0.01, 0.0, 0.0, 0.001))
    }

    fn state_with(vector: DVector<f64>) -> SlamState {
        let n = vector.len();
        SlamState::from_parts(vector, DMatrix::identity(n, n)).unwrap()
    }

    #[test]
    fn landmark_straight_ahead() {
        let state = state_with(dvector![0.0, 0.0, 0.0, 2.0, 0.0]);
        let z = model(Vector2::zeros()).predict_measurements(&state);
        assert_abs_diff_eq!(z, dvector![2.0, 0.0], epsilon = 1e-12);
    }

    #[test]
    fn bearing_is_relative_to_heading_and_offset() {
        // Sensor 1 m ahead of a robot facing +y sits at (0, 1); landmark at (-1, 1) is to its left.
        let state = state_with(dvector![0.0, 0.0, FRAC_PI_2, -1.0, 1.0]);
        let z = model(Vector2::new(1.0, 0.0)).predict_measurements(&state);
        assert_abs_diff_eq!(z, dvector![1.0, FRAC_PI_2], epsilon = 1e-12);
    }

    #[test]
    fn no_landmarks_gives_empty_prediction() {
        let state = state_with(dvector![1.0, 2.0, 0.3]);
        let m = model(Vector2::zeros());
        assert_eq!(m.predict_measurements(&state).len(), 0);
        assert_eq!(m.calculate_jacobian(&state).unwrap().shape(), (0, 3));
    }

    #[test]
    fn jacobian_matches_finite_differences_with_offset() {
        let m = model(Vector2::new(0.4, -0.2));
        let eta = dvector![0.5, -0.3, 2.9, 3.0, 1.0, -2.0, 4.0, 1.5, -3.5];
        let h = m.calculate_jacobian(&state_with(eta.clone())).unwrap();
        assert_eq!(h.shape(), (6, 9));

        let eps = 1e-6;
        for j in 0..eta.len() {
            let mut plus = eta.clone();
            let mut minus = eta.clone();
            plus[j] += eps;
            minus[j] -= eps;
            let zp = m.predict_measurements(&state_with(plus));
            let zm = m.predict_measurements(&state_with(minus));
            for i in 0..zp.len() {
                let mut d = zp[i] - zm[i];
                if i % 2 == 1 {
                    d = wrap_to_pi(d);
                }
                assert_abs_diff_eq!(h[(i, j)], d / (2.0 * eps), epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn jacobian_is_block_sparse() {
        let m = model(Vector2::new(0.1, 0.1));
        let h = m
            .calculate_jacobian(&state_with(dvector![0.0, 0.0, 0.2, 3.0, 1.0, -2.0, 4.0]))
            .unwrap();
        // Landmark 0 rows never touch landmark 1 columns and vice versa.
        for r in 0..2 {
            assert_eq!(h[(r, 5)], 0.0);
            assert_eq!(h[(r, 6)], 0.0);
            assert_eq!(h[(r + 2, 3)], 0.0);
            assert_eq!(h[(r + 2, 4)], 0.0);
        }
        // Landmark block is the negative of the pose-position block.
        let pose_block = h.view((0, 0), (2, 2)).clone_owned();
        let lm_block = h.view((0, 3), (2, 2)).clone_owned();
        assert_abs_diff_eq!(lm_block, -pose_block, epsilon = 1e-12);
    }

    #[test]
    fn zero_range_is_rejected() {
        let state = state_with(dvector![1.0, 1.0, 0.0, 1.0, 1.0]);
        assert!(matches!(
            model(Vector2::zeros()).calculate_jacobian(&state),
            Err(SlamError::DegenerateGeometry { landmark: 0, .. })
        ));
    }

    #[test]
    fn inverse_round_trips_through_observe() {
        let m = model(Vector2::new(0.3, 0.1));
        let pose = Vector3::new(1.0, -2.0, 0.7);
        let z = RangeBearing::new(4.0, -0.6);
        let init = m.inverse(&pose, &z);
        let back = m.observe(&pose, &init.position);
        assert_abs_diff_eq!(back.range, z.range, epsilon = 1e-12);
        assert_abs_diff_eq!(back.bearing, z.bearing, epsilon = 1e-12);
    }

    #[test]
    fn inverse_jacobians_match_finite_differences() {
        let m = model(Vector2::new(0.3, 0.1));
        let pose = Vector3::new(1.0, -2.0, 0.7);
        let z = RangeBearing::new(4.0, -0.6);
        let init = m.inverse(&pose, &z);
        let eps = 1e-6;

        let mut gx = Matrix3::zeros();
        for j in 0..3 {
            let mut plus = pose;
            let mut minus = pose;
            plus[j] += eps;
            minus[j] -= eps;
            let d = (m.inverse(&plus, &z).position - m.inverse(&minus, &z).position) / (2.0 * eps);
            gx.fixed_view_mut::<2, 1>(0, j).copy_from(&d);
        }
        assert_abs_diff_eq!(init.gx, gx.fixed_view::<2, 3>(0, 0).into_owned(), epsilon = 1e-6);

        let dr = (m.inverse(&pose, &RangeBearing::new(4.0 + eps, -0.6)).position
            - m.inverse(&pose, &RangeBearing::new(4.0 - eps, -0.6)).position)
            / (2.0 * eps);
        let db = (m.inverse(&pose, &RangeBearing::new(4.0, -0.6 + eps)).position
            - m.inverse(&pose, &RangeBearing::new(4.0, -0.6 - eps)).position)
            / (2.0 * eps);
        assert_abs_diff_eq!(init.gz.column(0).into_owned(), dr, epsilon = 1e-6);
        assert_abs_diff_eq!(init.gz.column(1).into_owned(), db, epsilon = 1e-6);
    }
}
