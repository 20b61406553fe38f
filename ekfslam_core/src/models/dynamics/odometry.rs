// ekfslam_core/src/models/dynamics/odometry.rs

use nalgebra::{Matrix3, Vector3};
use std::f64::consts::FRAC_PI_2;

use crate::models::dynamics::MotionModel;
use crate::types::{Odometry, Pose};
use crate::utils::geometry::{rot_mat_2d, wrap_to_pi};

/// Body-frame odometry composition: the increment `u = [dx, dy, dψ]` is
/// measured in the robot's own frame and rotated into the world by the
/// current heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct OdometryMotion;

impl MotionModel for OdometryMotion {
    fn predict_pose(&self, x: &Pose, u: &Odometry) -> Pose {
        let position = x.xy() + rot_mat_2d(x.z) * u.xy();
        Vector3::new(position.x, position.y, wrap_to_pi(x.z + u.z))
    }

    fn jacobian_state(&self, x: &Pose, u: &Odometry) -> Matrix3<f64> {
        let mut fx = Matrix3::identity();
        // d/dψ of R(ψ)·u_xy is R(ψ + π/2)·u_xy.
        let d_heading = rot_mat_2d(x.z + FRAC_PI_2) * u.xy();
        fx[(0, 2)] = d_heading.x;
        fx[(1, 2)] = d_heading.y;
        fx
    }

    fn jacobian_control(&self, x: &Pose, _u: &Odometry) -> Matrix3<f64> {
        let mut fu = Matrix3::identity();
        fu.fixed_view_mut::<2, 2>(0, 0).copy_from(&rot_mat_2d(x.z));
        fu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-6;

    fn numerical_jacobian(
        f: impl Fn(&Vector3<f64>) -> Vector3<f64>,
        at: &Vector3<f64>,
    ) -> Matrix3<f64> {
        let mut jac = Matrix3::zeros();
        for j in 0..3 {
            let mut plus = *at;
            let mut minus = *at;
            plus[j] += EPS;
            minus[j] -= EPS;
            let mut diff = f(&plus) - f(&minus);
            diff.z = wrap_to_pi(diff.z);
            jac.set_column(j, &(diff / (2.0 * EPS)));
        }
        jac
    }

    #[test]
    fn straight_step_from_origin() {
        let x = OdometryMotion.predict_pose(&Vector3::zeros(), &Vector3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(x, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn increment_is_rotated_by_heading() {
        let x = Vector3::new(1.0, 1.0, PI / 2.0);
        let u = Vector3::new(2.0, 0.5, 0.1);
        let next = OdometryMotion.predict_pose(&x, &u);
        assert_abs_diff_eq!(next, Vector3::new(0.5, 3.0, PI / 2.0 + 0.1), epsilon = 1e-12);
    }

    #[test]
    fn heading_stays_wrapped() {
        let next =
            OdometryMotion.predict_pose(&Vector3::new(0.0, 0.0, 3.0), &Vector3::new(0.0, 0.0, 0.5));
        assert!(next.z > -PI && next.z <= PI);
        assert_abs_diff_eq!(next.z, 3.5 - 2.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn state_jacobian_matches_finite_differences() {
        let x = Vector3::new(0.3, -1.2, 0.8);
        let u = Vector3::new(0.7, -0.2, 0.05);
        let analytic = OdometryMotion.jacobian_state(&x, &u);
        let numeric = numerical_jacobian(|xp| OdometryMotion.predict_pose(xp, &u), &x);
        assert_abs_diff_eq!(analytic, numeric, epsilon = 1e-6);
    }

    #[test]
    fn control_jacobian_matches_finite_differences() {
        let x = Vector3::new(2.0, 1.0, -2.4);
        let u = Vector3::new(0.4, 0.1, -0.3);
        let analytic = OdometryMotion.jacobian_control(&x, &u);
        let numeric = numerical_jacobian(|up| OdometryMotion.predict_pose(&x, up), &u);
        assert_abs_diff_eq!(analytic, numeric, epsilon = 1e-6);
    }

    #[test]
    fn control_jacobian_is_identity_at_zero_heading() {
        let (fx, fu) =
            OdometryMotion.calculate_jacobian(&Vector3::zeros(), &Vector3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(fu, Matrix3::identity(), epsilon = 1e-12);
        assert_abs_diff_eq!(fx[(1, 2)], 1.0, epsilon = 1e-12);
    }
}
