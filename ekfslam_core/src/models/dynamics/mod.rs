// ekfslam_core/src/models/dynamics/mod.rs

use crate::types::{Odometry, Pose};
use dyn_clone::DynClone;
use nalgebra::Matrix3;
use std::fmt::Debug;

/// A trait for pose dynamics models used within the SLAM estimator.
///
/// The model propagates only the robot pose; landmarks are static and never
/// touched by prediction.
pub trait MotionModel: DynClone + Debug + Send + Sync {
    /// Computes the predicted pose `x' = f(x, u)`, heading wrapped to (-π, π].
    fn predict_pose(&self, x: &Pose, u: &Odometry) -> Pose;

    /// Jacobian `Fx = ∂f/∂x` evaluated at `(x, u)`.
    fn jacobian_state(&self, x: &Pose, u: &Odometry) -> Matrix3<f64>;

    /// Jacobian `Fu = ∂f/∂u` evaluated at `(x, u)`.
    fn jacobian_control(&self, x: &Pose, u: &Odometry) -> Matrix3<f64>;

    /// Both Jacobians at once, `(Fx, Fu)`.
    fn calculate_jacobian(&self, x: &Pose, u: &Odometry) -> (Matrix3<f64>, Matrix3<f64>) {
        (self.jacobian_state(x, u), self.jacobian_control(x, u))
    }
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn MotionModel>`.
dyn_clone::clone_trait_object!(MotionModel);

pub mod odometry;

pub use odometry::OdometryMotion;
