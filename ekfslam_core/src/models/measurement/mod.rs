// ekfslam_core/src/models/measurement/mod.rs

use crate::error::SlamResult;
use crate::state::SlamState;
use crate::types::{Pose, RangeBearing};
use dyn_clone::DynClone;
use nalgebra::{DMatrix, DVector, Matrix2, Matrix2x3, Vector2};
use std::fmt::Debug;

/// Linearized inverse of the sensor model for one detection.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkInit {
    /// The landmark position in the world frame.
    pub position: Vector2<f64>,
    /// Sensitivity of `position` to the robot pose, `∂m/∂[x, y, ψ]`.
    pub gx: Matrix2x3<f64>,
    /// Sensitivity of `position` to the detection, `∂m/∂[r, φ]`.
    pub gz: Matrix2<f64>,
}

// --- MEASUREMENT MODEL TRAIT ---
// Represents the mathematical model of a landmark sensor. `z = h(η) + v`
pub trait LandmarkMeasurement: DynClone + Debug + Send + Sync {
    /// Returns the per-landmark measurement noise covariance matrix `R`.
    fn get_r(&self) -> &Matrix2<f64>;

    /// Predicts one `(range, bearing)` pair per landmark, interleaved in landmark order.
    fn predict_measurements(&self, state: &SlamState) -> DVector<f64>;

    /// Calculates the measurement Jacobian `H = ∂h/∂η`, shape `(2L, 3 + 2L)`.
    fn calculate_jacobian(&self, state: &SlamState) -> SlamResult<DMatrix<f64>>;

    /// Converts a detection taken from `pose` into a world-frame landmark with its Jacobians.
    fn inverse(&self, pose: &Pose, z: &RangeBearing) -> LandmarkInit;
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn LandmarkMeasurement>`.
dyn_clone::clone_trait_object!(LandmarkMeasurement);

pub mod range_bearing;

pub use range_bearing::RangeBearingModel;
