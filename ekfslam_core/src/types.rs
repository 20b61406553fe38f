// ekfslam_core/src/types.rs

use nalgebra::{DMatrix, DVector, Vector2, Vector3};
use serde::{Deserialize, Serialize};

// --- Core Type Aliases ---
pub type State = DVector<f64>;
pub type Covariance = DMatrix<f64>;
/// Robot pose `[x, y, heading]` in the world frame.
pub type Pose = Vector3<f64>;
/// Odometry increment `[dx, dy, dheading]` expressed in the robot's own frame.
pub type Odometry = Vector3<f64>;

/// Number of entries the robot pose occupies at the head of the joint state.
pub const POSE_DIM: usize = 3;
/// Number of entries each landmark occupies in the joint state.
pub const LANDMARK_DIM: usize = 2;

/// A single polar detection from the range-bearing sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeBearing {
    /// Distance from the sensor to the landmark (meters).
    pub range: f64,
    /// Angle to the landmark in the sensor frame (radians).
    pub bearing: f64,
}

impl RangeBearing {
    pub fn new(range: f64, bearing: f64) -> Self {
        Self { range, bearing }
    }

    pub fn as_vector(&self) -> Vector2<f64> {
        Vector2::new(self.range, self.bearing)
    }
}

impl From<Vector2<f64>> for RangeBearing {
    fn from(v: Vector2<f64>) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Flattens a detection batch into the interleaved `[r0, b0, r1, b1, ...]` layout.
pub fn flatten_detections(detections: &[RangeBearing]) -> DVector<f64> {
    DVector::from_iterator(
        detections.len() * 2,
        detections.iter().flat_map(|d| [d.range, d.bearing]),
    )
}

/// Number of landmarks encoded by a joint state of length `len`, if the length is valid.
pub fn landmarks_in(len: usize) -> Option<usize> {
    if len < POSE_DIM || (len - POSE_DIM) % LANDMARK_DIM != 0 {
        return None;
    }
    Some((len - POSE_DIM) / LANDMARK_DIM)
}

/// Index of the first state entry belonging to landmark `idx`.
pub fn landmark_offset(idx: usize) -> usize {
    POSE_DIM + LANDMARK_DIM * idx
}
