// ekfslam_sim/src/simulation/core/ground_truth.rs

use ekfslam_core::models::dynamics::{MotionModel, OdometryMotion};
use ekfslam_core::types::{Odometry, Pose};
use nalgebra::Vector2;

/// The true robot pose and the true, static landmark map.
#[derive(Debug, Clone)]
pub struct GroundTruthState {
    pub pose: Pose,
    pub landmarks: Vec<Vector2<f64>>,
}

impl GroundTruthState {
    pub fn new(pose: Pose, landmarks: Vec<Vector2<f64>>) -> Self {
        Self { pose, landmarks }
    }

    /// Applies a noise-free body-frame increment to the true pose.
    pub fn advance(&mut self, command: &Odometry) {
        self.pose = OdometryMotion.predict_pose(&self.pose, command);
    }
}
