// ekfslam_core/src/mapping/mod.rs

use nalgebra::{Matrix2, Vector2};

use crate::state::SlamState;

// --- Map Data Structures ---
/// A snapshot of the landmark map held inside a `SlamState`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkMap {
    /// Landmark positions in insertion order.
    pub positions: Vec<Vector2<f64>>,
    /// The marginal 2x2 covariance of each landmark.
    pub covariances: Vec<Matrix2<f64>>,
}

impl LandmarkMap {
    /// Extracts the map part of a joint state.
    pub fn from_state(state: &SlamState) -> Self {
        let count = state.num_landmarks();
        Self {
            positions: state.landmarks().collect(),
            covariances: (0..count)
                .filter_map(|i| state.landmark_covariance(i))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Index and distance of the mapped landmark closest to `point`.
    pub fn nearest(&self, point: &Vector2<f64>) -> Option<(usize, f64)> {
        self.positions
            .iter()
            .map(|p| (p - point).norm())
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

// --- Declare the implementation sub-modules ---
mod initializer;

// --- Re-export the public functions for a clean API ---
pub use initializer::add_landmarks;
