// ekfslam_core/src/association/mod.rs

//! Measurement-to-landmark association.
//!
//! The matching decision itself is delegated to a [`DataAssociator`], which the
//! filter receives as a boxed trait object. The adapter in this module
//! validates whatever the associator returns and extracts the matched rows and
//! columns of the measurement-space quantities.

use std::fmt::Debug;

use dyn_clone::DynClone;
use nalgebra::{DMatrix, DVector};

pub mod adapter;
pub mod nearest_neighbor;

pub use adapter::{associate, unmatched_measurements, AssociatedBatch};
pub use nearest_neighbor::GatedNearestNeighbor;

/// For each measurement, the index of the landmark it was matched to.
pub type Assignment = Vec<Option<usize>>;

/// Chi-square tail probabilities handed to the associator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssociationGates {
    /// Significance of the joint-compatibility test over all pairs.
    pub joint: f64,
    /// Significance of the per-pair gate.
    pub individual: f64,
}

impl From<[f64; 2]> for AssociationGates {
    fn from(alphas: [f64; 2]) -> Self {
        Self {
            joint: alphas[0],
            individual: alphas[1],
        }
    }
}

/// Decides which measurement corresponds to which known landmark.
pub trait DataAssociator: DynClone + Debug + Send + Sync {
    /// * `z`: stacked measurements `[r0, b0, r1, b1, ...]`
    /// * `z_pred`: stacked predicted measurements, one pair per landmark
    /// * `s`: innovation covariance of `z_pred` (`2L x 2L`)
    ///
    /// Must return one entry per measurement. A landmark may be claimed at most once.
    fn associate(
        &self,
        z: &DVector<f64>,
        z_pred: &DVector<f64>,
        s: &DMatrix<f64>,
        gates: AssociationGates,
    ) -> Assignment;
}

dyn_clone::clone_trait_object!(DataAssociator);
