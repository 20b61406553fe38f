// ekfslam_core/src/estimation/mod.rs

use crate::error::SlamResult;
use crate::messages::SlamInput;
use crate::state::SlamState;

/// The contract for any algorithm that performs the "State Estimator" role.
/// Its sole responsibility is to estimate the joint robot/map state.
pub trait StateEstimator: Send + Sync {
    /// The single, unified method for processing all types of input data.
    ///
    /// On error the estimate is left as it was before the call.
    fn process(&mut self, input: &SlamInput) -> SlamResult<()>;

    /// Returns a reference to the current best estimate of the state.
    fn get_state(&self) -> &SlamState;
}

pub mod ekf_slam;
pub mod filters;

pub use ekf_slam::{EkfSlam, UpdateOutcome};
