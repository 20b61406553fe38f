// ekfslam_core/src/error.rs

use thiserror::Error;

/// Everything that can go wrong inside the estimator.
///
/// Shape and definiteness violations are programming errors upstream of the
/// filter; they are reported rather than repaired, and no call is retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SlamError {
    /// The state vector and covariance do not describe the same state.
    #[error("{stage}: dimension mismatch, state has {state_dim} entries but covariance is {rows}x{cols}")]
    DimensionMismatch {
        stage: &'static str,
        state_dim: usize,
        rows: usize,
        cols: usize,
    },

    /// The state length is not of the form `3 + 2 * landmarks`.
    #[error("{stage}: state length {len} is not 3 + 2 * landmarks")]
    MalformedState { stage: &'static str, len: usize },

    /// A flat range-bearing vector with an odd number of entries.
    #[error("{stage}: measurement vector has odd length {len}")]
    OddMeasurementLength { stage: &'static str, len: usize },

    #[error("{stage}: covariance is not symmetric (max asymmetry {max_asymmetry:e})")]
    NotSymmetric {
        stage: &'static str,
        max_asymmetry: f64,
    },

    #[error("{stage}: covariance is not positive semi-definite (min eigenvalue {min_eigenvalue:e})")]
    NotPositiveSemiDefinite {
        stage: &'static str,
        min_eigenvalue: f64,
    },

    #[error("{stage}: covariance is not positive definite")]
    NotPositiveDefinite { stage: &'static str },

    /// A landmark sits on top of the sensor, where bearing is undefined.
    #[error("landmark {landmark} is at zero range ({range:e}) from the sensor")]
    DegenerateGeometry { landmark: usize, range: f64 },

    /// The matched innovation covariance could not be factorized.
    #[error("innovation covariance of size {size} is not positive definite")]
    SingularInnovation { size: usize },

    /// The association oracle returned something the adapter cannot use.
    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SlamResult<T> = Result<T, SlamError>;
