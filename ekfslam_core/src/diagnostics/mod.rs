// ekfslam_core/src/diagnostics/mod.rs

//! Filter consistency measures: NEES, NIS and the chi-square machinery used to
//! judge them.

pub mod chi2;
pub mod consistency;
pub mod tracker;

pub use chi2::{chi2_interval, chi2_upper_quantile};
pub use consistency::{compute_nees, compute_nis, NeesBreakdown, NEUTRAL_STATISTIC};
pub use tracker::{ConsistencyReport, ConsistencyTracker};
