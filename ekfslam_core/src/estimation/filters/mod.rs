// ekfslam_core/src/estimation/filters/mod.rs

pub mod slam_filter;

pub use slam_filter::{SlamFilter, UpdateSummary};
