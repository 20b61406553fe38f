// ekfslam_core/src/lib.rs

//! Landmark-based EKF-SLAM for a planar robot with a range-bearing sensor.
//!
//! The filter state stacks the robot pose and every mapped landmark. Each
//! cycle is an odometry `predict` followed by an `update` with one batch of
//! unlabeled detections; association decides which detections correct known
//! landmarks and which become new ones.

pub mod association;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod estimation;
pub mod mapping;
pub mod messages;
pub mod models;
pub mod prelude;
pub mod state;
pub mod types;
pub mod utils;
