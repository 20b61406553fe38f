// ekfslam_sim/src/lib.rs

//! Offline simulator for the `ekfslam_core` filter: a robot drives a scripted
//! path through a landmark field while emulated odometry and a range-bearing
//! sensor feed the estimator, and its consistency is scored against the truth.

// This prelude is for convenience for other files WITHIN the ekfslam_sim crate.
pub mod prelude;

// This module contains all the simulation-specific logic.
pub mod cli;
pub mod simulation;
