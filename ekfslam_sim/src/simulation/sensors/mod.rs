// ekfslam_sim/src/simulation/sensors/mod.rs

//! Noisy sensor emulation driven by the ground truth.

pub mod noise;
pub mod odometry;
pub mod range_bearing;

pub use noise::CorrelatedNormal;
pub use odometry::OdometrySensor;
pub use range_bearing::RangeBearingSensor;
