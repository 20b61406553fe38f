// ekfslam_core/src/messages.rs

use crate::types::{Odometry, RangeBearing};

/// The universal input packet for all `StateEstimator` implementations.
#[derive(Debug, Clone, Copy)]
pub enum SlamInput<'a> {
    /// A body-frame pose increment `[dx, dy, dψ]`.
    Odometry(&'a Odometry),
    /// One batch of range-bearing detections, unordered and unlabeled.
    Detections(&'a [RangeBearing]),
}
