// ekfslam_sim/src/simulation/sensors/range_bearing.rs

use ekfslam_core::models::measurement::range_bearing::MIN_RANGE;
use ekfslam_core::models::measurement::RangeBearingModel;
use ekfslam_core::types::{Pose, RangeBearing};
use ekfslam_core::utils::geometry::wrap_to_pi;
use nalgebra::Vector2;
use rand::seq::SliceRandom;
use rand::Rng;

use super::noise::CorrelatedNormal;

/// A limited-range, limited field-of-view landmark detector.
///
/// Detections carry no identity and come out in random order.
#[derive(Debug, Clone)]
pub struct RangeBearingSensor {
    model: RangeBearingModel,
    max_range: f64,
    half_fov: f64,
    noise: CorrelatedNormal,
}

impl RangeBearingSensor {
    pub fn new(
        model: RangeBearingModel,
        max_range: f64,
        field_of_view_deg: f64,
        noise: CorrelatedNormal,
    ) -> Self {
        Self {
            model,
            max_range,
            half_fov: 0.5 * field_of_view_deg.to_radians(),
            noise,
        }
    }

    pub fn in_view(&self, z: &RangeBearing) -> bool {
        z.range <= self.max_range && z.bearing.abs() <= self.half_fov
    }

    /// One scan of the landmarks visible from `pose`.
    pub fn detect<R: Rng + ?Sized>(
        &self,
        pose: &Pose,
        landmarks: &[Vector2<f64>],
        rng: &mut R,
    ) -> Vec<RangeBearing> {
        let mut detections: Vec<RangeBearing> = landmarks
            .iter()
            .map(|lm| self.model.observe(pose, lm))
            .filter(|z| self.in_view(z))
            .map(|z| {
                let n = self.noise.sample(rng);
                RangeBearing::new((z.range + n[0]).max(MIN_RANGE), wrap_to_pi(z.bearing + n[1]))
            })
            .collect();
        detections.shuffle(rng);
        detections
    }
}
