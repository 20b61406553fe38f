// ekfslam_sim/src/simulation/sensors/odometry.rs

use ekfslam_core::types::Odometry;
use rand::Rng;

use super::noise::CorrelatedNormal;

/// Wheel/visual odometry: the commanded body-frame increment plus noise.
#[derive(Debug, Clone)]
pub struct OdometrySensor {
    noise: CorrelatedNormal,
}

impl OdometrySensor {
    pub fn new(noise: CorrelatedNormal) -> Self {
        Self { noise }
    }

    pub fn measure<R: Rng + ?Sized>(&self, command: &Odometry, rng: &mut R) -> Odometry {
        let n = self.noise.sample(rng);
        command + Odometry::new(n[0], n[1], n[2])
    }
}
