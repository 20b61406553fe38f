// ekfslam_sim/src/simulation/config/structs.rs

use ekfslam_core::config::SlamConfig;
use ekfslam_core::types::Pose;
use nalgebra::{DMatrix, Matrix3, Vector2};
use serde::{Deserialize, Serialize};

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a `scenario.toml` file. Every section is
/// optional; missing sections fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: Simulation,
    /// Settings handed straight to the estimator.
    #[serde(default)]
    pub filter: SlamConfig,
    #[serde(default)]
    pub robot: Robot,
    #[serde(default)]
    pub sensor: Sensor,
    #[serde(default)]
    pub world: World,
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections in a scenario file.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Simulation {
    /// Seed for the pseudo-random number generator, for determinism.
    pub seed: u64,
    /// Number of predict/update cycles.
    pub steps: usize,
    /// Confidence level of the NEES/NIS consistency intervals.
    pub confidence: f64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: 0,
            steps: 200,
            confidence: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Robot {
    /// `[x, y, heading_deg]`; also the filter's initial estimate.
    pub initial_pose: [f64; 3],
    /// Standard deviations of the initial estimate `[x, y, heading_deg]`.
    pub initial_std: [f64; 3],
    /// Forward distance commanded per step (m).
    pub speed: f64,
    /// Heading change commanded per step (deg).
    pub turn_rate_deg: f64,
    /// True odometry noise covariance. The filter's `process_noise` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odometry_noise: Option<[[f64; 3]; 3]>,
}

impl Default for Robot {
    fn default() -> Self {
        Self {
            initial_pose: [0.0, 0.0, 0.0],
            initial_std: [0.01, 0.01, 0.1],
            speed: 0.5,
            turn_rate_deg: 2.0,
            odometry_noise: None,
        }
    }
}

impl Robot {
    pub fn pose(&self) -> Pose {
        let p = self.initial_pose;
        Pose::new(p[0], p[1], p[2].to_radians())
    }

    pub fn pose_covariance(&self) -> Matrix3<f64> {
        let s = self.initial_std;
        Matrix3::from_diagonal(&nalgebra::Vector3::new(
            s[0].powi(2),
            s[1].powi(2),
            s[2].to_radians().powi(2),
        ))
    }

    pub fn command(&self) -> ekfslam_core::types::Odometry {
        ekfslam_core::types::Odometry::new(self.speed, 0.0, self.turn_rate_deg.to_radians())
    }

    /// The covariance the true odometry noise is drawn from.
    pub fn odometry_noise(&self, filter: &SlamConfig) -> DMatrix<f64> {
        let q = self.odometry_noise.unwrap_or(filter.process_noise);
        DMatrix::from_fn(3, 3, |r, c| q[r][c])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sensor {
    /// Landmarks farther than this are not detected (m).
    pub max_range: f64,
    /// Full angular width of the sensor cone (deg).
    pub field_of_view_deg: f64,
    /// True noise `[range_std, bearing_std_deg]`. Drawn from the filter's
    /// `measurement_noise` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_std: Option<[f64; 2]>,
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            max_range: 10.0,
            field_of_view_deg: 360.0,
            noise_std: None,
        }
    }
}

impl Sensor {
    pub fn noise_covariance(&self, filter: &SlamConfig) -> DMatrix<f64> {
        match self.noise_std {
            Some([range_std, bearing_std_deg]) => DMatrix::from_diagonal(
                &nalgebra::DVector::from_vec(vec![
                    range_std.powi(2),
                    bearing_std_deg.to_radians().powi(2),
                ]),
            ),
            None => {
                let r = filter.measurement_noise;
                DMatrix::from_fn(2, 2, |i, j| r[i][j])
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct World {
    /// True landmark positions `[x, y]`.
    pub landmarks: Vec<[f64; 2]>,
}

impl World {
    pub fn landmark_positions(&self) -> Vec<Vector2<f64>> {
        self.landmarks
            .iter()
            .map(|p| Vector2::new(p[0], p[1]))
            .collect()
    }
}
