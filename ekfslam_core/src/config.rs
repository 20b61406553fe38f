// ekfslam_core/src/config.rs

use nalgebra::{DMatrix, Matrix2, Matrix3, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::{SlamError, SlamResult};
use crate::utils::linalg::check_covariance;

/// # SlamConfig
/// Construction-time settings of the estimator. Fixed for the filter's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct SlamConfig {
    /// Odometry noise covariance `Q` (3x3, row-major).
    pub process_noise: [[f64; 3]; 3],
    /// Per-landmark range-bearing noise covariance `R` (2x2, row-major).
    pub measurement_noise: [[f64; 2]; 2],
    /// Run the association oracle and grow the map with unmatched detections.
    #[serde(default = "default_do_association")]
    pub do_association: bool,
    /// Significance levels `[joint, individual]` handed to the association oracle.
    #[serde(default = "default_alphas")]
    pub alphas: [f64; 2],
    /// Sensor position in the robot body frame.
    #[serde(default)]
    pub sensor_offset: [f64; 2],
}

fn default_do_association() -> bool {
    true
}

fn default_alphas() -> [f64; 2] {
    [0.001, 0.0001]
}

impl Default for SlamConfig {
    fn default() -> Self {
        Self {
            process_noise: [[0.01, 0.0, 0.0], [0.0, 0.01, 0.0], [0.0, 0.0, 0.001]],
            measurement_noise: [[0.01, 0.0], [0.0, 0.0004]],
            do_association: default_do_association(),
            alphas: default_alphas(),
            sensor_offset: [0.0, 0.0],
        }
    }
}

impl SlamConfig {
    pub fn q_matrix(&self) -> Matrix3<f64> {
        let q = &self.process_noise;
        Matrix3::new(
            q[0][0], q[0][1], q[0][2], //
            q[1][0], q[1][1], q[1][2], //
            q[2][0], q[2][1], q[2][2],
        )
    }

    pub fn r_matrix(&self) -> Matrix2<f64> {
        let r = &self.measurement_noise;
        Matrix2::new(r[0][0], r[0][1], r[1][0], r[1][1])
    }

    pub fn offset(&self) -> Vector2<f64> {
        Vector2::new(self.sensor_offset[0], self.sensor_offset[1])
    }

    /// Rejects noise models that are not symmetric PSD and significance levels outside (0, 1).
    pub fn validate(&self) -> SlamResult<()> {
        let q = DMatrix::from_column_slice(3, 3, self.q_matrix().as_slice());
        check_covariance(&q, "SlamConfig: process_noise", false)
            .map_err(|e| SlamError::InvalidConfig(e.to_string()))?;

        let r = DMatrix::from_column_slice(2, 2, self.r_matrix().as_slice());
        check_covariance(&r, "SlamConfig: measurement_noise", false)
            .map_err(|e| SlamError::InvalidConfig(e.to_string()))?;

        for (name, alpha) in ["joint", "individual"].iter().zip(self.alphas) {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(SlamError::InvalidConfig(format!(
                    "{name} significance level {alpha} must lie in (0, 1)"
                )));
            }
        }

        if self.sensor_offset.iter().any(|v| !v.is_finite()) {
            return Err(SlamError::InvalidConfig(
                "sensor_offset must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
