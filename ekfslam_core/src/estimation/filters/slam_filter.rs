// ekfslam_core/src/estimation/filters/slam_filter.rs

use crate::association::Assignment;
use crate::error::SlamResult;
use crate::estimation::{EkfSlam, StateEstimator, UpdateOutcome};
use crate::messages::SlamInput;
use crate::state::SlamState;

/// Diagnostics kept from the most recent measurement update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSummary {
    pub nis: f64,
    pub nis_dof: usize,
    pub assignment: Assignment,
}

/// A stateful EKF-SLAM filter: owns the current estimate and feeds it through
/// an [`EkfSlam`] on every input.
#[derive(Debug, Clone)]
pub struct SlamFilter {
    /// The current joint estimate.
    state: SlamState,
    ekf: EkfSlam,
    last_update: Option<UpdateSummary>,
}

impl SlamFilter {
    /// Creates a filter from an initial estimate. The estimate must satisfy
    /// the state invariants.
    pub fn new(initial_state: SlamState, ekf: EkfSlam) -> SlamResult<Self> {
        initial_state.check_consistency("SlamFilter::new", false)?;
        Ok(Self {
            state: initial_state,
            ekf,
            last_update: None,
        })
    }

    pub fn ekf(&self) -> &EkfSlam {
        &self.ekf
    }

    /// NIS, DOF and assignment of the last `Detections` input, if any.
    pub fn last_update(&self) -> Option<&UpdateSummary> {
        self.last_update.as_ref()
    }
}

// --- The Public Trait Implementation ---
impl StateEstimator for SlamFilter {
    fn process(&mut self, input: &SlamInput) -> SlamResult<()> {
        match input {
            SlamInput::Odometry(u) => {
                self.state = self.ekf.predict(&self.state, u)?;
            }
            SlamInput::Detections(detections) => {
                let UpdateOutcome {
                    state,
                    nis,
                    nis_dof,
                    assignment,
                } = self.ekf.update(&self.state, detections)?;
                self.state = state;
                self.last_update = Some(UpdateSummary {
                    nis,
                    nis_dof,
                    assignment,
                });
            }
        }
        Ok(())
    }

    fn get_state(&self) -> &SlamState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlamConfig;
    use crate::error::SlamError;
    use crate::types::{Odometry, RangeBearing};
    use nalgebra::{Matrix3, Vector3};

    fn filter() -> SlamFilter {
        let initial = SlamState::new(Vector3::zeros(), Matrix3::identity() * 0.01);
        SlamFilter::new(initial, EkfSlam::new(SlamConfig::default()).unwrap()).unwrap()
    }

    #[test]
    fn alternating_inputs_build_a_map() {
        let mut filter = filter();
        let u = Odometry::new(0.5, 0.0, 0.05);
        let detections = [RangeBearing::new(4.0, 0.5)];

        filter.process(&SlamInput::Odometry(&u)).unwrap();
        filter.process(&SlamInput::Detections(&detections)).unwrap();
        assert_eq!(filter.get_state().num_landmarks(), 1);
        assert_eq!(filter.last_update().unwrap().assignment, vec![None]);

        filter.process(&SlamInput::Odometry(&u)).unwrap();
        let z = filter
            .ekf()
            .measurement_model()
            .predict_measurements(filter.get_state());
        let again = [RangeBearing::new(z[0], z[1])];
        filter.process(&SlamInput::Detections(&again)).unwrap();

        let summary = filter.last_update().unwrap();
        assert_eq!(summary.assignment, vec![Some(0)]);
        assert_eq!(summary.nis_dof, 2);
        assert_eq!(filter.get_state().num_landmarks(), 1);
    }

    #[test]
    fn rejects_malformed_initial_state() {
        let bad = SlamState {
            vector: nalgebra::DVector::zeros(4),
            covariance: nalgebra::DMatrix::zeros(4, 4),
        };
        let ekf = EkfSlam::new(SlamConfig::default()).unwrap();
        assert!(SlamFilter::new(bad, ekf).is_err());
    }

    #[test]
    fn failed_update_keeps_previous_estimate() {
        let mut filter = filter();
        filter
            .process(&SlamInput::Detections(&[RangeBearing::new(2.0, 0.0)]))
            .unwrap();
        filter.process(&SlamInput::Odometry(&Odometry::zeros())).unwrap();

        let snapshot = filter.get_state().clone();
        let summary = filter.last_update().cloned();
        // A zero-range detection would put a new landmark on top of the sensor.
        let on_sensor = [RangeBearing::new(0.0, 0.0)];
        assert!(matches!(
            filter.process(&SlamInput::Detections(&on_sensor)),
            Err(SlamError::DegenerateGeometry { landmark: 1, .. })
        ));
        assert_eq!(filter.get_state(), &snapshot);
        assert_eq!(filter.last_update().cloned(), summary);
    }
}
