// ekfslam_sim/src/simulation/runner.rs

use log::{debug, info};
use nalgebra::Vector2;

use ekfslam_core::diagnostics::{compute_nees, ConsistencyReport, ConsistencyTracker, NeesBreakdown};
use ekfslam_core::mapping::LandmarkMap;
use ekfslam_core::prelude::*;

use crate::simulation::config::{ScenarioConfig, ScenarioError};
use crate::simulation::core::ground_truth::GroundTruthState;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::sensors::{CorrelatedNormal, OdometrySensor, RangeBearingSensor};

/// Diagnostics of a single predict/update cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub step: usize,
    pub nees: NeesBreakdown,
    pub nis: f64,
    pub nis_dof: usize,
    pub detections: usize,
    pub matched: usize,
    pub num_landmarks: usize,
    pub position_error: f64,
}

/// Summary of a whole run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub steps: Vec<StepRecord>,
    pub final_state: SlamState,
    pub truth: GroundTruthState,
    /// ANEES of `[total, position, heading]`.
    pub nees: [Option<ConsistencyReport>; 3],
    /// ANIS over all batches with at least one match.
    pub nis: Option<ConsistencyReport>,
    /// RMS distance from each true landmark to the closest mapped one, over
    /// the true landmarks that were ever in view.
    pub map_rmse: Option<f64>,
}

impl RunReport {
    pub fn final_position_error(&self) -> f64 {
        (self.final_state.pose().xy() - self.truth.pose.xy()).norm()
    }

    /// Logs the summary at `info` level.
    pub fn log(&self, name: &str) {
        info!(
            "[{name}] {} steps | landmarks mapped {} (true {}) | final pos err {:.3} m",
            self.steps.len(),
            self.final_state.num_landmarks(),
            self.truth.landmarks.len(),
            self.final_position_error()
        );
        for (label, report) in ["NEES", "NEES pos", "NEES heading"].iter().zip(&self.nees) {
            if let Some(r) = report {
                log_consistency(name, label, r);
            }
        }
        if let Some(r) = &self.nis {
            log_consistency(name, "NIS", r);
        }
        if let Some(rmse) = self.map_rmse {
            info!("[{name}] map RMSE {rmse:.3} m");
        }
    }
}

fn log_consistency(name: &str, label: &str, r: &ConsistencyReport) {
    info!(
        "[{name}] A{label} = {:.3}, CI ({:.3}, {:.3}) | {:.1}% of samples inside",
        r.average,
        r.average_interval.0,
        r.average_interval.1,
        100.0 * r.fraction_inside
    );
}

fn map_rmse(state: &SlamState, seen: &[Vector2<f64>]) -> Option<f64> {
    let map = LandmarkMap::from_state(state);
    if map.is_empty() || seen.is_empty() {
        return None;
    }
    let sum: f64 = seen
        .iter()
        .filter_map(|lm| map.nearest(lm))
        .map(|(_, d)| d * d)
        .sum();
    Some((sum / seen.len() as f64).sqrt())
}

/// Runs one scenario end to end: drive the ground truth, emulate the
/// sensors, feed the filter, and score it against the truth.
pub fn run_scenario(config: &ScenarioConfig) -> Result<RunReport, ScenarioError> {
    config.validate()?;
    let mut rng = SimulationRng::from_seed(config.simulation.seed);

    // --- 1. Build the world and sensors ---
    let mut truth = GroundTruthState::new(config.robot.pose(), config.world.landmark_positions());
    let odometry = OdometrySensor::new(CorrelatedNormal::new(
        config.robot.odometry_noise(&config.filter),
    )?);
    let sensor_model = RangeBearingModel::new(config.filter.offset(), config.filter.r_matrix());
    let sensor = RangeBearingSensor::new(
        sensor_model.clone(),
        config.sensor.max_range,
        config.sensor.field_of_view_deg,
        CorrelatedNormal::new(config.sensor.noise_covariance(&config.filter))?,
    );
    let command = config.robot.command();

    // --- 2. Build the filter ---
    let initial = SlamState::new(config.robot.pose(), config.robot.pose_covariance());
    let mut filter = SlamFilter::new(initial, EkfSlam::new(config.filter.clone())?)?;

    let confidence = config.simulation.confidence;
    // One tracker per sub-state, in `NeesBreakdown` order.
    let mut nees: [ConsistencyTracker; 3] =
        std::array::from_fn(|_| ConsistencyTracker::new(confidence));
    let mut nis = ConsistencyTracker::new(confidence);
    let mut seen = vec![false; truth.landmarks.len()];
    let mut steps = Vec::with_capacity(config.simulation.steps);

    // --- 3. Main loop ---
    for step in 0..config.simulation.steps {
        truth.advance(&command);
        let u = odometry.measure(&command, &mut rng.0);
        filter.process(&SlamInput::Odometry(&u))?;

        for (flag, lm) in seen.iter_mut().zip(&truth.landmarks) {
            *flag |= sensor.in_view(&sensor_model.observe(&truth.pose, lm));
        }
        let detections = sensor.detect(&truth.pose, &truth.landmarks, &mut rng.0);
        filter.process(&SlamInput::Detections(&detections))?;

        let state = filter.get_state();
        let step_nees = compute_nees(&state.pose(), &state.pose_covariance(), &truth.pose);
        for ((tracker, value), dof) in nees
            .iter_mut()
            .zip(step_nees.as_array())
            .zip(NeesBreakdown::DOF)
        {
            tracker.record(value, dof);
        }

        let (step_nis, nis_dof, matched) = filter.last_update().map_or((1.0, 0, 0), |s| {
            (
                s.nis,
                s.nis_dof,
                s.assignment.iter().filter(|a| a.is_some()).count(),
            )
        });
        nis.record(step_nis, nis_dof);

        let record = StepRecord {
            step,
            nees: step_nees,
            nis: step_nis,
            nis_dof,
            detections: detections.len(),
            matched,
            num_landmarks: state.num_landmarks(),
            position_error: (state.pose().xy() - truth.pose.xy()).norm(),
        };
        debug!(
            "step {:>4}: {} det, {} matched, {} lm | NEES {:.2} | NIS {:.2} ({} dof) | pos err {:.3}",
            record.step,
            record.detections,
            record.matched,
            record.num_landmarks,
            record.nees.total,
            record.nis,
            record.nis_dof,
            record.position_error
        );
        steps.push(record);
    }

    // --- 4. Score ---
    let final_state = filter.get_state().clone();
    let seen_landmarks: Vec<Vector2<f64>> = truth
        .landmarks
        .iter()
        .zip(&seen)
        .filter(|(_, s)| **s)
        .map(|(lm, _)| *lm)
        .collect();

    Ok(RunReport {
        steps,
        map_rmse: map_rmse(&final_state, &seen_landmarks),
        nees: nees.map(|tracker| tracker.report()),
        nis: nis.report(),
        final_state,
        truth,
    })
}
