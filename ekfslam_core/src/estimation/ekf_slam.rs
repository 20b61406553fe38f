// ekfslam_core/src/estimation/ekf_slam.rs

use log::{debug, trace, warn};
use nalgebra::{DMatrix, Matrix3};

use crate::association::{
    associate, unmatched_measurements, AssociatedBatch, Assignment, DataAssociator,
    GatedNearestNeighbor,
};
use crate::config::SlamConfig;
use crate::diagnostics::{compute_nis, NEUTRAL_STATISTIC};
use crate::error::{SlamError, SlamResult};
use crate::mapping::add_landmarks;
use crate::models::dynamics::{MotionModel, OdometryMotion};
use crate::models::measurement::{LandmarkMeasurement, RangeBearingModel};
use crate::state::SlamState;
use crate::types::{flatten_detections, Odometry, RangeBearing, LANDMARK_DIM, POSE_DIM};
use crate::utils::geometry::{wrap_bearings_in_place, wrap_to_pi};
use crate::utils::linalg::repeat_block_diag;

/// Everything a measurement update produces besides the new estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// The corrected (and possibly augmented) state.
    pub state: SlamState,
    /// NIS of the matched innovation, or [`NEUTRAL_STATISTIC`] when nothing matched.
    pub nis: f64,
    /// Degrees of freedom of `nis` (`2 x matched`), zero for the sentinel.
    pub nis_dof: usize,
    /// Per detection, the landmark it was matched to before augmentation.
    pub assignment: Assignment,
}

/// The EKF-SLAM orchestrator.
///
/// Holds the models and settings only; every call takes the current state and
/// returns a new one, so the caller decides where the estimate lives.
#[derive(Debug, Clone)]
pub struct EkfSlam {
    config: SlamConfig,
    q: Matrix3<f64>,
    motion: Box<dyn MotionModel>,
    sensor: Box<dyn LandmarkMeasurement>,
    associator: Box<dyn DataAssociator>,
}

impl EkfSlam {
    /// Builds a filter with the odometry motion model, the range-bearing
    /// sensor described by `config`, and gated nearest-neighbour association.
    pub fn new(config: SlamConfig) -> SlamResult<Self> {
        config.validate()?;
        let sensor = RangeBearingModel::new(config.offset(), config.r_matrix());
        Ok(Self {
            q: config.q_matrix(),
            motion: Box::new(OdometryMotion),
            sensor: Box::new(sensor),
            associator: Box::new(GatedNearestNeighbor),
            config,
        })
    }

    /// Replaces the association oracle.
    pub fn with_associator(mut self, associator: Box<dyn DataAssociator>) -> Self {
        self.associator = associator;
        self
    }

    pub fn config(&self) -> &SlamConfig {
        &self.config
    }

    pub fn measurement_model(&self) -> &dyn LandmarkMeasurement {
        self.sensor.as_ref()
    }

    // --- Prediction ---

    /// Propagates the pose with `odometry` and updates only the pose rows and
    /// columns of `P`. Landmarks are static, so their block is untouched.
    pub fn predict(&self, state: &SlamState, odometry: &Odometry) -> SlamResult<SlamState> {
        state.check_consistency("EkfSlam::predict: input", false)?;

        let n = state.dim();
        let pose = state.pose();

        // 1. Linearize around the prior pose.
        let (fx, fu) = self.motion.calculate_jacobian(&pose, odometry);

        // 2. Move the pose.
        let mut predicted = state.clone();
        let pose_pred = self.motion.predict_pose(&pose, odometry);
        predicted
            .vector
            .fixed_rows_mut::<3>(0)
            .copy_from(&pose_pred);

        // 3. Pose block: Fx P_xx Fxᵀ + Fu Q Fuᵀ.
        let p = &state.covariance;
        let p_pose: Matrix3<f64> = p.fixed_view::<3, 3>(0, 0).into_owned();
        let p_pose_pred = fx * p_pose * fx.transpose() + fu * self.q * fu.transpose();
        predicted
            .covariance
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&p_pose_pred);

        // 4. Pose-map cross blocks: Fx P_xm, mirrored.
        if n > POSE_DIM {
            let map_dim = n - POSE_DIM;
            let cross = fx * p.view((0, POSE_DIM), (POSE_DIM, map_dim));
            predicted
                .covariance
                .view_mut((0, POSE_DIM), (POSE_DIM, map_dim))
                .copy_from(&cross);
            predicted
                .covariance
                .view_mut((POSE_DIM, 0), (map_dim, POSE_DIM))
                .copy_from(&cross.transpose());
        }

        predicted.check_consistency("EkfSlam::predict: output", true)?;
        Ok(predicted)
    }

    // --- Update ---

    /// Fuses one batch of detections.
    ///
    /// 1. Predict measurements and `H` for every known landmark.
    /// 2. Let the associator pick matches; extract the matched rows.
    /// 3. Joseph-form correction with the matched subset.
    /// 4. Append landmarks for the unmatched detections.
    ///
    /// With association disabled the map is frozen: no correction, no growth.
    pub fn update(
        &self,
        state: &SlamState,
        detections: &[RangeBearing],
    ) -> SlamResult<UpdateOutcome> {
        state.check_consistency("EkfSlam::update: input", false)?;

        let z = flatten_detections(detections);
        let unmatched_only = |state: &SlamState| UpdateOutcome {
            state: state.clone(),
            nis: NEUTRAL_STATISTIC,
            nis_dof: 0,
            assignment: vec![None; detections.len()],
        };

        let mut outcome = if detections.is_empty()
            || state.num_landmarks() == 0
            || !self.config.do_association
        {
            unmatched_only(state)
        } else {
            let z_pred = self.sensor.predict_measurements(state);
            let h = self.sensor.calculate_jacobian(state)?;
            let big_r = repeat_block_diag(self.sensor.get_r(), state.num_landmarks());
            let s = &h * &state.covariance * h.transpose() + big_r;

            let batch = associate(
                self.associator.as_ref(),
                self.config.alphas.into(),
                &z,
                &z_pred,
                &h,
                &s,
            )?;

            if batch.is_empty() {
                warn!(
                    "EkfSlam::update: 0 of {} detection(s) matched {} landmark(s), no correction",
                    detections.len(),
                    state.num_landmarks()
                );
                let mut outcome = unmatched_only(state);
                outcome.assignment = batch.assignment;
                outcome
            } else {
                self.correct(state, batch)?
            }
        };

        if self.config.do_association {
            let new_z = unmatched_measurements(&z, &outcome.assignment);
            if !new_z.is_empty() {
                debug!(
                    "EkfSlam::update: initializing {} landmark(s)",
                    new_z.len() / LANDMARK_DIM
                );
                outcome.state = add_landmarks(&outcome.state, &new_z, self.sensor.as_ref())?;
            }
        }

        outcome
            .state
            .check_consistency("EkfSlam::update: output", false)?;
        Ok(outcome)
    }

    /// Kalman correction with the matched measurements.
    fn correct(&self, state: &SlamState, batch: AssociatedBatch) -> SlamResult<UpdateOutcome> {
        let n = state.dim();
        let matched = batch.num_matched();
        let p = &state.covariance;

        // 1. Innovation, bearings wrapped.
        let mut v = &batch.z - &batch.z_pred;
        wrap_bearings_in_place(&mut v);

        // 2. Gain W = P Hᵀ S⁻¹, via W = (S⁻¹ H P)ᵀ with S symmetric.
        let chol = batch
            .s
            .clone()
            .cholesky()
            .ok_or(SlamError::SingularInnovation { size: batch.s.nrows() })?;
        let w = chol.solve(&(&batch.h * p)).transpose();

        // 3. Mean.
        let mut vector = &state.vector + &w * &v;
        vector[2] = wrap_to_pi(vector[2]);

        // 4. Joseph form: (I - WH) P (I - WH)ᵀ + W R Wᵀ.
        let i_wh = DMatrix::<f64>::identity(n, n) - &w * &batch.h;
        let r_matched = repeat_block_diag(self.sensor.get_r(), matched);
        let covariance = &i_wh * p * i_wh.transpose() + &w * r_matched * w.transpose();

        let corrected = SlamState { vector, covariance };
        corrected.check_consistency("EkfSlam::update: after correction", false)?;

        let nis = compute_nis(&v, &batch.s);
        trace!("EkfSlam::update: {matched} matched, NIS {nis:.3}");

        Ok(UpdateOutcome {
            state: corrected,
            nis,
            nis_dof: LANDMARK_DIM * matched,
            assignment: batch.assignment,
        })
    }
}
