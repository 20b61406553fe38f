// ekfslam_core/src/state.rs

use nalgebra::{DMatrix, DVector, Matrix2, Matrix3, Vector2};

use crate::error::{SlamError, SlamResult};
use crate::types::{landmark_offset, landmarks_in, Pose, POSE_DIM};
use crate::utils::geometry::wrap_to_pi;
use crate::utils::linalg::check_covariance;

/// An enum naming every variable that can exist in the joint SLAM state vector.
///
/// Landmarks carry no identity beyond their insertion index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    // --- Robot pose (world frame) ---
    X,
    Y,
    Heading,
    // --- Landmark positions (world frame) ---
    LandmarkX(usize),
    LandmarkY(usize),
}

/// The joint estimate `(η, P)` passed through every predict/update cycle.
///
/// The vector holds the robot pose followed by the landmark positions in
/// insertion order; the covariance is the matching square matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SlamState {
    /// The joint state vector `η = [x, y, ψ, m1x, m1y, ...]`.
    pub vector: DVector<f64>,
    /// The joint covariance `P`.
    pub covariance: DMatrix<f64>,
}

impl SlamState {
    /// Creates a state with no landmarks from a pose and its 3x3 covariance.
    pub fn new(pose: Pose, pose_covariance: Matrix3<f64>) -> Self {
        let mut vector = DVector::zeros(POSE_DIM);
        vector[0] = pose.x;
        vector[1] = pose.y;
        vector[2] = wrap_to_pi(pose.z);

        let mut covariance = DMatrix::zeros(POSE_DIM, POSE_DIM);
        covariance.copy_from(&pose_covariance);

        Self { vector, covariance }
    }

    /// Builds a state from raw parts, checking only the shape rules.
    pub fn from_parts(vector: DVector<f64>, covariance: DMatrix<f64>) -> SlamResult<Self> {
        let state = Self { vector, covariance };
        state.check_shape("SlamState::from_parts")?;
        Ok(state)
    }

    /// Returns the dimension of the joint state vector.
    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    pub fn num_landmarks(&self) -> usize {
        landmarks_in(self.dim()).unwrap_or(0)
    }

    /// The robot pose `[x, y, ψ]`.
    pub fn pose(&self) -> Pose {
        self.vector.fixed_rows::<3>(0).into_owned()
    }

    /// The 3x3 robot pose covariance block.
    pub fn pose_covariance(&self) -> Matrix3<f64> {
        self.covariance
            .fixed_view::<3, 3>(0, 0)
            .into_owned()
    }

    /// Position of landmark `idx`, if it exists.
    pub fn landmark(&self, idx: usize) -> Option<Vector2<f64>> {
        if idx >= self.num_landmarks() {
            return None;
        }
        Some(self.vector.fixed_rows::<2>(landmark_offset(idx)).into_owned())
    }

    /// The 2x2 covariance block of landmark `idx`, if it exists.
    pub fn landmark_covariance(&self, idx: usize) -> Option<Matrix2<f64>> {
        if idx >= self.num_landmarks() {
            return None;
        }
        let base = landmark_offset(idx);
        Some(self.covariance.fixed_view::<2, 2>(base, base).into_owned())
    }

    /// Iterates over all landmark positions in insertion order.
    pub fn landmarks(&self) -> impl Iterator<Item = Vector2<f64>> + '_ {
        (0..self.num_landmarks()).map(move |i| {
            self.vector
                .fixed_rows::<2>(landmark_offset(i))
                .into_owned()
        })
    }

    /// The ordered "schema" of the state vector.
    pub fn layout(&self) -> Vec<StateVariable> {
        let mut layout = vec![StateVariable::X, StateVariable::Y, StateVariable::Heading];
        for i in 0..self.num_landmarks() {
            layout.push(StateVariable::LandmarkX(i));
            layout.push(StateVariable::LandmarkY(i));
        }
        layout
    }

    /// Finds the index of a specific `StateVariable` in the layout.
    pub fn find_idx(&self, var: &StateVariable) -> Option<usize> {
        let idx = match *var {
            StateVariable::X => 0,
            StateVariable::Y => 1,
            StateVariable::Heading => 2,
            StateVariable::LandmarkX(i) => landmark_offset(i),
            StateVariable::LandmarkY(i) => landmark_offset(i) + 1,
        };
        (idx < self.dim()).then_some(idx)
    }

    /// Verifies `len(η) = 3 + 2L` and that `P` is `len(η) x len(η)`.
    pub fn check_shape(&self, stage: &'static str) -> SlamResult<()> {
        let (rows, cols) = self.covariance.shape();
        if rows != self.dim() || cols != self.dim() {
            return Err(SlamError::DimensionMismatch {
                stage,
                state_dim: self.dim(),
                rows,
                cols,
            });
        }
        if landmarks_in(self.dim()).is_none() {
            return Err(SlamError::MalformedState {
                stage,
                len: self.dim(),
            });
        }
        Ok(())
    }

    /// Full invariant gate: shape, symmetry and (semi-)definiteness of `P`.
    pub fn check_consistency(&self, stage: &'static str, require_definite: bool) -> SlamResult<()> {
        self.check_shape(stage)?;
        check_covariance(&self.covariance, stage, require_definite)
    }
}

impl Default for SlamState {
    fn default() -> Self {
        Self::new(Pose::zeros(), Matrix3::zeros())
    }
}
