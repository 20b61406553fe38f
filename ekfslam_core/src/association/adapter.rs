// ekfslam_core/src/association/adapter.rs

use log::trace;
use nalgebra::{DMatrix, DVector};

use super::{Assignment, AssociationGates, DataAssociator};
use crate::error::{SlamError, SlamResult};
use crate::types::LANDMARK_DIM;

/// The matched subset of a measurement batch.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociatedBatch {
    pub z: DVector<f64>,
    pub z_pred: DVector<f64>,
    pub h: DMatrix<f64>,
    pub s: DMatrix<f64>,
    pub assignment: Assignment,
}

impl AssociatedBatch {
    pub fn num_matched(&self) -> usize {
        self.z.len() / LANDMARK_DIM
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }
}

fn validate_assignment(
    assignment: &Assignment,
    num_measurements: usize,
    num_landmarks: usize,
) -> SlamResult<()> {
    if assignment.len() != num_measurements {
        return Err(SlamError::InvalidAssignment(format!(
            "expected {num_measurements} entries, got {}",
            assignment.len()
        )));
    }
    let mut claimed = vec![false; num_landmarks];
    for (i, entry) in assignment.iter().enumerate() {
        let Some(j) = *entry else { continue };
        if j >= num_landmarks {
            return Err(SlamError::InvalidAssignment(format!(
                "measurement {i} matched to landmark {j}, but only {num_landmarks} exist"
            )));
        }
        if std::mem::replace(&mut claimed[j], true) {
            return Err(SlamError::InvalidAssignment(format!(
                "landmark {j} matched more than once"
            )));
        }
    }
    Ok(())
}

fn pair_rows(idx: usize) -> [usize; 2] {
    [LANDMARK_DIM * idx, LANDMARK_DIM * idx + 1]
}

/// Runs `associator` and returns the matched measurements with the
/// corresponding rows of `z_pred` and `h` and the block of `s`.
///
/// Matched pairs keep measurement order.
pub fn associate(
    associator: &dyn DataAssociator,
    gates: AssociationGates,
    z: &DVector<f64>,
    z_pred: &DVector<f64>,
    h: &DMatrix<f64>,
    s: &DMatrix<f64>,
) -> SlamResult<AssociatedBatch> {
    if z.len() % LANDMARK_DIM != 0 {
        return Err(SlamError::OddMeasurementLength {
            stage: "associate: measurements",
            len: z.len(),
        });
    }
    if z_pred.len() % LANDMARK_DIM != 0 {
        return Err(SlamError::OddMeasurementLength {
            stage: "associate: predictions",
            len: z_pred.len(),
        });
    }
    let m = z_pred.len();
    if h.nrows() != m || s.nrows() != m || s.ncols() != m {
        return Err(SlamError::DimensionMismatch {
            stage: "associate: innovation covariance",
            state_dim: m,
            rows: s.nrows(),
            cols: s.ncols(),
        });
    }

    let num_measurements = z.len() / LANDMARK_DIM;
    let num_landmarks = m / LANDMARK_DIM;

    let assignment = associator.associate(z, z_pred, s, gates);
    validate_assignment(&assignment, num_measurements, num_landmarks)?;

    let mut z_rows = Vec::new();
    let mut pred_rows = Vec::new();
    for (i, j) in assignment
        .iter()
        .enumerate()
        .filter_map(|(i, a)| a.map(|j| (i, j)))
    {
        z_rows.extend(pair_rows(i));
        pred_rows.extend(pair_rows(j));
    }
    trace!(
        "associate: {} of {num_measurements} measurements matched against {num_landmarks} landmarks",
        z_rows.len() / LANDMARK_DIM
    );

    Ok(AssociatedBatch {
        z: z.select_rows(&z_rows),
        z_pred: z_pred.select_rows(&pred_rows),
        h: h.select_rows(&pred_rows),
        s: s.select_rows(&pred_rows).select_columns(&pred_rows),
        assignment,
    })
}

/// The stacked measurements that `assignment` left unmatched, in original order.
pub fn unmatched_measurements(z: &DVector<f64>, assignment: &Assignment) -> DVector<f64> {
    let rows: Vec<usize> = assignment
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_none())
        .flat_map(|(i, _)| pair_rows(i))
        .collect();
    z.select_rows(&rows)
}
