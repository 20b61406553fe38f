// ekfslam_sim/src/simulation/sensors/noise.rs

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::simulation::config::ScenarioError;

/// Zero-mean Gaussian with a full covariance, sampled as `L·n`, `n ~ N(0, I)`.
///
/// `L` is the Cholesky factor when the covariance is definite and the
/// eigen-decomposition square root otherwise, so singular (e.g. all-zero)
/// covariances are accepted.
#[derive(Debug, Clone)]
pub struct CorrelatedNormal {
    sqrt: DMatrix<f64>,
}

impl CorrelatedNormal {
    pub fn new(covariance: DMatrix<f64>) -> Result<Self, ScenarioError> {
        if let Some(chol) = covariance.clone().cholesky() {
            return Ok(Self { sqrt: chol.l() });
        }

        let eigen = SymmetricEigen::new(covariance);
        let scale = eigen.eigenvalues.amax().max(1.0);
        if eigen.eigenvalues.iter().any(|&l| l < -1e-12 * scale) {
            return Err(ScenarioError::Invalid(format!(
                "noise covariance is not positive semi-definite (eigenvalues {})",
                eigen.eigenvalues.transpose()
            )));
        }
        let root = eigen.eigenvalues.map(|l| l.max(0.0).sqrt());
        let sqrt = &eigen.eigenvectors * DMatrix::from_diagonal(&root);
        Ok(Self { sqrt })
    }

    pub fn dim(&self) -> usize {
        self.sqrt.nrows()
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DVector<f64> {
        let n: DVector<f64> = DVector::from_fn(self.dim(), |_, _| StandardNormal.sample(rng));
        &self.sqrt * n
    }
}
