// ekfslam_core/src/utils/linalg.rs

use nalgebra::{Cholesky, DMatrix, Matrix2, SymmetricEigen};

use crate::error::{SlamError, SlamResult};

/// Absolute tolerance used by the symmetry check (numpy `allclose` defaults).
pub const SYMMETRY_ATOL: f64 = 1e-8;
/// Relative tolerance used by the symmetry check.
pub const SYMMETRY_RTOL: f64 = 1e-5;
/// Eigenvalues down to `-EIGEN_TOL * max(1, |largest diagonal|)` count as zero.
pub const EIGEN_TOL: f64 = 1e-9;

/// Largest absolute difference between `m` and its transpose.
pub fn max_asymmetry(m: &DMatrix<f64>) -> f64 {
    let n = m.nrows();
    let mut worst = 0.0_f64;
    for i in 0..n {
        for j in (i + 1)..n {
            worst = worst.max((m[(i, j)] - m[(j, i)]).abs());
        }
    }
    worst
}

/// Symmetry within `allclose(m, m^T)` tolerances.
pub fn is_symmetric(m: &DMatrix<f64>) -> bool {
    if !m.is_square() {
        return false;
    }
    let n = m.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (m[(i, j)], m[(j, i)]);
            if (a - b).abs() > SYMMETRY_ATOL + SYMMETRY_RTOL * b.abs() {
                return false;
            }
        }
    }
    true
}

/// Smallest eigenvalue of the symmetric part of `m`.
pub fn min_eigenvalue(m: &DMatrix<f64>) -> f64 {
    if m.nrows() == 0 {
        return 0.0;
    }
    let sym = (m + m.transpose()) * 0.5;
    SymmetricEigen::new(sym).eigenvalues.min()
}

/// Checks that `m` is square, symmetric and positive semi-definite.
///
/// With `strict` set the matrix must also admit a Cholesky factorization,
/// i.e. be positive definite.
pub fn check_covariance(m: &DMatrix<f64>, stage: &'static str, strict: bool) -> SlamResult<()> {
    if !m.is_square() {
        return Err(SlamError::DimensionMismatch {
            stage,
            state_dim: m.nrows(),
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    if m.iter().any(|v| !v.is_finite()) || !is_symmetric(m) {
        return Err(SlamError::NotSymmetric {
            stage,
            max_asymmetry: max_asymmetry(m),
        });
    }

    let scale = m.diagonal().amax().max(1.0);
    let min_eig = min_eigenvalue(m);
    if min_eig < -EIGEN_TOL * scale {
        return Err(SlamError::NotPositiveSemiDefinite {
            stage,
            min_eigenvalue: min_eig,
        });
    }
    if strict && Cholesky::new(m.clone()).is_none() {
        return Err(SlamError::NotPositiveDefinite { stage });
    }
    Ok(())
}

/// Block-diagonal matrix with `blocks` copies of `block` on the diagonal.
pub fn repeat_block_diag(block: &Matrix2<f64>, blocks: usize) -> DMatrix<f64> {
    DMatrix::<f64>::identity(blocks, blocks).kronecker(block)
}
