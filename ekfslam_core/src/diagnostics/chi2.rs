// ekfslam_core/src/diagnostics/chi2.rs

//! Chi-square quantiles for gating and consistency bounds.

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// The value exceeded with probability `alpha` by a chi-square variable with `dof` DOF.
///
/// `alpha` at or above 1 saturates to 0, and at or below 0 (or NaN) to infinity.
pub fn chi2_upper_quantile(dof: usize, alpha: f64) -> f64 {
    if dof == 0 || alpha >= 1.0 {
        return 0.0;
    }
    if alpha.is_nan() || alpha <= 0.0 {
        return f64::INFINITY;
    }

    ChiSquared::new(dof as f64).map_or(f64::NAN, |chi| chi.inverse_cdf(1.0 - alpha))
}

/// Two-sided interval containing a chi-square variable with probability `confidence`.
pub fn chi2_interval(dof: usize, confidence: f64) -> (f64, f64) {
    let tail = 0.5 * (1.0 - confidence);
    (
        chi2_upper_quantile(dof, 1.0 - tail),
        chi2_upper_quantile(dof, tail),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn upper_quantiles_match_tables() {
        assert_relative_eq!(chi2_upper_quantile(1, 0.05), 3.841458821, epsilon = 1e-6);
        assert_relative_eq!(chi2_upper_quantile(2, 0.05), 5.991464547, epsilon = 1e-6);
        assert_relative_eq!(chi2_upper_quantile(3, 0.05), 7.814727903, epsilon = 1e-6);
        assert_relative_eq!(chi2_upper_quantile(4, 0.05), 9.487729037, epsilon = 1e-6);
        assert_relative_eq!(chi2_upper_quantile(6, 0.01), 16.81189383, epsilon = 1e-6);
        assert_relative_eq!(chi2_upper_quantile(10, 0.001), 29.58829845, epsilon = 1e-6);
    }

    #[test]
    fn interval_brackets_the_mean() {
        let (lo, hi) = chi2_interval(2, 0.95);
        assert_relative_eq!(lo, 0.05063561596, epsilon = 1e-6);
        assert_relative_eq!(hi, 7.377758908, epsilon = 1e-6);
        for dof in [1, 3, 8, 40, 400] {
            let (lo, hi) = chi2_interval(dof, 0.9);
            assert!(lo < dof as f64 && (dof as f64) < hi, "dof {dof}: ({lo}, {hi})");
        }
    }

    #[test]
    fn degenerate_arguments_saturate() {
        assert_eq!(chi2_upper_quantile(0, 0.05), 0.0);
        assert_eq!(chi2_upper_quantile(4, 1.0), 0.0);
        assert!(chi2_upper_quantile(4, 0.0).is_infinite());
        assert!(chi2_upper_quantile(4, f64::NAN).is_infinite());
    }
}
