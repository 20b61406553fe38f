// ekfslam_core/src/diagnostics/tracker.rs

use super::chi2::chi2_interval;

/// Summary of a sequence of normalized squared errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsistencyReport {
    pub samples: usize,
    /// Mean of the recorded statistics (ANEES / ANIS).
    pub average: f64,
    /// Interval the average should fall in for a consistent filter.
    pub average_interval: (f64, f64),
    /// Share of samples inside their own per-sample interval.
    pub fraction_inside: f64,
}

/// Accumulates NEES or NIS samples and tests them against chi-square bounds.
///
/// Samples recorded with zero DOF are sentinels and are ignored.
#[derive(Debug, Clone)]
pub struct ConsistencyTracker {
    confidence: f64,
    samples: Vec<(f64, usize)>,
}

impl ConsistencyTracker {
    pub fn new(confidence: f64) -> Self {
        Self {
            confidence,
            samples: Vec::new(),
        }
    }

    pub fn record(&mut self, value: f64, dof: usize) {
        if dof > 0 && value.is_finite() {
            self.samples.push((value, dof));
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn report(&self) -> Option<ConsistencyReport> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len();
        let n_f = n as f64;

        let total: f64 = self.samples.iter().map(|(v, _)| v).sum();
        let total_dof: usize = self.samples.iter().map(|(_, d)| d).sum();
        let (lo, hi) = chi2_interval(total_dof, self.confidence);

        let inside = self
            .samples
            .iter()
            .filter(|(value, dof)| {
                let (lo, hi) = chi2_interval(*dof, self.confidence);
                (lo..=hi).contains(value)
            })
            .count();

        Some(ConsistencyReport {
            samples: n,
            average: total / n_f,
            average_interval: (lo / n_f, hi / n_f),
            fraction_inside: inside as f64 / n_f,
        })
    }
}
