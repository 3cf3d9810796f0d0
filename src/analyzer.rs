//! Sample analyzer: raw timings in, immutable summary out
//!
//! [`TimingStats::from_raw`] runs the full pipeline: validity partition,
//! MAD outlier rejection, then descriptive statistics over the cleaned
//! subset. Zero valid samples is not an error; it produces the all-NaN
//! record so downstream consumers can render "no data" uniformly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::outliers;
use crate::stats;

/// 95% two-tailed z quantile, the fixed level for `ci_95`.
const Z_95: f64 = 1.960;

/// Immutable statistical summary of one task's timing samples.
///
/// All durations are nanoseconds. Percentiles, mean, and spread are computed
/// over the outlier-cleaned subset; `raw_sample_size` and `outliers` preserve
/// what was removed so the reduction is auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    /// std_dev / mean, a unitless noise measure.
    pub coefficient_of_variation: f64,
    /// 95% confidence interval for the mean, (low, high).
    pub ci_95: (f64, f64),
    /// Samples rejected by outlier detection.
    pub outliers: Vec<f64>,
    /// Fraction of valid samples rejected as outliers.
    pub outlier_ratio: f64,
    /// Cleaned sample count, the N behind every statistic above.
    pub sample_size: usize,
    /// Valid samples before outlier rejection.
    pub raw_sample_size: usize,
    /// Non-finite or non-positive inputs dropped before analysis.
    pub failed_iterations: usize,
    /// Throughput derived from the cleaned mean; 0 when undefined.
    pub ops_per_second: f64,
}

impl TimingStats {
    /// Analyze raw timing samples.
    ///
    /// Non-finite and non-positive values are counted as failed iterations
    /// and excluded. The remainder goes through MAD outlier rejection, and
    /// every statistic is computed on the cleaned subset.
    pub fn from_raw(samples: &[f64]) -> Self {
        let (valid, invalid): (Vec<f64>, Vec<f64>) = samples
            .iter()
            .copied()
            .partition(|x| x.is_finite() && *x > 0.0);
        let failed_iterations = invalid.len();

        if valid.is_empty() {
            debug!(total = samples.len(), "no valid samples to analyze");
            return Self::empty(failed_iterations);
        }

        let report = outliers::detect_mad(&valid);
        let cleaned = &report.cleaned;
        debug!(
            raw = valid.len(),
            cleaned = cleaned.len(),
            rejected = report.outliers.len(),
            "outlier rejection complete"
        );

        let mean = stats::mean(cleaned);
        let std_dev = stats::std_dev(cleaned);
        let (min, max) = stats::min_max(cleaned);
        let ops_per_second = if mean > 0.0 { 1e9 / mean } else { 0.0 };

        Self {
            mean,
            median: stats::median(cleaned),
            std_dev,
            min,
            max,
            p75: stats::percentile(cleaned, 0.75),
            p90: stats::percentile(cleaned, 0.90),
            p95: stats::percentile(cleaned, 0.95),
            p99: stats::percentile(cleaned, 0.99),
            coefficient_of_variation: stats::coefficient_of_variation(mean, std_dev),
            ci_95: stats::confidence_interval(mean, std_dev, cleaned.len(), Z_95),
            outlier_ratio: report.outlier_ratio(),
            sample_size: cleaned.len(),
            raw_sample_size: valid.len(),
            failed_iterations,
            ops_per_second,
            outliers: report.outliers,
        }
    }

    fn empty(failed_iterations: usize) -> Self {
        Self {
            mean: f64::NAN,
            median: f64::NAN,
            std_dev: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p75: f64::NAN,
            p90: f64::NAN,
            p95: f64::NAN,
            p99: f64::NAN,
            coefficient_of_variation: f64::NAN,
            ci_95: (f64::NAN, f64::NAN),
            outliers: Vec::new(),
            outlier_ratio: 0.0,
            sample_size: 0,
            raw_sample_size: 0,
            failed_iterations,
            ops_per_second: 0.0,
        }
    }
}
