//! Outlier rejection for timing samples
//!
//! Two detectors: a classic IQR fence and the primary MAD (median absolute
//! deviation) modified z-score method, which tolerates the skew typical of
//! timing data. MAD falls back to IQR when the deviations collapse to zero,
//! and escalates through stricter thresholds on pathological inputs (bimodal
//! distributions, GC interference) so it never rejects almost everything.

use crate::stats;

/// Default IQR fence multiplier.
pub const IQR_FENCE: f64 = 1.5;

/// Minimum sample count for any outlier detection; below this the input is
/// returned unchanged.
pub const MIN_SAMPLES: usize = 3;

/// Modified z-score threshold for the first MAD pass.
const MAD_THRESHOLD: f64 = 3.5;
/// Stricter threshold used when the first pass flags too much.
const MAD_STRICT_THRESHOLD: f64 = 5.0;
/// Consistency constant relating MAD to the standard deviation of a normal.
const MAD_SCALE: f64 = 0.6745;
/// First pass is abandoned when it flags more than this fraction.
const ESCALATION_RATIO: f64 = 0.30;
/// Strict pass is abandoned when it still flags more than this fraction.
const ABANDON_RATIO: f64 = 0.40;
/// Last resort keeps this fraction of samples closest to the median.
const KEEP_CLOSEST_RATIO: f64 = 0.80;

/// Partition of a sample set into kept values and rejected outliers.
///
/// Both sides preserve the input order.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub cleaned: Vec<f64>,
    pub outliers: Vec<f64>,
}

impl OutlierReport {
    fn keep_all(xs: &[f64]) -> Self {
        Self {
            cleaned: xs.to_vec(),
            outliers: Vec::new(),
        }
    }

    /// Fraction of the raw input rejected as outliers.
    pub fn outlier_ratio(&self) -> f64 {
        let total = self.cleaned.len() + self.outliers.len();
        if total == 0 {
            return 0.0;
        }
        self.outliers.len() as f64 / total as f64
    }
}

/// IQR fence detection: values outside `[Q1 - k·IQR, Q3 + k·IQR]` are
/// outliers. Skipped entirely (no outliers) below [`MIN_SAMPLES`] or when the
/// IQR is zero.
pub fn detect_iqr(xs: &[f64], k: f64) -> OutlierReport {
    if xs.len() < MIN_SAMPLES {
        return OutlierReport::keep_all(xs);
    }

    let q1 = stats::percentile(xs, 0.25);
    let q3 = stats::percentile(xs, 0.75);
    let iqr = q3 - q1;
    if iqr == 0.0 {
        return OutlierReport::keep_all(xs);
    }

    let lower = q1 - k * iqr;
    let upper = q3 + k * iqr;
    split(xs, |x| x < lower || x > upper)
}

/// MAD modified z-score detection with cascading escalation.
///
/// Pass 1 flags `|z| > 3.5` where `z = 0.6745·(x − median)/MAD`. If more than
/// 30% of samples are flagged the pass is redone at `|z| > 5.0`; if that
/// still flags more than 40%, z-score filtering is abandoned and the 80% of
/// samples closest to the median (by absolute distance) are kept. A zero MAD
/// falls back to [`detect_iqr`] with the default fence.
pub fn detect_mad(xs: &[f64]) -> OutlierReport {
    if xs.len() < MIN_SAMPLES {
        return OutlierReport::keep_all(xs);
    }

    let med = stats::median(xs);
    let deviations: Vec<f64> = xs.iter().map(|x| (x - med).abs()).collect();
    let mad = stats::median(&deviations);

    if mad == 0.0 {
        return detect_iqr(xs, IQR_FENCE);
    }

    let report = mad_pass(xs, med, mad, MAD_THRESHOLD);
    if report.outlier_ratio() <= ESCALATION_RATIO {
        return report;
    }

    let strict = mad_pass(xs, med, mad, MAD_STRICT_THRESHOLD);
    if strict.outlier_ratio() <= ABANDON_RATIO {
        return strict;
    }

    keep_closest(xs, med)
}

fn mad_pass(xs: &[f64], median: f64, mad: f64, threshold: f64) -> OutlierReport {
    split(xs, |x| {
        let z = MAD_SCALE * (x - median) / mad;
        z.abs() > threshold
    })
}

/// Keep the 80% of samples closest to the median; the rest are outliers.
fn keep_closest(xs: &[f64], median: f64) -> OutlierReport {
    let keep = ((KEEP_CLOSEST_RATIO * xs.len() as f64).round() as usize).clamp(1, xs.len());

    let mut by_distance: Vec<usize> = (0..xs.len()).collect();
    // Stable sort: ties at the cut resolve in input order.
    by_distance.sort_by(|&a, &b| {
        let da = (xs[a] - median).abs();
        let db = (xs[b] - median).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept = vec![false; xs.len()];
    for &i in by_distance.iter().take(keep) {
        kept[i] = true;
    }

    let mut report = OutlierReport {
        cleaned: Vec::with_capacity(keep),
        outliers: Vec::with_capacity(xs.len() - keep),
    };
    for (i, &x) in xs.iter().enumerate() {
        if kept[i] {
            report.cleaned.push(x);
        } else {
            report.outliers.push(x);
        }
    }
    report
}

fn split(xs: &[f64], mut is_outlier: impl FnMut(f64) -> bool) -> OutlierReport {
    let mut report = OutlierReport {
        cleaned: Vec::with_capacity(xs.len()),
        outliers: Vec::new(),
    };
    for &x in xs {
        if is_outlier(x) {
            report.outliers.push(x);
        } else {
            report.cleaned.push(x);
        }
    }
    report
}
