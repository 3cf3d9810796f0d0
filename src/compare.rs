//! Two-candidate comparison
//!
//! Answers "is A faster than B, and does the difference matter?" by
//! combining Welch's t-test (statistical significance), Cohen's d
//! (practical magnitude), and a confidence-interval overlap check. A
//! [`Comparison`] is an ephemeral verdict over two summaries; it is never
//! persisted.

use crate::analyzer::TimingStats;
use crate::hypothesis::{self, EffectMagnitude};
use crate::stats;

/// 95% z quantile used when rebuilding a CI from summary numbers.
const Z_95: f64 = 1.960;

/// The minimum a comparison needs from each side. Built from live results
/// or rehydrated from stored summary statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparable {
    pub mean: f64,
    pub std_dev: f64,
    pub sample_size: usize,
    /// 95% confidence interval for the mean, (low, high).
    pub ci: (f64, f64),
}

impl Comparable {
    /// Rebuild from summary statistics, deriving a fresh 95% CI. Used when
    /// the original interval was not stored (baseline entries keep only
    /// mean, spread, and sample size).
    pub fn rebuild(mean: f64, std_dev: f64, sample_size: usize) -> Self {
        Self {
            mean,
            std_dev,
            sample_size,
            ci: stats::confidence_interval(mean, std_dev, sample_size, Z_95),
        }
    }
}

impl From<&TimingStats> for Comparable {
    fn from(stats: &TimingStats) -> Self {
        Self {
            mean: stats.mean,
            std_dev: stats.std_dev,
            sample_size: stats.sample_size,
            ci: stats.ci_95,
        }
    }
}

/// Which side of the comparison won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faster {
    First,
    Second,
    Equal,
}

/// Verdict over two candidates. `faster` already accounts for practical
/// magnitude: a statistically detectable but negligible difference reads
/// as [`Faster::Equal`].
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub faster: Faster,
    /// Ratio of the slower mean to the faster mean, >= 1.0. NaN when either
    /// side had no samples to compare.
    pub speedup: f64,
    /// True when p_value < alpha.
    pub significant: bool,
    pub p_value: f64,
    /// Cohen's d, absolute.
    pub effect_size: f64,
    pub magnitude: EffectMagnitude,
    /// Whether the two 95% confidence intervals overlap.
    pub ci_overlap: bool,
    pub recommendation: String,
}

/// Compare two candidates at significance level `alpha`.
///
/// Either side having zero samples yields the neutral verdict rather than
/// an error. Two zero-spread candidates bypass the t-test: identical means
/// force p to 1.0, different means to 0.0.
pub fn compare(a: &Comparable, b: &Comparable, alpha: f64) -> Comparison {
    if a.sample_size == 0 || b.sample_size == 0 {
        return Comparison {
            faster: Faster::Equal,
            speedup: f64::NAN,
            significant: false,
            p_value: 1.0,
            effect_size: f64::NAN,
            magnitude: EffectMagnitude::Negligible,
            ci_overlap: false,
            recommendation: "Insufficient data: one side has no samples.".to_string(),
        };
    }

    let test = hypothesis::welch_t_test(
        a.mean,
        a.std_dev,
        a.sample_size,
        b.mean,
        b.std_dev,
        b.sample_size,
    );
    let p_value = if a.std_dev == 0.0 && b.std_dev == 0.0 {
        // No spread at all: the means are the whole story.
        if a.mean == b.mean {
            1.0
        } else {
            0.0
        }
    } else {
        hypothesis::t_test_p_value(test.t, test.df)
    };

    let effect_size = hypothesis::cohens_d(
        a.mean,
        a.std_dev,
        a.sample_size,
        b.mean,
        b.std_dev,
        b.sample_size,
    );
    let magnitude = EffectMagnitude::from_effect_size(effect_size);
    let significant = p_value < alpha;

    let raw_faster = if a.mean < b.mean {
        Faster::First
    } else if b.mean < a.mean {
        Faster::Second
    } else {
        Faster::Equal
    };
    // Practical equivalence: a detectable but negligible gap is a tie.
    let faster = if magnitude == EffectMagnitude::Negligible {
        Faster::Equal
    } else {
        raw_faster
    };

    let speedup = if a.mean == b.mean {
        1.0
    } else {
        a.mean.max(b.mean) / a.mean.min(b.mean)
    };

    let ci_overlap = a.ci.0 <= b.ci.1 && b.ci.0 <= a.ci.1;

    let recommendation = recommendation(faster, speedup, significant, p_value, magnitude);

    Comparison {
        faster,
        speedup,
        significant,
        p_value,
        effect_size,
        magnitude,
        ci_overlap,
        recommendation,
    }
}

fn recommendation(
    faster: Faster,
    speedup: f64,
    significant: bool,
    p_value: f64,
    magnitude: EffectMagnitude,
) -> String {
    if !significant {
        return format!(
            "No statistically significant difference (p={p_value:.4}); treat as equivalent."
        );
    }
    match faster {
        Faster::Equal => format!(
            "Statistically detectable but {magnitude} difference (p={p_value:.4}); \
             treat as equivalent in practice."
        ),
        Faster::First => format!(
            "First candidate is {speedup:.2}x faster (p={p_value:.4}, {magnitude} effect)."
        ),
        Faster::Second => format!(
            "Second candidate is {speedup:.2}x faster (p={p_value:.4}, {magnitude} effect)."
        ),
    }
}
