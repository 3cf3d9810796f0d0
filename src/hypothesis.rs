//! Two-sample hypothesis testing
//!
//! Welch's t-test (no equal-variance assumption), a two-tailed p-value
//! approximation for the t-distribution, and Cohen's d effect sizes. All
//! functions operate on summary statistics (mean, std dev, sample size) so
//! they work equally on live results and rehydrated baseline entries.
//!
//! The p-value path mirrors the usual numeric recipe: for large degrees of
//! freedom the t-distribution is close enough to normal that the erf-based
//! CDF suffices; below that the tail probability comes from the regularized
//! incomplete beta function evaluated with a Lentz continued fraction and a
//! Lanczos log-gamma.

use serde::{Deserialize, Serialize};

use crate::stats::normal_cdf;

/// Degrees of freedom above which the normal approximation is used.
const NORMAL_APPROX_DF: f64 = 100.0;
/// Continued fraction iteration bound.
const BETA_CF_MAX_ITER: usize = 100;
/// Floor keeping continued fraction denominators away from zero.
const BETA_CF_FPMIN: f64 = 1e-30;
/// Convergence tolerance for the continued fraction.
const BETA_CF_EPS: f64 = 3e-14;

/// Result of Welch's t-test: the statistic and the Welch–Satterthwaite
/// degrees of freedom. Degenerate inputs yield NaN fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchTTest {
    pub t: f64,
    pub df: f64,
}

/// Welch's t-test from summary statistics.
///
/// `t = (mean1 − mean2) / √(var1/n1 + var2/n2)` with the
/// Welch–Satterthwaite degrees of freedom. Requires at least 2 samples per
/// side and nonzero combined variance; otherwise both fields are NaN and the
/// caller decides what a zero-variance comparison means.
pub fn welch_t_test(
    mean1: f64,
    std_dev1: f64,
    n1: usize,
    mean2: f64,
    std_dev2: f64,
    n2: usize,
) -> WelchTTest {
    if n1 < 2 || n2 < 2 {
        return WelchTTest {
            t: f64::NAN,
            df: f64::NAN,
        };
    }

    let se1 = std_dev1 * std_dev1 / n1 as f64;
    let se2 = std_dev2 * std_dev2 / n2 as f64;
    let pooled_se = se1 + se2;
    if pooled_se == 0.0 {
        return WelchTTest {
            t: f64::NAN,
            df: f64::NAN,
        };
    }

    let t = (mean1 - mean2) / pooled_se.sqrt();
    let df = pooled_se * pooled_se
        / (se1 * se1 / (n1 as f64 - 1.0) + se2 * se2 / (n2 as f64 - 1.0));

    WelchTTest { t, df }
}

/// Two-tailed p-value for a t-statistic with `df` degrees of freedom.
///
/// Above [`NORMAL_APPROX_DF`] degrees of freedom the normal approximation is
/// used; below, `p = I_{df/(df+t²)}(df/2, 1/2)` via the regularized
/// incomplete beta function. NaN inputs yield a p-value of 1.0 (no evidence).
pub fn t_test_p_value(t: f64, df: f64) -> f64 {
    if !t.is_finite() || !df.is_finite() || df <= 0.0 {
        return 1.0;
    }
    if df > NORMAL_APPROX_DF {
        return (2.0 * (1.0 - normal_cdf(t.abs()))).clamp(0.0, 1.0);
    }
    let x = df / (df + t * t);
    incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

/// Regularized incomplete beta function `I_x(a, b)`.
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front =
        ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges fast only for x below the split
    // point; above it, use the symmetry I_x(a,b) = 1 − I_{1−x}(b,a).
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Lentz's algorithm for the incomplete beta continued fraction.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < BETA_CF_FPMIN {
        d = BETA_CF_FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=BETA_CF_MAX_ITER {
        let m_f = m as f64;
        let m2 = 2.0 * m_f;

        // Even step.
        let aa = m_f * (b - m_f) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < BETA_CF_FPMIN {
            d = BETA_CF_FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < BETA_CF_FPMIN {
            c = BETA_CF_FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        // Odd step.
        let aa = -(a + m_f) * (qab + m_f) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < BETA_CF_FPMIN {
            d = BETA_CF_FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < BETA_CF_FPMIN {
            c = BETA_CF_FPMIN;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < BETA_CF_EPS {
            break;
        }
    }
    h
}

/// Lanczos approximation of ln Γ(x) (g = 7, 9 coefficients).
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 8] = [
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        // Reflection formula for the left half-plane.
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut acc = 0.99999999999980993;
    for (i, &c) in COEFFS.iter().enumerate() {
        acc += c / (x + i as f64 + 1.0);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

/// Effect-size magnitude buckets for Cohen's d.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    /// Bucket an absolute effect size: <0.2 negligible, <0.5 small,
    /// <0.8 medium, else large.
    pub fn from_effect_size(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            Self::Negligible
        } else if d < 0.5 {
            Self::Small
        } else if d < 0.8 {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

impl std::fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Negligible => "negligible",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        };
        f.write_str(s)
    }
}

/// Cohen's d from summary statistics: `|mean1 − mean2| / pooled_std_dev`.
///
/// A zero pooled standard deviation means the samples carry no spread at
/// all: equal means give an effect of exactly 0, unequal means an unbounded
/// (infinite) effect.
pub fn cohens_d(
    mean1: f64,
    std_dev1: f64,
    n1: usize,
    mean2: f64,
    std_dev2: f64,
    n2: usize,
) -> f64 {
    if n1 == 0 || n2 == 0 {
        return f64::NAN;
    }

    let pooled = pooled_std_dev(std_dev1, n1, std_dev2, n2);
    if pooled == 0.0 {
        return if mean1 == mean2 { 0.0 } else { f64::INFINITY };
    }
    (mean1 - mean2).abs() / pooled
}

fn pooled_std_dev(std_dev1: f64, n1: usize, std_dev2: f64, n2: usize) -> f64 {
    let n1 = n1 as f64;
    let n2 = n2 as f64;
    let denom = n1 + n2 - 2.0;
    if denom <= 0.0 {
        // Two single-sample sets: fall back to the RMS of the inputs.
        return ((std_dev1 * std_dev1 + std_dev2 * std_dev2) / 2.0).sqrt();
    }
    (((n1 - 1.0) * std_dev1 * std_dev1 + (n2 - 1.0) * std_dev2 * std_dev2) / denom).sqrt()
}
