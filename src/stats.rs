//! Descriptive statistics kernel
//!
//! Pure functions over `&[f64]` samples (nanosecond durations or arbitrary
//! numeric data). Degenerate input is never an error: empty slices yield
//! `f64::NAN`, the crate-wide "undefined" sentinel. Callers that need a hard
//! failure must check before calling.
//!
//! Variance and standard deviation use the population form (divide by N):
//! a benchmark can always collect more samples, so the N-1 correction buys
//! nothing and makes small-sample results noisier.

/// Arithmetic mean. NaN for empty input.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Median: average of the two middle values for even-length input.
pub fn median(xs: &[f64]) -> f64 {
    percentile(xs, 0.5)
}

/// Population variance (divide by N). NaN for empty input.
pub fn variance(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

/// Population standard deviation.
pub fn std_dev(xs: &[f64]) -> f64 {
    variance(xs).sqrt()
}

/// Single-pass min and max. NaN pair for empty input.
pub fn min_max(xs: &[f64]) -> (f64, f64) {
    if xs.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let mut min = xs[0];
    let mut max = xs[0];
    for &x in &xs[1..] {
        if x < min {
            min = x;
        }
        if x > max {
            max = x;
        }
    }
    (min, max)
}

/// Percentile via linear interpolation (the R-7 method).
///
/// `p` is a fraction in `[0, 1]`. For sorted input of length N the rank is
/// `(N-1)·p`, interpolated between the floor and ceil indices. A single
/// element is returned unchanged for any `p`; empty input yields NaN.
pub fn percentile(xs: &[f64], p: f64) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    if xs.len() == 1 {
        return xs[0];
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = rank - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Coefficient of variation: std_dev / mean. NaN when the mean is zero.
pub fn coefficient_of_variation(mean: f64, std_dev: f64) -> f64 {
    if mean == 0.0 {
        return f64::NAN;
    }
    std_dev / mean
}

/// Confidence interval for the mean: mean ± z·(std_dev/√n).
pub fn confidence_interval(mean: f64, std_dev: f64, n: usize, z: f64) -> (f64, f64) {
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let margin = z * (std_dev / (n as f64).sqrt());
    (mean - margin, mean + margin)
}

/// Two-tailed z-score for a confidence level in `(0, 1)`.
///
/// Common levels come from a lookup table; anything else goes through the
/// Winitzki approximation of the inverse error function.
pub fn z_score(confidence_level: f64) -> f64 {
    // Table values match standard normal quantiles to 3 decimals.
    const TABLE: &[(f64, f64)] = &[
        (0.80, 1.282),
        (0.90, 1.645),
        (0.95, 1.960),
        (0.98, 2.326),
        (0.99, 2.576),
        (0.999, 3.291),
    ];
    for &(level, z) in TABLE {
        if (confidence_level - level).abs() < 1e-9 {
            return z;
        }
    }
    inverse_erf(confidence_level) * std::f64::consts::SQRT_2
}

/// Winitzki approximation of erf⁻¹(x), accurate to ~2e-3 over (-1, 1).
fn inverse_erf(x: f64) -> f64 {
    let a = 0.147;
    let ln_term = (1.0 - x * x).ln();
    let first = 2.0 / (std::f64::consts::PI * a) + ln_term / 2.0;
    let inner = first * first - ln_term / a;
    (inner.sqrt() - first).sqrt().copysign(x)
}

/// Standard normal CDF via the Abramowitz & Stegun 7.1.26 erf approximation.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Abramowitz & Stegun 7.1.26, max absolute error 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_basic() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
    }

    #[test]
    fn test_mean_empty_is_nan() {
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_median_odd_length() {
        assert_eq!(median(&[1.0, 3.0, 5.0, 7.0, 9.0]), 5.0);
    }

    #[test]
    fn test_median_even_length() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn test_variance_population_form() {
        // mean=5, sum of squared deviations = 9+1+1+9 = 20, / 4 = 5.0
        assert!((variance(&[2.0, 4.0, 6.0, 8.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev_constant_input() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_min_max_single_pass() {
        assert_eq!(min_max(&[3.0, 1.0, 4.0, 1.5, 9.0]), (1.0, 9.0));
        let (min, max) = min_max(&[]);
        assert!(min.is_nan() && max.is_nan());
    }

    #[test]
    fn test_percentile_endpoints_are_min_max() {
        let xs = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(percentile(&xs, 0.0), 1.0);
        assert_eq!(percentile(&xs, 1.0), 5.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let xs: Vec<f64> = (1..=10).map(f64::from).collect();
        assert!((percentile(&xs, 0.25) - 3.25).abs() < 1e-10);
        assert!((percentile(&xs, 0.75) - 7.75).abs() < 1e-10);
    }

    #[test]
    fn test_percentile_single_element_any_p() {
        assert_eq!(percentile(&[42.0], 0.0), 42.0);
        assert_eq!(percentile(&[42.0], 0.5), 42.0);
        assert_eq!(percentile(&[42.0], 1.0), 42.0);
    }

    #[test]
    fn test_percentile_unsorted_input() {
        assert_eq!(percentile(&[5.0, 1.0, 3.0, 2.0, 4.0], 0.5), 3.0);
    }

    #[test]
    fn test_coefficient_of_variation_zero_mean() {
        assert!(coefficient_of_variation(0.0, 3.0).is_nan());
        assert_eq!(coefficient_of_variation(10.0, 2.0), 0.2);
    }

    #[test]
    fn test_confidence_interval_95() {
        // std_dev 10, n 100 -> se 1.0, margin 1.96
        let (low, high) = confidence_interval(100.0, 10.0, 100, 1.96);
        assert!((low - 98.04).abs() < 1e-9);
        assert!((high - 101.96).abs() < 1e-9);
    }

    #[test]
    fn test_z_score_table_levels() {
        assert_eq!(z_score(0.95), 1.960);
        assert_eq!(z_score(0.99), 2.576);
    }

    #[test]
    fn test_z_score_off_table_uses_approximation() {
        // 0.93 confidence sits between the 0.90 and 0.95 table entries
        let z = z_score(0.93);
        assert!(z > 1.6 && z < 1.96, "z={z}");
    }

    #[test]
    fn test_normal_cdf_symmetry() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 1e-3);
    }
}
