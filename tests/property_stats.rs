//! Property-based tests for the statistics kernel and analyzer.

use proptest::prelude::*;

use medir::analyzer::TimingStats;
use medir::compare::{compare, Comparable};
use medir::outliers;
use medir::stats;

fn samples() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1e9f64, 1..200)
}

proptest! {
    #[test]
    fn percentile_endpoints_match_min_max(xs in samples()) {
        let (min, max) = stats::min_max(&xs);
        prop_assert_eq!(stats::percentile(&xs, 0.0), min);
        prop_assert_eq!(stats::percentile(&xs, 1.0), max);
    }

    #[test]
    fn percentile_is_monotone_in_p(xs in samples(), p1 in 0.0..1.0f64, p2 in 0.0..1.0f64) {
        let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
        prop_assert!(stats::percentile(&xs, lo) <= stats::percentile(&xs, hi));
    }

    #[test]
    fn mean_lies_within_min_max(xs in samples()) {
        let (min, max) = stats::min_max(&xs);
        let mean = stats::mean(&xs);
        prop_assert!(mean >= min - 1e-6 && mean <= max + 1e-6);
    }

    #[test]
    fn std_dev_is_non_negative(xs in samples()) {
        prop_assert!(stats::std_dev(&xs) >= 0.0);
    }

    #[test]
    fn identical_samples_have_zero_spread_and_no_outliers(
        value in 1.0..1e9f64,
        n in 3usize..100,
    ) {
        let xs = vec![value; n];
        prop_assert_eq!(stats::std_dev(&xs), 0.0);
        let report = outliers::detect_mad(&xs);
        prop_assert!(report.outliers.is_empty());
        prop_assert_eq!(report.cleaned.len(), n);
    }

    #[test]
    fn outlier_partition_preserves_every_sample(xs in samples()) {
        let report = outliers::detect_mad(&xs);
        prop_assert_eq!(report.cleaned.len() + report.outliers.len(), xs.len());

        let mut recombined = report.cleaned.clone();
        recombined.extend_from_slice(&report.outliers);
        recombined.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mut original = xs.clone();
        original.sort_by(|a, b| a.partial_cmp(b).unwrap());
        prop_assert_eq!(recombined, original);
    }

    #[test]
    fn outlier_rejection_never_drops_more_than_allowed(xs in samples()) {
        // The escalation ladder bottoms out at keeping 80% of samples, so
        // for n >= 3 the rejected share can never exceed ~20% plus rounding.
        let report = outliers::detect_mad(&xs);
        if xs.len() >= 3 {
            let max_rejected = xs.len() - ((0.8 * xs.len() as f64).round() as usize).max(1);
            prop_assert!(
                report.outliers.len() <= max_rejected.max(xs.len() * 2 / 5),
                "rejected {} of {}",
                report.outliers.len(),
                xs.len()
            );
        } else {
            prop_assert!(report.outliers.is_empty());
        }
    }

    #[test]
    fn analyzer_sample_counts_are_consistent(xs in samples()) {
        let stats = TimingStats::from_raw(&xs);
        prop_assert_eq!(stats.raw_sample_size, xs.len());
        prop_assert_eq!(stats.sample_size + stats.outliers.len(), stats.raw_sample_size);
        prop_assert_eq!(stats.failed_iterations, 0);
        prop_assert!(stats.min <= stats.median && stats.median <= stats.max);
    }

    #[test]
    fn comparison_is_symmetric_in_verdict_strength(
        mean_a in 100.0..1e6f64,
        mean_b in 100.0..1e6f64,
        std in 1.0..1e4f64,
    ) {
        let a = Comparable::rebuild(mean_a, std, 50);
        let b = Comparable::rebuild(mean_b, std, 50);
        let ab = compare(&a, &b, 0.05);
        let ba = compare(&b, &a, 0.05);
        prop_assert_eq!(ab.significant, ba.significant);
        prop_assert!((ab.p_value - ba.p_value).abs() < 1e-9);
        prop_assert!((ab.speedup - ba.speedup).abs() < 1e-9);
        prop_assert_eq!(ab.magnitude, ba.magnitude);
    }

    #[test]
    fn p_value_stays_in_unit_interval(
        t in -50.0..50.0f64,
        df in 1.0..500.0f64,
    ) {
        let p = medir::hypothesis::t_test_p_value(t, df);
        prop_assert!((0.0..=1.0).contains(&p), "p={p}");
    }
}
