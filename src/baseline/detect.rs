//! Regression detection against a stored baseline
//!
//! Rehydrates each baseline entry, compares it against the matching current
//! result, and classifies the task. A regression needs three things at
//! once: statistical significance, a non-negligible effect size, and a
//! slowdown factor at or above the configured threshold. Noise alone never
//! produces a red report.

use chrono::Utc;
use tracing::{debug, info};

use crate::compare::{self, Comparable, Comparison, Faster};
use crate::harness::TaskResult;

use super::store::Baseline;

/// Detector knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectOptions {
    /// Significance level for the underlying t-test.
    pub alpha: f64,
    /// Minimum slowdown factor (current mean / baseline mean) for a
    /// significant slowdown to count as a regression. 1.0 means any
    /// significant, non-negligible slowdown counts.
    pub regression_threshold: f64,
    /// Baseline age in days beyond which the diff is flagged stale.
    /// `None` disables the check.
    pub staleness_days: Option<f64>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            regression_threshold: 1.0,
            staleness_days: None,
        }
    }
}

/// One task's comparison against its baseline entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskComparison {
    pub name: String,
    pub baseline_mean_ns: f64,
    pub current_mean_ns: f64,
    pub comparison: Comparison,
}

/// Full diff of a run against a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineDiff {
    /// Every task present on both sides, in run order.
    pub comparisons: Vec<TaskComparison>,
    /// Significant slowdowns over the threshold, worst effect first.
    pub regressions: Vec<TaskComparison>,
    /// Significant speedups, largest effect first.
    pub improvements: Vec<TaskComparison>,
    /// Task names with no meaningful difference.
    pub unchanged: Vec<String>,
    /// Tasks measured now but absent from the baseline.
    pub new_tasks: Vec<String>,
    /// Baseline entries with no matching task in this run.
    pub removed: Vec<String>,
    pub baseline_age_days: f64,
    /// True only when a staleness threshold was supplied and exceeded.
    pub stale: bool,
}

impl BaselineDiff {
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }

    /// Human-readable summary of the diff.
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        if self.regressions.is_empty() {
            report.push_str("✅ NO REGRESSION DETECTED\n\n");
        } else {
            report.push_str(&format!(
                "❌ REGRESSION DETECTED ({} tasks)\n\n",
                self.regressions.len()
            ));
        }

        report.push_str(&format!(
            "Baseline age: {:.1} days{}\n",
            self.baseline_age_days,
            if self.stale { " (STALE)" } else { "" }
        ));
        report.push_str(&format!(
            "Tasks compared: {} ({} unchanged, {} improved, {} regressed)\n",
            self.comparisons.len(),
            self.unchanged.len(),
            self.improvements.len(),
            self.regressions.len()
        ));

        if !self.regressions.is_empty() {
            report.push_str("\nRegressions (worst first):\n");
            for r in &self.regressions {
                report.push_str(&format!(
                    "  {}: {:.0}ns -> {:.0}ns ({:.2}x slower, p={:.4}, {} effect)\n",
                    r.name,
                    r.baseline_mean_ns,
                    r.current_mean_ns,
                    r.comparison.speedup,
                    r.comparison.p_value,
                    r.comparison.magnitude
                ));
            }
        }
        if !self.improvements.is_empty() {
            report.push_str("\nImprovements:\n");
            for i in &self.improvements {
                report.push_str(&format!(
                    "  {}: {:.0}ns -> {:.0}ns ({:.2}x faster)\n",
                    i.name, i.baseline_mean_ns, i.current_mean_ns, i.comparison.speedup
                ));
            }
        }
        if !self.new_tasks.is_empty() {
            report.push_str(&format!("\nNew tasks: {}\n", self.new_tasks.join(", ")));
        }
        if !self.removed.is_empty() {
            report.push_str(&format!("Removed tasks: {}\n", self.removed.join(", ")));
        }

        report
    }
}

/// Compare the current run against a stored baseline.
pub fn detect(
    baseline: &Baseline,
    results: &[TaskResult],
    options: &DetectOptions,
) -> BaselineDiff {
    let age = Utc::now().signed_duration_since(baseline.timestamp);
    let baseline_age_days = age.num_seconds() as f64 / 86_400.0;
    let stale = options
        .staleness_days
        .is_some_and(|limit| baseline_age_days > limit);

    let mut comparisons = Vec::new();
    let mut regressions = Vec::new();
    let mut improvements = Vec::new();
    let mut unchanged = Vec::new();
    let mut new_tasks = Vec::new();

    for result in results {
        let Some(entry) = baseline.entry(&result.name) else {
            new_tasks.push(result.name.clone());
            continue;
        };

        let stored = Comparable::rebuild(entry.mean_ns, entry.std_dev_ns, entry.sample_size);
        let current = Comparable::from(&result.stats);
        let comparison = compare::compare(&stored, &current, options.alpha);
        debug!(
            task = %result.name,
            p_value = comparison.p_value,
            speedup = comparison.speedup,
            "baseline comparison"
        );

        let task_comparison = TaskComparison {
            name: result.name.clone(),
            baseline_mean_ns: entry.mean_ns,
            current_mean_ns: result.stats.mean,
            comparison: comparison.clone(),
        };

        let meaningful = comparison.significant && comparison.faster != Faster::Equal;
        match comparison.faster {
            // Baseline side faster means the current run slowed down.
            Faster::First
                if meaningful && comparison.speedup >= options.regression_threshold =>
            {
                regressions.push(task_comparison.clone());
            }
            Faster::Second if meaningful => {
                improvements.push(task_comparison.clone());
            }
            _ => unchanged.push(result.name.clone()),
        }
        comparisons.push(task_comparison);
    }

    let removed: Vec<String> = baseline
        .entries
        .iter()
        .filter(|e| !results.iter().any(|r| r.name == e.name))
        .map(|e| e.name.clone())
        .collect();

    sort_by_effect_desc(&mut regressions);
    sort_by_effect_desc(&mut improvements);

    info!(
        regressions = regressions.len(),
        improvements = improvements.len(),
        unchanged = unchanged.len(),
        "baseline diff complete"
    );

    BaselineDiff {
        comparisons,
        regressions,
        improvements,
        unchanged,
        new_tasks,
        removed,
        baseline_age_days,
        stale,
    }
}

fn sort_by_effect_desc(items: &mut [TaskComparison]) {
    items.sort_by(|a, b| {
        b.comparison
            .effect_size
            .partial_cmp(&a.comparison.effect_size)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
