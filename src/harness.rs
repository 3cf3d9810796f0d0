//! Adaptive sampling harness
//!
//! Runs registered tasks one at a time: untimed setup and warmup, then a
//! measurement loop that keeps iterating until the target duration is
//! reached (bounded by min/max iteration counts), then untimed teardown.
//! Tasks are independent; a failing task records its error and the run
//! moves on.
//!
//! All time flows through the [`Clock`] trait so the adaptive stop rule is
//! testable without real elapsed time.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyzer::TimingStats;
use crate::clock::{Clock, MonotonicClock};
use crate::task::Task;

/// Configuration rejected before any task runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target_duration must be greater than zero")]
    ZeroTargetDuration,
    #[error("min_iterations must be at least 1")]
    ZeroMinIterations,
    #[error("max_iterations ({max}) must be >= min_iterations ({min})")]
    MaxBelowMin { min: usize, max: usize },
    #[error("duplicate task name: {0}")]
    DuplicateTask(String),
}

/// Sampling parameters. The defaults target one second of measurement per
/// task with 10 warmup iterations and an iteration count in [10, 10_000].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Measurement phase keeps sampling until this much time has elapsed.
    pub target_duration: Duration,
    /// Untimed iterations before measurement begins.
    pub warmup_iterations: usize,
    /// Pause between tasks; skipped after the last one.
    pub cooldown: Duration,
    /// Lower bound on measured iterations, regardless of elapsed time.
    pub min_iterations: usize,
    /// Hard upper bound on measured iterations.
    pub max_iterations: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target_duration: Duration::from_secs(1),
            warmup_iterations: 10,
            cooldown: Duration::ZERO,
            min_iterations: 10,
            max_iterations: 10_000,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_duration.is_zero() {
            return Err(ConfigError::ZeroTargetDuration);
        }
        if self.min_iterations == 0 {
            return Err(ConfigError::ZeroMinIterations);
        }
        if self.max_iterations < self.min_iterations {
            return Err(ConfigError::MaxBelowMin {
                min: self.min_iterations,
                max: self.max_iterations,
            });
        }
        Ok(())
    }
}

/// Per-iteration progress handed to the progress callback.
#[derive(Debug, Clone, Copy)]
pub struct IterationProgress<'a> {
    pub task: &'a str,
    /// Completed measured iterations, 1-based.
    pub iteration: usize,
    /// Nanoseconds elapsed in the measurement phase so far.
    pub elapsed_ns: u64,
}

/// Verdict returned by the progress callback after each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    /// Stop the current task's measurement loop immediately. Overrides
    /// min_iterations; aborting is a deliberate caller decision.
    Abort,
}

type ProgressFn = Box<dyn FnMut(&IterationProgress<'_>) -> ControlFlow + Send>;

/// Outcome of running one task. Present even on failure so a run always
/// reports every selected task.
#[derive(Debug)]
pub struct TaskResult {
    pub name: String,
    pub stats: TimingStats,
    /// Measured iterations actually completed.
    pub iterations: usize,
    /// Wall time of the whole task run: setup, warmup, measurement, and
    /// teardown. Per-iteration samples cover only the measured operation.
    pub total_duration_ns: u64,
    /// Raw per-iteration durations, before outlier rejection.
    pub samples: Vec<f64>,
    /// First error from setup, measurement, or teardown.
    pub error: Option<String>,
    /// First warmup failure. Kept apart from `error`: a task that recovers
    /// after warmup still counts as fully measured.
    pub warmup_error: Option<String>,
}

/// The benchmark runner. Construct with a validated config, register tasks,
/// then [`run`](Harness::run).
pub struct Harness {
    config: HarnessConfig,
    clock: Arc<dyn Clock>,
    tasks: Vec<Task>,
    progress: Option<ProgressFn>,
}

impl Harness {
    /// Fails fast on an invalid config; nothing is deferred to `run`.
    pub fn new(config: HarnessConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            clock: Arc::new(MonotonicClock::new()),
            tasks: Vec::new(),
            progress: None,
        })
    }

    /// Replace the timing source. Tests inject a deterministic clock here.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a task. Names must be unique within a harness.
    pub fn add(&mut self, task: Task) -> Result<(), ConfigError> {
        if self.tasks.iter().any(|t| t.name == task.name) {
            return Err(ConfigError::DuplicateTask(task.name));
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Per-iteration callback. Returning [`ControlFlow::Abort`] stops the
    /// current task's measurement loop unconditionally.
    pub fn set_progress(
        &mut self,
        f: impl FnMut(&IterationProgress<'_>) -> ControlFlow + Send + 'static,
    ) {
        self.progress = Some(Box::new(f));
    }

    /// Run every selected task and return one result per task, in
    /// registration order. Skipped and deselected tasks produce no result.
    pub async fn run(mut self) -> Vec<TaskResult> {
        let focus = self.tasks.iter().any(|t| t.only);
        let selected: Vec<Task> = self
            .tasks
            .drain(..)
            .filter(|t| !t.skip && (!focus || t.only))
            .collect();

        info!(
            tasks = selected.len(),
            target_ms = self.config.target_duration.as_millis() as u64,
            "benchmark run starting"
        );

        let mut results = Vec::with_capacity(selected.len());
        let last = selected.len().saturating_sub(1);
        for (i, task) in selected.into_iter().enumerate() {
            results.push(self.run_task(task).await);
            if i < last && !self.config.cooldown.is_zero() {
                debug!(cooldown_ms = self.config.cooldown.as_millis() as u64, "cooldown");
                tokio::time::sleep(self.config.cooldown).await;
            }
        }
        results
    }

    async fn run_task(&mut self, mut task: Task) -> TaskResult {
        let name = task.name.clone();
        info!(task = %name, mode = ?task.execution_mode(), "task starting");

        // Setup failure aborts the task outright: nothing to measure and
        // teardown is not attempted against half-initialized state.
        let task_start = self.clock.now_ns();
        if let Some(setup) = task.setup.as_mut() {
            if let Err(e) = setup.invoke().await {
                warn!(task = %name, error = %e, "setup failed, skipping task");
                let task_end = self.clock.now_ns();
                return TaskResult {
                    name,
                    stats: TimingStats::from_raw(&[]),
                    iterations: 0,
                    total_duration_ns: task_end.saturating_sub(task_start),
                    samples: Vec::new(),
                    error: Some(format!("setup failed: {e:#}")),
                    warmup_error: None,
                };
            }
        }

        let mut error: Option<String> = None;
        let mut warmup_error: Option<String> = None;

        for i in 0..self.config.warmup_iterations {
            if let Err(e) = task.operation.invoke().await {
                warn!(task = %name, iteration = i, error = %e, "warmup iteration failed");
                warmup_error.get_or_insert_with(|| format!("warmup failed: {e:#}"));
            }
        }

        let target_ns = self.config.target_duration.as_nanos() as u64;
        let mut samples: Vec<f64> = Vec::new();
        let mut iterations = 0usize;
        let start = self.clock.now_ns();

        loop {
            let t0 = self.clock.now_ns();
            let outcome = task.operation.invoke().await;
            let t1 = self.clock.now_ns();

            match outcome {
                Ok(()) => {
                    samples.push(t1.saturating_sub(t0) as f64);
                    iterations += 1;
                }
                Err(e) => {
                    // Keep partial samples; the failure is part of the result.
                    warn!(task = %name, iteration = iterations, error = %e, "operation failed");
                    error.get_or_insert_with(|| format!("operation failed: {e:#}"));
                    break;
                }
            }

            let elapsed = t1.saturating_sub(start);
            if let Some(progress) = self.progress.as_mut() {
                let verdict = progress(&IterationProgress {
                    task: &name,
                    iteration: iterations,
                    elapsed_ns: elapsed,
                });
                if verdict == ControlFlow::Abort {
                    debug!(task = %name, iteration = iterations, "aborted by progress callback");
                    break;
                }
            }

            if iterations == self.config.max_iterations {
                break;
            }
            if elapsed >= target_ns && iterations >= self.config.min_iterations {
                break;
            }
        }

        // Setup succeeded, so teardown always runs, even after an operation
        // failure.
        if let Some(teardown) = task.teardown.as_mut() {
            if let Err(e) = teardown.invoke().await {
                warn!(task = %name, error = %e, "teardown failed");
                error.get_or_insert_with(|| format!("teardown failed: {e:#}"));
            }
        }

        let task_end = self.clock.now_ns();
        let stats = TimingStats::from_raw(&samples);
        info!(
            task = %name,
            iterations,
            mean_ns = stats.mean,
            "task complete"
        );

        TaskResult {
            name,
            stats,
            iterations,
            total_duration_ns: task_end.saturating_sub(task_start),
            samples,
            error,
            warmup_error,
        }
    }
}
