//! Medir - Adaptive benchmarking engine with statistical rigor
//!
//! This library provides the core functionality for measuring code
//! performance: an adaptive sampling harness over sync and async tasks,
//! robust statistics with MAD-based outlier rejection, Welch's t-test
//! comparison of candidates, and baseline persistence with regression
//! detection.

pub mod analyzer;
pub mod baseline;
pub mod clock;
pub mod compare;
pub mod harness;
pub mod hypothesis;
pub mod outliers;
pub mod stats;
pub mod task;

pub use analyzer::TimingStats;
pub use baseline::{BaselineDiff, BaselineStore, DetectOptions};
pub use compare::{compare, Comparable, Comparison, Faster};
pub use harness::{ControlFlow, Harness, HarnessConfig, TaskResult};
pub use task::{ExecutionMode, Task};
