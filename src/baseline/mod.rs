//! Baseline persistence and regression detection
//!
//! A baseline is a versioned JSON snapshot of per-task summary statistics,
//! annotated with VCS metadata so a drift report can say what it is being
//! compared against. The detector rehydrates stored entries and classifies
//! each task as regressed, improved, or unchanged.

pub mod detect;
pub mod store;
pub mod vcs;

pub use detect::{BaselineDiff, DetectOptions, TaskComparison};
pub use store::{Baseline, BaselineEntry, BaselineError, BaselineStore, SaveOptions};
pub use vcs::{git_info, VcsInfo};
