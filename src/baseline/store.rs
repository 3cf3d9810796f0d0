//! Versioned baseline snapshot on disk
//!
//! One JSON file (`baseline.json`) per store directory. The file format is
//! strict: unknown fields, a version mismatch, or any parse failure mark
//! the file invalid, and an invalid file is deleted and treated as absent
//! rather than surfaced as an error. A baseline is a cache of past
//! measurements, not a source of truth worth failing over.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::harness::TaskResult;

use super::vcs::{self, VcsInfo};

/// Bumped on any incompatible change to the snapshot layout.
pub const BASELINE_VERSION: u32 = 1;

const FILE_NAME: &str = "baseline.json";

#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("baseline I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("baseline serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no measurable results to snapshot")]
    NoResults,
}

/// Per-task summary statistics as stored on disk. All durations are
/// nanoseconds; the raw samples are deliberately not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineEntry {
    pub name: String,
    pub mean_ns: f64,
    pub median_ns: f64,
    pub std_dev_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
    pub p75_ns: f64,
    pub p90_ns: f64,
    pub p95_ns: f64,
    pub p99_ns: f64,
    pub ops_per_second: f64,
    pub sample_size: usize,
}

impl From<&TaskResult> for BaselineEntry {
    fn from(result: &TaskResult) -> Self {
        let s = &result.stats;
        Self {
            name: result.name.clone(),
            mean_ns: s.mean,
            median_ns: s.median,
            std_dev_ns: s.std_dev,
            min_ns: s.min,
            max_ns: s.max,
            p75_ns: s.p75,
            p90_ns: s.p90,
            p95_ns: s.p95,
            p99_ns: s.p99,
            ops_per_second: s.ops_per_second,
            sample_size: s.sample_size,
        }
    }
}

/// The on-disk snapshot: format version, provenance, and one entry per
/// measured task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Baseline {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub runtime_version: String,
    pub entries: Vec<BaselineEntry>,
}

impl Baseline {
    pub fn entry(&self, name: &str) -> Option<&BaselineEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Options for [`BaselineStore::save`].
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// VCS metadata to record. `None` queries git at save time.
    pub vcs: Option<VcsInfo>,
}

/// Reads and writes `baseline.json` under a fixed directory.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    dir: PathBuf,
}

impl BaselineStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(FILE_NAME)
    }

    /// Snapshot the given results. Tasks with no cleaned samples carry no
    /// usable statistics and are left out of the snapshot.
    pub fn save(
        &self,
        results: &[TaskResult],
        options: &SaveOptions,
    ) -> Result<Baseline, BaselineError> {
        let entries: Vec<BaselineEntry> = results
            .iter()
            .filter(|r| {
                if r.stats.sample_size == 0 {
                    warn!(task = %r.name, "skipping task with no valid samples");
                    false
                } else {
                    true
                }
            })
            .map(BaselineEntry::from)
            .collect();
        if entries.is_empty() {
            return Err(BaselineError::NoResults);
        }

        let vcs = options.vcs.clone().or_else(vcs::git_info);
        let baseline = Baseline {
            version: BASELINE_VERSION,
            timestamp: Utc::now(),
            git_commit: vcs.as_ref().map(|v| v.commit.clone()),
            git_branch: vcs.as_ref().map(|v| v.branch.clone()),
            runtime_version: format!("medir/{}", env!("CARGO_PKG_VERSION")),
            entries,
        };

        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(&baseline)?;
        fs::write(self.path(), json)?;
        info!(
            path = %self.path().display(),
            tasks = baseline.entries.len(),
            "baseline saved"
        );
        Ok(baseline)
    }

    /// Load the stored baseline, if any.
    ///
    /// A missing file is `Ok(None)`. A file that fails to parse or carries
    /// a different format version is deleted and also reported as
    /// `Ok(None)`; only genuine I/O failures surface as errors.
    pub fn load(&self) -> Result<Option<Baseline>, BaselineError> {
        let path = self.path();
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BaselineError::Io(e)),
        };

        let baseline: Baseline = match serde_json::from_str(&contents) {
            Ok(b) => b,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt baseline, removing");
                self.remove(&path);
                return Ok(None);
            }
        };

        if baseline.version != BASELINE_VERSION {
            warn!(
                found = baseline.version,
                expected = BASELINE_VERSION,
                "baseline version mismatch, removing"
            );
            self.remove(&path);
            return Ok(None);
        }

        debug!(tasks = baseline.entries.len(), "baseline loaded");
        Ok(Some(baseline))
    }

    /// Remove the stored baseline. Absence is not an error.
    pub fn delete(&self) -> Result<(), BaselineError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BaselineError::Io(e)),
        }
    }

    fn remove(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove invalid baseline");
            }
        }
    }
}
