//! Best-effort git metadata lookup
//!
//! Baselines are annotated with the commit and branch they were recorded
//! at. Not being in a git repository (or git being absent) is normal, so
//! every failure path collapses to `None`.

use std::process::Command;

use tracing::debug;

/// Commit and branch a baseline was recorded at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsInfo {
    pub commit: String,
    pub branch: String,
}

/// Query git for the current HEAD commit and branch name.
pub fn git_info() -> Option<VcsInfo> {
    let commit = git_output(&["rev-parse", "HEAD"])?;
    let branch = git_output(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    Some(VcsInfo { commit, branch })
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        debug!(?args, "git query failed");
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
