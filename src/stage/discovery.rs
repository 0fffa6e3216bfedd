//! Locating stage output written by tools into timestamped directories.

use glob::glob;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::artifacts::normalize_separators;
use crate::errors::StageError;

/// Bounded polling used while waiting for a tool's file writes to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_secs(1),
        }
    }
}

impl PollPolicy {
    /// Upper bound on how long a poll blocks the evaluation pass.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.attempts
    }
}

/// A run directory created by a tool, with its modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Most recently modified directory directly under `root`.
///
/// Returns `Ok(None)` when `root` is missing or holds no directories. Ties
/// on modification time go to the entry that sorts last by name.
pub fn latest_run_directory(root: &Path) -> Result<Option<RunDirectory>, StageError> {
    if !root.is_dir() {
        return Ok(None);
    }

    let escaped = glob::Pattern::escape(&root.to_string_lossy());
    let pattern = format!("{}/*", escaped.trim_end_matches('/'));

    let entries = glob(&pattern).map_err(|e| StageError::DiscoveryFailed {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let latest = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let modified = path.metadata().and_then(|m| m.modified()).ok()?;
            Some(RunDirectory {
                path: normalize_separators(&path),
                modified,
            })
        })
        .max_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

    Ok(latest)
}

/// Wait for `path` to exist, checking once per interval.
///
/// Blocks for at most `policy.max_wait()`. Returns whether the file showed up.
pub async fn poll_for_file(path: &Path, policy: PollPolicy) -> bool {
    for attempt in 0..policy.attempts {
        if path.exists() {
            return true;
        }
        tracing::debug!(path = %path.display(), attempt = attempt + 1, "waiting for stage output");
        tokio::time::sleep(policy.interval).await;
    }
    path.exists()
}
