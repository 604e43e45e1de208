//! Orphan reaping.
//!
//! Removes disposable copies and engine storage left behind by runs that never reached
//! their own cleanup (killed launcher, locked files, crashes). Ownership is not tracked:
//! anything whose name matches and whose modification time is past the retention
//! window is fair game, so several instances may sweep the same roots at once.

use crate::paths;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, trace};

/// Artifacts younger than this are left alone.
pub const RETENTION: Duration = Duration::from_secs(60 * 60);

/// File name filter: fixed prefix, fixed suffix, non-empty middle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    prefix: String,
    suffix: String,
}

impl NamePattern {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        name.len() > self.prefix.len() + self.suffix.len()
            && name.starts_with(&self.prefix)
            && name.ends_with(&self.suffix)
    }
}

#[derive(Debug, Clone)]
pub struct ReapTarget {
    pub root: PathBuf,
    pub pattern: NamePattern,
}

/// Outcome of one sweep, used for diagnostics only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReapReport {
    pub removed: Vec<PathBuf>,
    pub failed: usize,
}

pub struct Reaper {
    targets: Vec<ReapTarget>,
    retention: Duration,
}

impl Reaper {
    pub fn new(targets: Vec<ReapTarget>, retention: Duration) -> Self {
        Self { targets, retention }
    }

    /// Legacy profile folders and disposable copies in the temp root, plus engine
    /// storage directories in the user data root when one exists.
    pub fn standard(temp_root: &Path, data_root: Option<&Path>) -> Self {
        let mut targets = vec![
            ReapTarget {
                root: temp_root.to_path_buf(),
                pattern: NamePattern::new(paths::legacy_profile_prefix(), ""),
            },
            ReapTarget {
                root: temp_root.to_path_buf(),
                pattern: NamePattern::new(paths::copy_prefix(), std::env::consts::EXE_SUFFIX),
            },
        ];
        if let Some(data_root) = data_root {
            targets.push(ReapTarget {
                root: data_root.to_path_buf(),
                pattern: NamePattern::new(paths::copy_prefix(), ""),
            });
        }
        Self::new(targets, RETENTION)
    }

    pub fn sweep(&self) -> ReapReport {
        self.sweep_at(SystemTime::now())
    }

    /// Delete every matching entry modified strictly before `now - retention`.
    ///
    /// Never fails: unreadable roots are skipped and per-entry errors are counted.
    pub fn sweep_at(&self, now: SystemTime) -> ReapReport {
        let mut report = ReapReport::default();
        let Some(cutoff) = now.checked_sub(self.retention) else {
            return report;
        };
        debug!(cutoff = %format_time(cutoff), "sweeping orphaned artifacts");

        for target in &self.targets {
            let entries = match fs::read_dir(&target.root) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(root = %target.root.display(), "skipping root: {e}");
                    continue;
                }
            };
            for entry in entries.flatten() {
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    continue;
                };
                if !target.pattern.matches(name) {
                    continue;
                }
                reap_entry(&entry.path(), cutoff, &mut report);
            }
        }

        if !report.removed.is_empty() || report.failed > 0 {
            debug!(
                removed = report.removed.len(),
                failed = report.failed,
                "orphan sweep finished"
            );
        }
        report
    }
}

fn reap_entry(path: &Path, cutoff: SystemTime, report: &mut ReapReport) {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return;
    };
    let Ok(modified) = meta.modified() else {
        return;
    };
    if modified >= cutoff {
        trace!(path = %path.display(), "still within retention");
        return;
    }

    let res = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match res {
        Ok(()) => {
            debug!(path = %path.display(), modified = %format_time(modified), "removed orphan");
            report.removed.push(path.to_path_buf());
        }
        // Another instance got there first.
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            debug!(path = %path.display(), "could not remove orphan: {e}");
            report.failed += 1;
        }
    }
}

fn format_time(t: SystemTime) -> String {
    OffsetDateTime::from(t)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "?".into())
}
