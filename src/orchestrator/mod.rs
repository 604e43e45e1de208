//! Launch pipeline orchestration.
//!
//! The first invocation relaunches itself off the console; the relaunched process reaps
//! stale artifacts, then supervises a disposable copy of the image which hosts the
//! session. The engine binds its storage to the copy's identity, so deleting the copy
//! and that storage afterwards leaves nothing of the session behind.

mod artifacts;
mod detach;
mod disposable;
mod process;
#[cfg(test)]
pub(crate) mod testing;

pub(crate) use artifacts::OsArtifactFs;
pub(crate) use detach::relaunch_detached;
pub(crate) use disposable::DisposableCopyManager;
pub(crate) use process::OsProcessLauncher;

use crate::paths;
use crate::reaper::Reaper;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

/// `marker` followed by the caller's arguments, unmodified.
pub(crate) fn with_marker(marker: &str, raw_args: &[OsString]) -> Vec<OsString> {
    let mut args = Vec::with_capacity(raw_args.len() + 1);
    args.push(OsString::from(marker));
    args.extend_from_slice(raw_args);
    args
}

/// Reap orphans, then run one disposable copy to completion and clean it up.
pub(crate) async fn supervise(image: &Path, raw_args: &[OsString]) -> Result<()> {
    let temp_root = paths::temp_root();
    let data_root = paths::user_data_root();

    let reaper = Reaper::standard(&temp_root, data_root.as_deref());
    let report = tokio::task::spawn_blocking(move || reaper.sweep())
        .await
        .context("orphan sweep task failed")?;
    debug!(removed = report.removed.len(), "orphan sweep done");

    let manager = DisposableCopyManager::new(OsProcessLauncher, OsArtifactFs, temp_root, data_root);
    let run = manager.run(image, raw_args).await?;
    debug!(id = %run.plan.id, code = ?run.exit.code, "session finished");
    Ok(())
}
