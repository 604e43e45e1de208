//! Disposable copy lifecycle: copy the image, run the copy, reclaim everything it left.

use super::artifacts::ArtifactFs;
use super::process::{ChildExit, ProcessLauncher};
use super::with_marker;
use crate::model::TEMPCOPY_FLAG;
use crate::paths;
use anyhow::{Context, Result};
use rand::RngCore;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Random bytes in a copy id; hex-encoded this gives 16 characters.
pub const COPY_ID_BYTES: usize = 8;

/// Where one disposable copy and the engine storage bound to it live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    pub id: String,
    pub temp_exe: PathBuf,
    /// `None` when the platform reports no user data root.
    pub storage_dir: Option<PathBuf>,
}

impl CopyPlan {
    pub fn generate(temp_root: &Path, data_root: Option<&Path>) -> Self {
        Self::with_id(random_copy_id(), temp_root, data_root)
    }

    pub fn with_id(id: String, temp_root: &Path, data_root: Option<&Path>) -> Self {
        let temp_exe = paths::disposable_exe_path(temp_root, &id);
        let storage_dir = data_root.and_then(|root| paths::engine_storage_dir(root, &temp_exe));
        Self {
            id,
            temp_exe,
            storage_dir,
        }
    }
}

/// Hex id drawn from the thread-local CSPRNG.
pub fn random_copy_id() -> String {
    let mut b = [0u8; COPY_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut b);
    hex::encode(b)
}

/// How teardown waits out the engine after the child exits.
#[derive(Debug, Clone)]
pub struct TeardownPolicy {
    /// Pause between child exit and the first deletion.
    pub settle_delay: Duration,
    /// Deletion attempts per artifact, at least one.
    pub attempts: u32,
    /// Wait before the second attempt; doubles after every failure.
    pub backoff: Duration,
}

impl Default for TeardownPolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(3),
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtifactKind {
    Directory,
    File,
}

/// A finished disposable-copy run.
#[derive(Debug)]
pub struct CopyRun {
    pub plan: CopyPlan,
    pub exit: ChildExit,
}

pub struct DisposableCopyManager<L, F> {
    launcher: L,
    fs: F,
    policy: TeardownPolicy,
    temp_root: PathBuf,
    data_root: Option<PathBuf>,
}

impl<L: ProcessLauncher, F: ArtifactFs> DisposableCopyManager<L, F> {
    pub fn new(launcher: L, fs: F, temp_root: PathBuf, data_root: Option<PathBuf>) -> Self {
        Self {
            launcher,
            fs,
            policy: TeardownPolicy::default(),
            temp_root,
            data_root,
        }
    }

    pub fn with_policy(mut self, policy: TeardownPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Copy `image`, run the copy with the caller's arguments and block until it exits,
    /// then delete the copy and its engine storage.
    ///
    /// Copy and spawn failures abort the run. Teardown failures are logged and left
    /// for the orphan reaper.
    pub async fn run(&self, image: &Path, raw_args: &[OsString]) -> Result<CopyRun> {
        let plan = CopyPlan::generate(&self.temp_root, self.data_root.as_deref());
        debug!(
            temp_exe = %plan.temp_exe.display(),
            storage_dir = ?plan.storage_dir,
            "preparing disposable copy"
        );

        let bytes = self
            .fs
            .copy_image(image, &plan.temp_exe)
            .await
            .with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    image.display(),
                    plan.temp_exe.display()
                )
            })?;
        debug!(bytes, "image copied");

        let args = with_marker(TEMPCOPY_FLAG, raw_args);
        let exit = match self.launcher.run_to_completion(&plan.temp_exe, &args).await {
            Ok(exit) => exit,
            Err(e) => {
                // Nothing ran, so no engine storage exists yet.
                self.remove_artifact(&plan.temp_exe, ArtifactKind::File).await;
                return Err(e);
            }
        };
        debug!(code = ?exit.code, success = exit.success(), "disposable copy exited");

        self.teardown(&plan).await;
        Ok(CopyRun { plan, exit })
    }

    async fn teardown(&self, plan: &CopyPlan) {
        debug!(delay = ?self.policy.settle_delay, "waiting for the engine to release files");
        tokio::time::sleep(self.policy.settle_delay).await;

        if let Some(dir) = &plan.storage_dir {
            self.remove_artifact(dir, ArtifactKind::Directory).await;
        }
        self.remove_artifact(&plan.temp_exe, ArtifactKind::File).await;
        debug!("cleanup complete");
    }

    /// Best-effort deletion with bounded retries. Returns whether the path is gone.
    async fn remove_artifact(&self, path: &Path, kind: ArtifactKind) -> bool {
        if !self.fs.exists(path).await {
            debug!(path = %path.display(), "not present, nothing to delete");
            return true;
        }

        let attempts = self.policy.attempts.max(1);
        let mut delay = self.policy.backoff;
        for attempt in 1..=attempts {
            let res = match kind {
                ArtifactKind::Directory => self.fs.remove_dir_all(path).await,
                ArtifactKind::File => self.fs.remove_file(path).await,
            };
            match res {
                Ok(()) => {
                    debug!(path = %path.display(), attempt, "deleted");
                    return true;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
                Err(e) if attempt < attempts => {
                    debug!(path = %path.display(), attempt, "delete failed, retrying: {e}");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) => {
                    warn!(path = %path.display(), "giving up on delete: {e}");
                }
            }
        }
        false
    }
}
