//! Recording doubles for the process and filesystem seams.

use super::artifacts::ArtifactFs;
use super::process::{ChildExit, ProcessLauncher};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Copy { to: PathBuf },
    SpawnDetached { program: PathBuf, args: Vec<OsString> },
    ChildStarted { program: PathBuf, args: Vec<OsString> },
    ChildExited,
    RemoveDir(PathBuf),
    RemoveFile(PathBuf),
}

/// Shared state of the fake machine: what happened, and which paths exist.
#[derive(Clone)]
pub struct World {
    steps: Arc<Mutex<Vec<(Step, Instant)>>>,
    present: Arc<Mutex<HashSet<PathBuf>>>,
    data_root: PathBuf,
}

impl World {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            steps: Arc::default(),
            present: Arc::default(),
            data_root: data_root.into(),
        }
    }

    fn record(&self, step: Step) {
        self.steps.lock().unwrap().push((step, Instant::now()));
    }

    pub fn steps(&self) -> Vec<Step> {
        self.steps.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn position(&self, pred: impl Fn(&Step) -> bool) -> Option<usize> {
        self.steps.lock().unwrap().iter().position(|(s, _)| pred(s))
    }

    pub fn time_of(&self, pred: impl Fn(&Step) -> bool) -> Option<Instant> {
        self.steps
            .lock()
            .unwrap()
            .iter()
            .find(|(s, _)| pred(s))
            .map(|(_, t)| *t)
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.present.lock().unwrap().contains(path)
    }
}

pub struct FakeLauncher {
    pub world: World,
    pub fail_spawn: bool,
    pub exit: ChildExit,
}

impl FakeLauncher {
    pub fn new(world: &World) -> Self {
        Self {
            world: world.clone(),
            fail_spawn: false,
            exit: ChildExit { code: Some(0) },
        }
    }
}

#[async_trait]
impl ProcessLauncher for FakeLauncher {
    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> Result<()> {
        if self.fail_spawn {
            bail!("spawn refused");
        }
        self.world.record(Step::SpawnDetached {
            program: program.to_path_buf(),
            args: args.to_vec(),
        });
        Ok(())
    }

    async fn run_to_completion(&self, program: &Path, args: &[OsString]) -> Result<ChildExit> {
        if self.fail_spawn {
            bail!("spawn refused");
        }
        self.world.record(Step::ChildStarted {
            program: program.to_path_buf(),
            args: args.to_vec(),
        });
        // The engine inside the child creates storage named after the image.
        if let Some(name) = program.file_name() {
            let storage = self.world.data_root.join(name);
            self.world.present.lock().unwrap().insert(storage);
        }
        tokio::task::yield_now().await;
        self.world.record(Step::ChildExited);
        Ok(self.exit)
    }
}

pub struct FakeFs {
    pub world: World,
    pub fail_copy: bool,
    /// Removal calls that fail with a sharing violation before one succeeds.
    pub locked_removals: Mutex<u32>,
}

impl FakeFs {
    pub fn new(world: &World) -> Self {
        Self {
            world: world.clone(),
            fail_copy: false,
            locked_removals: Mutex::new(0),
        }
    }

    fn take_lock(&self) -> io::Result<()> {
        let mut locked = self.locked_removals.lock().unwrap();
        if *locked > 0 {
            *locked -= 1;
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "in use"));
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactFs for FakeFs {
    async fn copy_image(&self, _from: &Path, to: &Path) -> io::Result<u64> {
        if self.fail_copy {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only temp"));
        }
        self.world.record(Step::Copy {
            to: to.to_path_buf(),
        });
        self.world.present.lock().unwrap().insert(to.to_path_buf());
        Ok(42)
    }

    async fn exists(&self, path: &Path) -> bool {
        self.world.exists(path)
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.world.record(Step::RemoveDir(path.to_path_buf()));
        self.take_lock()?;
        self.world.present.lock().unwrap().remove(path);
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.world.record(Step::RemoveFile(path.to_path_buf()));
        self.take_lock()?;
        self.world.present.lock().unwrap().remove(path);
        Ok(())
    }
}
