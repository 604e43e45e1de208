//! Process spawning seam.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

/// Exit of an awaited child, kept only for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl ChildExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Start `program` off the current console and return without waiting.
    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> Result<()>;

    /// Start `program` and resolve once it has exited.
    async fn run_to_completion(&self, program: &Path, args: &[OsString]) -> Result<ChildExit>;
}

pub struct OsProcessLauncher;

#[async_trait]
impl ProcessLauncher for OsProcessLauncher {
    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> Result<()> {
        let mut cmd = std::process::Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach_from_console(&mut cmd);
        // Dropping the handle neither waits for nor kills the child.
        cmd.spawn()
            .with_context(|| format!("failed to relaunch {}", program.display()))?;
        Ok(())
    }

    async fn run_to_completion(&self, program: &Path, args: &[OsString]) -> Result<ChildExit> {
        let status = tokio::process::Command::new(program)
            .args(args)
            .status()
            .await
            .with_context(|| format!("failed to launch {}", program.display()))?;
        Ok(ChildExit {
            code: status.code(),
        })
    }
}

#[cfg(windows)]
fn detach_from_console(cmd: &mut std::process::Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

/// Moves the child into its own process group, so Ctrl-C and other job control signals
/// sent to the foreground group miss it. The controlling terminal is kept: closing the
/// terminal can still deliver SIGHUP, which only `setsid` in the child would prevent.
/// Standard streams are nulled by the caller.
#[cfg(unix)]
fn detach_from_console(cmd: &mut std::process::Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(any(unix, windows)))]
fn detach_from_console(_cmd: &mut std::process::Command) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<OsString> {
        vec!["-c".into(), script.into()]
    }

    #[tokio::test]
    async fn awaited_child_reports_exit_code() {
        let exit = OsProcessLauncher
            .run_to_completion(Path::new("/bin/sh"), &sh("exit 3"))
            .await
            .unwrap();
        assert_eq!(exit, ChildExit { code: Some(3) });
        assert!(!exit.success());
    }

    #[test]
    fn detached_spawn_returns_without_waiting() {
        OsProcessLauncher
            .spawn_detached(Path::new("/bin/sh"), &sh("sleep 1"))
            .unwrap();
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let err = OsProcessLauncher
            .spawn_detached(Path::new("/nonexistent/iloviewer"), &[])
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to relaunch"));
    }
}
