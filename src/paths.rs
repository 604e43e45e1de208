//! Filesystem naming conventions.
//!
//! Cleanup of disposable copies and of the engine's per-image storage depends on these
//! names matching what earlier runs (and the engine itself) produced, so every path the
//! launcher and the reaper look at is derived here.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Prefix shared by every artifact this program leaves in the temp and data roots.
pub const ARTIFACT_PREFIX: &str = "iloviewer";

/// Subdirectory of a copy's engine storage holding per-address session storage.
pub const SESSION_DATA_DIR: &str = "webview_data";

/// Absolute path of the running image.
pub fn current_image() -> Result<PathBuf> {
    std::env::current_exe().context("failed to resolve own executable path")
}

pub fn temp_root() -> PathBuf {
    std::env::temp_dir()
}

/// APPDATA on Windows, the XDG data home or `~/Library/Application Support` elsewhere.
pub fn user_data_root() -> Option<PathBuf> {
    dirs::data_dir()
}

/// Prefix of the disposable copy file names.
pub fn copy_prefix() -> String {
    format!("{ARTIFACT_PREFIX}_")
}

/// Prefix of profile folders written to the temp root by older releases.
pub fn legacy_profile_prefix() -> String {
    format!("{ARTIFACT_PREFIX}_profile_")
}

pub fn disposable_file_name(id: &str) -> String {
    format!("{}{id}{}", copy_prefix(), std::env::consts::EXE_SUFFIX)
}

pub fn disposable_exe_path(temp_root: &Path, id: &str) -> PathBuf {
    temp_root.join(disposable_file_name(id))
}

/// Storage directory the embedded engine creates for a host image.
///
/// The engine names it after the image's full file name, extension included, directly
/// under the user data root. The session's explicit data folder is nested inside it
/// (see [`session_data_dir`]), so it exists whenever a session has run.
pub fn engine_storage_dir(data_root: &Path, image: &Path) -> Option<PathBuf> {
    image.file_name().map(|name| data_root.join(name))
}

/// Inner storage for one target address:
/// `<engine storage of image>/webview_data/<isolation key>`.
///
/// Nesting it under the per-copy storage directory means the launcher's teardown and
/// the reaper's data-root sweep remove it together with the copy.
pub fn session_data_dir(data_root: &Path, image: &Path, isolation_key: &str) -> Result<PathBuf> {
    let copy_storage = engine_storage_dir(data_root, image)
        .with_context(|| format!("executable path has no file name: {}", image.display()))?;
    Ok(copy_storage.join(SESSION_DATA_DIR).join(isolation_key))
}
