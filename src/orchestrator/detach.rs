//! First-stage relaunch off the console.

use super::process::ProcessLauncher;
use super::with_marker;
use crate::model::DETACHED_FLAG;
use anyhow::Result;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

/// Re-execute `image` with the caller's arguments plus the detached marker.
///
/// Returns as soon as the spawn has been issued; the caller is expected to exit.
pub fn relaunch_detached(
    launcher: &dyn ProcessLauncher,
    image: &Path,
    raw_args: &[OsString],
) -> Result<()> {
    let args = with_marker(DETACHED_FLAG, raw_args);
    debug!(image = %image.display(), "relaunching detached");
    launcher.spawn_detached(image, &args)
}
