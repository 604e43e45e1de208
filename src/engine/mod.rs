//! Embedded web engine boundary.
//!
//! The engine is opaque to the rest of the program: it gets a window description, an
//! address, a one-time init script and a storage directory, and blocks until the user
//! closes the window.

#[cfg(feature = "webview")]
mod webview;

use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Address loaded once the window is up, credentials included.
    pub address: String,
    /// Runs in every document before page scripts.
    pub init_script: String,
    /// Cookies, cache and local storage go here.
    pub data_dir: PathBuf,
    pub accept_invalid_certs: bool,
}

pub trait Engine {
    /// Show the window and block until it is closed.
    fn run(&self, config: EngineConfig) -> Result<()>;
}

#[cfg(feature = "webview")]
pub fn default_engine() -> impl Engine {
    webview::WryEngine
}

#[cfg(not(feature = "webview"))]
pub fn default_engine() -> impl Engine {
    Unavailable
}

#[cfg(not(feature = "webview"))]
struct Unavailable;

#[cfg(not(feature = "webview"))]
impl Engine for Unavailable {
    fn run(&self, _config: EngineConfig) -> Result<()> {
        anyhow::bail!("built without the `webview` feature; no engine available")
    }
}
