use serde::Serialize;
use std::fmt;

/// Marker prepended when the initial invocation relaunches itself off the console.
pub const DETACHED_FLAG: &str = "-_detached";

/// Marker prepended when the launcher starts a disposable copy of the image.
pub const TEMPCOPY_FLAG: &str = "-_tempcopy";

/// Which stage of the launch pipeline this process is.
///
/// Decided once from the internal marker flags and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Started by the user.
    Initial,
    /// Relaunched off the console, still running the original image.
    Detached,
    /// Running inside a disposable copy; hosts the actual session.
    DisposableCopy,
}

impl Role {
    pub fn from_flags(tempcopy: bool, detached: bool) -> Self {
        if tempcopy {
            Role::DisposableCopy
        } else if detached {
            Role::Detached
        } else {
            Role::Initial
        }
    }
}

/// Inputs of one application session, fixed after argument parsing.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SessionParams {
    pub base_url: String,
    pub login: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Suggestions offered in the page's `disc_upload` field.
    pub disc_options: Vec<String>,
}

impl SessionParams {
    pub fn has_credentials(&self) -> bool {
        !self.login.is_empty() || !self.password.is_empty()
    }
}

// Hand-written so the password never reaches debug output.
impl fmt::Debug for SessionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionParams")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("disc_options", &self.disc_options)
            .finish()
    }
}
