use crate::model::{Role, SessionParams};
use crate::orchestrator::{self, OsProcessLauncher};
use crate::{engine, paths, session};
use anyhow::{Context, Result};
use clap::Parser;
use std::ffi::OsString;
use std::io::Write;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const USAGE: &str = r#"Usage example:
  iloviewer -url https://example.com -login username -password pass -discurls "url1;url2"
  iloviewer -debug -url ... (run with console for debugging)"#;

/// Flags that consume the following token as their value.
const VALUE_FLAGS: [&str; 4] = ["url", "login", "password", "discurls"];
const SWITCH_FLAGS: [&str; 5] = ["debug", "_detached", "_tempcopy", "help", "version"];

#[derive(Debug, Parser, Clone)]
#[command(
    name = "iloviewer",
    version,
    about = "Open a web app in an isolated, self-cleaning window",
    after_help = USAGE
)]
pub struct Cli {
    /// Base URL, e.g. https://example.com/
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub url: String,

    /// Login username
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub login: String,

    /// Login password
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub password: String,

    /// Semicolon-separated values offered in the disc_upload field
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub discurls: String,

    /// Stay attached to the console and print diagnostics
    #[arg(
        long,
        default_value_t = false,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub debug: bool,

    #[arg(long = "_detached", hide = true)]
    pub detached: bool,

    #[arg(long = "_tempcopy", hide = true)]
    pub tempcopy: bool,
}

impl Cli {
    /// Parse the raw argument list (program name excluded), accepting `-flag` spellings.
    pub fn parse_raw(raw: &[OsString]) -> Self {
        Self::parse_from(std::iter::once(OsString::from("iloviewer")).chain(normalize_args(raw)))
    }

    pub fn role(&self) -> Role {
        Role::from_flags(self.tempcopy, self.detached)
    }
}

/// Rewrite single-dash long flags (`-url`, `-url=x`) to clap's `--url` form.
///
/// The token after a value-taking flag is passed through untouched even if it starts
/// with a dash.
pub fn normalize_args(raw: &[OsString]) -> Vec<OsString> {
    let mut out = Vec::with_capacity(raw.len());
    let mut value_next = false;
    for arg in raw {
        if value_next {
            value_next = false;
            out.push(arg.clone());
            continue;
        }
        let Some(s) = arg.to_str() else {
            out.push(arg.clone());
            continue;
        };
        let Some(body) = s.strip_prefix("--").or_else(|| s.strip_prefix('-')) else {
            out.push(arg.clone());
            continue;
        };
        let (name, inline_value) = match body.split_once('=') {
            Some((name, _)) => (name, true),
            None => (body, false),
        };
        if VALUE_FLAGS.contains(&name) {
            value_next = !inline_value;
            out.push(format!("--{body}").into());
        } else if SWITCH_FLAGS.contains(&name) {
            out.push(format!("--{body}").into());
        } else {
            out.push(arg.clone());
        }
    }
    out
}

/// Split `a; b;;c` into `[a, b, c]`, dropping blank segments.
pub fn split_disc_options(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn build_params(args: &Cli) -> SessionParams {
    SessionParams {
        base_url: args.url.clone(),
        login: args.login.clone(),
        password: args.password.clone(),
        disc_options: split_disc_options(&args.discurls),
    }
}

/// What this invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No address given: print usage and stop.
    Usage,
    /// Relaunch off the console and exit.
    Detach,
    /// Reap orphans, then run and clean up a disposable copy.
    Supervise,
    /// Host the session in this process.
    Session,
}

pub fn plan(args: &Cli) -> Action {
    if args.url.trim().is_empty() {
        return Action::Usage;
    }
    match args.role() {
        Role::Initial if !args.debug => Action::Detach,
        Role::Initial | Role::Detached => Action::Supervise,
        Role::DisposableCopy => Action::Session,
    }
}

pub fn print_usage(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "{USAGE}")
}

/// Diagnostics go to stdout, and only in debug mode.
fn init_debug_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("iloviewer=debug")),
        )
        .with_writer(std::io::stdout)
        .with_target(false)
        .try_init();
}

pub fn run(args: Cli, raw: &[OsString]) -> Result<()> {
    let action = plan(&args);
    if action == Action::Usage {
        print_usage(&mut std::io::stdout().lock())?;
        return Ok(());
    }
    if args.debug {
        init_debug_logging();
    }
    debug!(role = ?args.role(), ?action, "dispatching");

    match action {
        Action::Usage => Ok(()),
        Action::Detach => {
            let image = paths::current_image()?;
            orchestrator::relaunch_detached(&OsProcessLauncher, &image, raw)
        }
        Action::Supervise => {
            let image = paths::current_image()?;
            let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            rt.block_on(orchestrator::supervise(&image, raw))
        }
        // The window event loop has to own the main thread, so no runtime here.
        Action::Session => session::run(&build_params(&args), &engine::default_engine()),
    }
}
