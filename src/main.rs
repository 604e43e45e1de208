mod cli;
mod engine;
mod model;
mod orchestrator;
mod paths;
mod reaper;
mod session;

use std::ffi::OsString;

fn main() {
    let raw: Vec<OsString> = std::env::args_os().skip(1).collect();
    let args = cli::Cli::parse_raw(&raw);
    let debug = args.debug;

    if let Err(e) = cli::run(args, &raw) {
        // Without -debug there is usually no console to report to.
        if debug {
            tracing::error!("launch aborted: {e:#}");
        }
        std::process::exit(1);
    }
}
