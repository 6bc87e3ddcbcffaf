//! Binary crate for the `wxfeed` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Logging setup, interrupt handling and exit codes

use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    init_logging(cmd.verbose);

    tokio::select! {
        code = cmd.run() => code,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, remaining locations skipped");
            Ok(ExitCode::from(cli::EXIT_INTERRUPTED))
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
