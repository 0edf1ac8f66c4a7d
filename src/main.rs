//! nbody CLI - gravitational N-body simulation.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nbody_sim::cli::{run_cli, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    run_cli(cli)
}
