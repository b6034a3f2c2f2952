#![allow(clippy::multiple_crate_versions)]

//! Wallshift binary.
//!
//! Without a command it runs the rotation daemon in the foreground. With a
//! command (e.g. `wallshift next`) it acts as a client of that daemon.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wallshift_lib::cli::{self, Cli};

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "WALLSHIFT_LOG";

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = cli::run(&cli) {
        eprintln!("wallshift: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
