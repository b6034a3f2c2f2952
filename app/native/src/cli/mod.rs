//! Command-line interface for Wallshift.
//!
//! `wallshift` with no command runs the daemon. Control commands talk to a
//! running daemon over the control socket.

mod commands;
mod output;

pub use commands::Cli;

use crate::error::WallshiftError;

/// Executes an already parsed command line.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run(cli: &Cli) -> Result<(), WallshiftError> { cli.execute() }
