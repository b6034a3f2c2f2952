//! Autostart CLI commands.

use clap::Subcommand;
use colored::Colorize;

use crate::autostart::AutostartManager;
use crate::cli::output::format_bool;
use crate::config::{self, ConfigError, save_config};
use crate::error::WallshiftError;

/// Login item commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum AutostartCommands {
    /// Start wallshift at login.
    ///
    /// Also sets `autostart` in the configuration file so the daemon keeps
    /// the login item in place.
    Enable,

    /// Stop starting wallshift at login.
    Disable,

    /// Show whether the login item is installed.
    Status,
}

/// Execute autostart subcommands.
///
/// # Errors
///
/// Returns an error if the platform is unsupported or the login item cannot
/// be changed.
pub fn execute(cmd: &AutostartCommands) -> Result<(), WallshiftError> {
    let manager = AutostartManager::new()?;

    match cmd {
        AutostartCommands::Enable => set_enabled(&manager, true),
        AutostartCommands::Disable => set_enabled(&manager, false),
        AutostartCommands::Status => {
            print_status(&manager);
            Ok(())
        }
    }
}

fn set_enabled(manager: &AutostartManager, enabled: bool) -> Result<(), WallshiftError> {
    manager.set_enabled(enabled)?;
    persist_setting(enabled)?;

    match (enabled, manager.target_path()) {
        (true, Some(path)) => println!("Autostart enabled: {}", path.display()),
        (true, None) => println!("Autostart enabled."),
        (false, _) => println!("Autostart disabled."),
    }
    Ok(())
}

/// Stores the choice in the configuration file, if there is one.
fn persist_setting(enabled: bool) -> Result<(), WallshiftError> {
    let (mut settings, path) = match config::load_config() {
        Ok(loaded) => loaded,
        Err(ConfigError::NotFound) => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    if settings.autostart != enabled {
        settings.autostart = enabled;
        save_config(&settings, &path)?;
        tracing::debug!(path = %path.display(), enabled, "autostart setting saved");
    }
    Ok(())
}

fn print_status(manager: &AutostartManager) {
    if !manager.is_supported() {
        println!("{}", "Autostart is not supported on this platform.".yellow());
        return;
    }

    println!("{} {}", "Enabled:".bold(), format_bool(manager.is_enabled()));
    if let Some(path) = manager.target_path() {
        println!("{} {}", "Entry:".bold(), path.display());
    }
}
