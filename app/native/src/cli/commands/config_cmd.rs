//! Config CLI commands.
//!
//! Commands for managing the Wallshift configuration file.

use std::path::PathBuf;

use clap::Subcommand;

use crate::cli::output::print_highlighted_json;
use crate::config::template::{create_config_file, generate_config_template};
use crate::config::{ConfigError, Settings, config_paths, custom_config_path, load_config};
use crate::error::WallshiftError;

/// Config management commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Initialize a new configuration file with all options documented.
    ///
    /// Creates a new configuration file at the default location with all
    /// available options commented out, so every setting is visible and can
    /// be enabled by uncommenting it.
    #[command(
        name = "init",
        after_long_help = r#"Examples:
  wallshift config init              # Create config at default location
  wallshift config init --force      # Overwrite existing config
  wallshift config init --path ~/my-config.jsonc  # Create at custom path
  wallshift config init --stdout     # Print template to stdout"#
    )]
    Init {
        /// Overwrite existing configuration file if it exists.
        #[arg(long, short)]
        force: bool,

        /// Custom path for the configuration file.
        /// If not specified, uses ~/.config/wallshift/config.jsonc
        #[arg(long, short, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the configuration template to stdout instead of writing to a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show the path to the configuration file.
    ///
    /// Displays the paths where Wallshift looks for configuration files,
    /// and indicates which one is currently in use (if any).
    Path,

    /// Print the effective settings as JSON.
    ///
    /// Values missing from the file are shown with their defaults.
    Show,
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cmd: &ConfigCommands) -> Result<(), WallshiftError> {
    match cmd {
        ConfigCommands::Init { force, path, stdout } => {
            if *stdout {
                print_config_template()
            } else {
                init_config(*force, path.clone())
            }
        }
        ConfigCommands::Path => show_config_path(),
        ConfigCommands::Show => show_settings(),
    }
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other CLI functions
fn print_config_template() -> Result<(), WallshiftError> {
    println!("{}", generate_config_template());
    Ok(())
}

/// Resolves where `config init` writes: `--path`, then `--config`, then the
/// preferred search path.
fn init_target(custom_path: Option<PathBuf>) -> PathBuf {
    custom_path
        .or_else(|| custom_config_path().cloned())
        .or_else(|| config_paths().into_iter().next())
        .unwrap_or_else(|| PathBuf::from("config.jsonc"))
}

fn init_config(force: bool, custom_path: Option<PathBuf>) -> Result<(), WallshiftError> {
    let config_path = init_target(custom_path);

    if config_path.exists() && !force {
        return Err(WallshiftError::ConfigError(format!(
            "Configuration file already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        )));
    }

    create_config_file(&config_path).map_err(|e| {
        WallshiftError::ConfigError(format!(
            "Failed to create config file {}: {e}",
            config_path.display()
        ))
    })?;

    println!("Configuration file created at: {}", config_path.display());
    println!("\nAll options are commented out by default.");
    println!("Edit the file and uncomment the options you want to configure.");

    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other CLI functions
fn show_config_path() -> Result<(), WallshiftError> {
    if let Some(path) = custom_config_path() {
        println!("Using configuration file from --config: {}", path.display());
        return Ok(());
    }

    println!("Configuration file search paths (in priority order):\n");

    let paths = config_paths();
    let mut found_config = false;

    for (i, path) in paths.iter().enumerate() {
        let exists = path.exists();
        let marker = if exists && !found_config {
            found_config = true;
            " (active)"
        } else if exists {
            " (exists)"
        } else {
            ""
        };

        println!("  {}. {}{}", i + 1, path.display(), marker);
    }

    if !found_config {
        println!("\nNo configuration file found.");
        println!("Run 'wallshift config init' to create one.");
    }

    Ok(())
}

fn show_settings() -> Result<(), WallshiftError> {
    let settings = match load_config() {
        Ok((settings, _)) => settings,
        Err(ConfigError::NotFound) => Settings::default(),
        Err(err) => return Err(err.into()),
    };

    print_highlighted_json(&serde_json::to_value(&settings)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths_returns_non_empty() {
        let paths = config_paths();
        // Should have at least one path (unless no HOME directory)
        assert!(!paths.is_empty() || std::env::var("HOME").is_err());
    }

    #[test]
    fn test_init_target_prefers_explicit_path() {
        let target = init_target(Some(PathBuf::from("/tmp/custom.jsonc")));
        assert_eq!(target, PathBuf::from("/tmp/custom.jsonc"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.jsonc");
        std::fs::write(&path, "{}").unwrap();

        let err = init_config(false, Some(path.clone())).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");

        init_config(true, Some(path.clone())).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("interval"));
    }
}
