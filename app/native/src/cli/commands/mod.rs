//! CLI command definitions using Clap.
//!
//! Commands are organized into submodules:
//!
//! - `autostart` - Login item management
//! - `config_cmd` - Configuration file management
//! - `control` - Commands that drive a running daemon

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::error::WallshiftError;
use crate::{config, daemon, schema};

pub mod autostart;
pub mod config_cmd;
pub mod control;

pub use autostart::AutostartCommands;
pub use config_cmd::ConfigCommands;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wallshift - rotates the desktop wallpaper from a folder of images.
///
/// Running `wallshift` without a command starts the rotation daemon in the
/// foreground. Other commands talk to that daemon over its control socket.
#[derive(Parser, Debug)]
#[command(name = "wallshift")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output. `WALLSHIFT_LOG` takes precedence when set.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Run the rotation daemon in the foreground.
    ///
    /// Applies an image immediately, then keeps rotating until interrupted
    /// with Ctrl-C or `wallshift quit`. This is the default command.
    Run,

    /// Switch to the next image now.
    ///
    /// Without a running daemon, applies one random image from the configured
    /// folder and exits.
    Next,

    /// Re-scan the image folder.
    Refresh,

    /// Resume automatic rotation.
    Start,

    /// Pause automatic rotation. The daemon keeps running.
    Stop,

    /// Show what the daemon is doing.
    Status {
        /// Print the raw status as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Reload the configuration file.
    ///
    /// Re-reads the configuration and applies changes without restarting the
    /// daemon. The daemon also does this on its own when the file changes.
    Reload,

    /// Stop the daemon.
    Quit,

    /// List the images in the configured folder.
    List {
        /// Print the list as a JSON array.
        #[arg(long, short)]
        json: bool,
    },

    /// Configuration file management commands.
    ///
    /// Initialize, locate and inspect the configuration file.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Login item management commands.
    #[command(subcommand)]
    Autostart(AutostartCommands),

    /// Output the configuration JSON Schema.
    ///
    /// Outputs a JSON Schema to stdout that describes the structure of the
    /// configuration file. Can be redirected to a file for use with editors
    /// that support JSON Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Outputs shell completion script to stdout for the specified shell.
    /// Can be used with eval or redirected to a file.
    ///
    /// Usage:
    ///   eval "$(wallshift completions --shell zsh)"
    ///   wallshift completions --shell bash > ~/.local/share/bash-completion/completions/wallshift
    ///   wallshift completions --shell fish > ~/.config/fish/completions/wallshift.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the selected command, defaulting to [`Commands::Run`].
    #[must_use]
    pub fn selected(&self) -> &Commands { self.command.as_ref().unwrap_or(&Commands::Run) }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), WallshiftError> {
        if let Some(path) = &self.config {
            let creates_file = matches!(self.selected(), Commands::Config(ConfigCommands::Init { .. }));
            if !path.exists() && !creates_file {
                return Err(WallshiftError::ConfigError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            config::set_custom_config_path(path.clone());
        }

        match self.selected() {
            Commands::Run => daemon::run_daemon(),
            Commands::Next => control::next(),
            Commands::Refresh => control::refresh(),
            Commands::Start => control::start(),
            Commands::Stop => control::stop(),
            Commands::Status { json } => control::status(*json),
            Commands::Reload => control::reload(),
            Commands::Quit => control::quit(),
            Commands::List { json } => control::list(*json),
            Commands::Config(cmd) => config_cmd::execute(cmd),
            Commands::Autostart(cmd) => autostart::execute(cmd),

            Commands::Schema => {
                let schema_output = schema::print_schema();
                println!("{schema_output}");
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "wallshift", &mut io::stdout());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::try_parse_from(["wallshift"]).unwrap();
        assert!(cli.command.is_none());
        assert!(matches!(cli.selected(), Commands::Run));
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from(["wallshift", "run"]).unwrap();
        assert!(matches!(cli.selected(), Commands::Run));
    }

    #[test]
    fn test_cli_parses_control_commands() {
        let cases = [
            ("next", "Next"),
            ("refresh", "Refresh"),
            ("start", "Start"),
            ("stop", "Stop"),
            ("reload", "Reload"),
            ("quit", "Quit"),
        ];

        for (arg, expected) in cases {
            let cli = Cli::try_parse_from(["wallshift", arg]).unwrap();
            assert_eq!(format!("{:?}", cli.selected()), expected);
        }
    }

    #[test]
    fn test_cli_parses_status_json() {
        let cli = Cli::try_parse_from(["wallshift", "status", "--json"]).unwrap();
        assert!(matches!(cli.selected(), Commands::Status { json: true }));

        let cli = Cli::try_parse_from(["wallshift", "status"]).unwrap();
        assert!(matches!(cli.selected(), Commands::Status { json: false }));
    }

    #[test]
    fn test_cli_parses_list() {
        let cli = Cli::try_parse_from(["wallshift", "list", "-j"]).unwrap();
        assert!(matches!(cli.selected(), Commands::List { json: true }));
    }

    #[test]
    fn test_cli_parses_schema() {
        let cli = Cli::try_parse_from(["wallshift", "schema"]).unwrap();
        assert!(matches!(cli.selected(), Commands::Schema));
    }

    #[test]
    fn test_cli_parses_completions_bash() {
        let cli = Cli::try_parse_from(["wallshift", "completions", "--shell", "bash"]).unwrap();
        match cli.selected() {
            Commands::Completions { shell } => assert_eq!(*shell, Shell::Bash),
            _ => panic!("Expected Completions command"),
        }
    }

    #[test]
    fn test_cli_parses_completions_zsh() {
        let cli = Cli::try_parse_from(["wallshift", "completions", "--shell", "zsh"]).unwrap();
        match cli.selected() {
            Commands::Completions { shell } => assert_eq!(*shell, Shell::Zsh),
            _ => panic!("Expected Completions command"),
        }
    }

    #[test]
    fn test_cli_parses_config_init() {
        let cli = Cli::try_parse_from(["wallshift", "config", "init", "--force"]).unwrap();
        match cli.selected() {
            Commands::Config(ConfigCommands::Init { force, path, stdout }) => {
                assert!(force);
                assert!(path.is_none());
                assert!(!stdout);
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_cli_parses_config_show() {
        let cli = Cli::try_parse_from(["wallshift", "config", "show"]).unwrap();
        assert!(matches!(cli.selected(), Commands::Config(ConfigCommands::Show)));
    }

    #[test]
    fn test_cli_parses_autostart() {
        let cli = Cli::try_parse_from(["wallshift", "autostart", "enable"]).unwrap();
        assert!(matches!(cli.selected(), Commands::Autostart(AutostartCommands::Enable)));

        let cli = Cli::try_parse_from(["wallshift", "autostart", "status"]).unwrap();
        assert!(matches!(cli.selected(), Commands::Autostart(AutostartCommands::Status)));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli =
            Cli::try_parse_from(["wallshift", "status", "--config", "/tmp/w.jsonc", "-v"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/w.jsonc")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["wallshift", "shuffle"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() { Cli::command().debug_assert(); }
}
