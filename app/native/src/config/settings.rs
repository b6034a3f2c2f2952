//! Settings type and file loading.

use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::APP_NAME;
use crate::platform::expand_and_resolve;
use crate::wallpaper::timing::{
    DEFAULT_INTERVAL_SECONDS, DEFAULT_RANDOM_MAX_SECONDS, DEFAULT_RANDOM_MIN_SECONDS,
};
use crate::wallpaper::{BrowserTarget, SinkOptions, TimingError, TimingMode, TimingPolicy};

/// Browsers whose new tab background follows the wallpaper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BrowserSettings {
    /// Microsoft Edge.
    /// Default: false
    pub edge: bool,

    /// Google Chrome.
    /// Default: false
    pub chrome: bool,

    /// Mozilla Firefox.
    /// Default: false
    pub firefox: bool,
}

impl BrowserSettings {
    /// Returns the enabled browsers.
    #[must_use]
    pub fn targets(&self) -> Vec<BrowserTarget> {
        [
            (self.edge, BrowserTarget::Edge),
            (self.chrome, BrowserTarget::Chrome),
            (self.firefox, BrowserTarget::Firefox),
        ]
        .into_iter()
        .filter_map(|(enabled, target)| enabled.then_some(target))
        .collect()
    }
}

/// Root configuration for Wallshift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Folder containing the images to rotate.
    /// Relative paths are resolved against the configuration file's directory.
    /// Default: "~"
    pub folder: String,

    /// Seconds between changes in fixed mode (minimum 10).
    /// Default: 300
    pub interval: u64,

    /// How waits are computed: "fixed" or "randomized".
    /// Default: "fixed"
    pub mode: TimingMode,

    /// Lower bound of the randomized wait in seconds (minimum 10).
    /// Default: 60
    pub random_min: u64,

    /// Upper bound of the randomized wait in seconds.
    /// Default: 600
    pub random_max: u64,

    /// Whether to set the desktop wallpaper.
    /// Default: true
    pub apply_wallpaper: bool,

    /// Pause rotation while a screensaver is running.
    /// Default: true
    pub pause_on_screensaver: bool,

    /// Rescan the folder when files are added or removed.
    /// Default: false
    pub watch_folder: bool,

    /// Start Wallshift when the user logs in.
    /// Default: false
    pub autostart: bool,

    /// New tab background synchronization.
    pub browsers: BrowserSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folder: "~".to_string(),
            interval: DEFAULT_INTERVAL_SECONDS,
            mode: TimingMode::Fixed,
            random_min: DEFAULT_RANDOM_MIN_SECONDS,
            random_max: DEFAULT_RANDOM_MAX_SECONDS,
            apply_wallpaper: true,
            pause_on_screensaver: true,
            watch_folder: false,
            autostart: false,
            browsers: BrowserSettings::default(),
        }
    }
}

impl Settings {
    /// Builds the timing policy described by these settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the active mode's bounds are invalid.
    pub fn timing_policy(&self) -> Result<TimingPolicy, TimingError> {
        let policy = TimingPolicy {
            mode: self.mode,
            fixed_seconds: self.interval,
            min_seconds: self.random_min,
            max_seconds: self.random_max,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Returns the image folder, resolving relative paths against `base_dir`.
    #[must_use]
    pub fn folder_path(&self, base_dir: &Path) -> PathBuf {
        expand_and_resolve(&self.folder, base_dir)
    }

    /// Options for the wallpaper sink.
    #[must_use]
    pub fn sink_options(&self) -> SinkOptions {
        SinkOptions {
            apply_wallpaper: self.apply_wallpaper,
            browsers: self.browsers.targets(),
        }
    }
}

/// Errors that can occur when loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/wallshift/config.json, \
         the platform configuration directory, or ~/.wallshift.json"
    )]
    NotFound,
    /// The configuration file exists but could not be read or written.
    #[error("Failed to access configuration file: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Configuration file names in the home directory.
const HOME_CONFIG_FILE_NAMES: &[&str] = &[".wallshift.jsonc", ".wallshift.json"];

/// Returns the possible configuration file paths in priority order.
///
/// The function checks the following locations (both `.jsonc` and `.json` variants):
/// 1. `$XDG_CONFIG_HOME/wallshift/` if the variable is set
/// 2. `~/.config/wallshift/`
/// 3. the platform configuration directory (`~/Library/Application Support` on macOS,
///    `%APPDATA%` on Windows)
/// 4. `~/.wallshift.jsonc` or `~/.wallshift.json`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut push_dir = |dir: PathBuf| {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    };

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        push_dir(PathBuf::from(xdg_config).join(APP_NAME));
    }

    if let Some(home) = dirs::home_dir() {
        push_dir(home.join(".config").join(APP_NAME));
    }

    if let Some(config_dir) = dirs::config_dir() {
        push_dir(config_dir.join(APP_NAME));
    }

    if let Some(home) = dirs::home_dir() {
        for filename in HOME_CONFIG_FILE_NAMES {
            paths.push(home.join(filename));
        }
    }

    paths
}

/// Loads the configuration from the first available config file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any of the expected
/// locations, or the error from [`load_config_from_path`] for the first file found.
pub fn load_config() -> Result<(Settings, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            return load_config_from_path(&path);
        }
    }

    Err(ConfigError::NotFound)
}

/// Loads the configuration from a specific file.
///
/// The file may contain `//` and `/* */` comments.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist, `ConfigError::IoError` if it
/// cannot be read and `ConfigError::ParseError` if it is not valid JSON.
pub fn load_config_from_path(path: &Path) -> Result<(Settings, PathBuf), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }

    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    let settings: Settings = serde_json::from_reader(reader)?;

    Ok((settings, path.to_path_buf()))
}

/// Writes `settings` to `path` as pretty-printed JSON.
///
/// Comments in an existing file are not preserved.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_config(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut json = serde_json::to_string_pretty(settings)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}
