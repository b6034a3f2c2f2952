//! Configuration for Wallshift.
//!
//! Settings are read from a JSONC file (JSON with `//` and `/* */` comments)
//! and can be hot-reloaded while the daemon runs.

mod settings;
pub mod template;
mod watcher;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use settings::{
    BrowserSettings, ConfigError, Settings, config_paths, load_config as load_config_default,
    load_config_from_path, save_config,
};
pub use watcher::{FileWatcher, watch_config_file, watch_folder};

/// Custom config path override (set via CLI --config flag).
static CUSTOM_CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Sets a custom configuration file path to use instead of the default search paths.
///
/// Returns `false` if a path was already set.
pub fn set_custom_config_path(path: PathBuf) -> bool { CUSTOM_CONFIG_PATH.set(path).is_ok() }

/// Returns the `--config` override, if any.
pub fn custom_config_path() -> Option<&'static PathBuf> { CUSTOM_CONFIG_PATH.get() }

/// Loads the configuration from the override path or the default search paths.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no file exists, or the read/parse error.
pub fn load_config() -> Result<(Settings, PathBuf), ConfigError> {
    custom_config_path().map_or_else(load_config_default, |path| load_config_from_path(path))
}

/// Settings together with the file they came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub settings: Settings,
    /// The file that was read, or the template that was created.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Directory relative folder paths are resolved against.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .or_else(dirs::home_dir)
            .unwrap_or_default()
    }

    /// The configured image folder as an absolute path where possible.
    #[must_use]
    pub fn folder(&self) -> PathBuf { self.settings.folder_path(&self.base_dir()) }
}

/// Loads the configuration, falling back to defaults.
///
/// If no configuration file exists, a commented template is written to the
/// preferred location. Invalid files are reported and ignored, but their path
/// is kept so the file is still watched and relative folders still resolve.
#[must_use]
pub fn load_or_default() -> LoadedConfig {
    if let Some(path) = config_source() {
        return load_or_default_from(path);
    }

    let path = config_paths().into_iter().next().and_then(create_config_template);
    if path.is_none() {
        tracing::debug!("no config path available for creating template");
    }
    LoadedConfig { settings: Settings::default(), path }
}

/// The `--config` override, or the first existing file on the search path.
fn config_source() -> Option<PathBuf> {
    custom_config_path().cloned().or_else(|| config_paths().into_iter().find(|path| path.exists()))
}

fn load_or_default_from(path: PathBuf) -> LoadedConfig {
    match load_config_from_path(&path) {
        Ok((settings, path)) => {
            tracing::debug!(path = %path.display(), "configuration loaded");
            LoadedConfig { settings, path: Some(path) }
        }
        Err(ConfigError::NotFound) => {
            LoadedConfig { settings: Settings::default(), path: create_config_template(path) }
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "failed to load configuration, using defaults"
            );
            LoadedConfig { settings: Settings::default(), path: Some(path) }
        }
    }
}

/// Writes the commented template to `config_path` unless a file is already there.
fn create_config_template(config_path: PathBuf) -> Option<PathBuf> {
    if config_path.exists() {
        return Some(config_path);
    }

    match template::create_config_file(&config_path) {
        Ok(()) => {
            tracing::info!(path = %config_path.display(), "created default configuration file");
            Some(config_path)
        }
        Err(err) => {
            tracing::debug!(
                error = %err,
                path = %config_path.display(),
                "failed to create default configuration file"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_not_found_message() {
        let msg = ConfigError::NotFound.to_string();
        assert!(msg.contains("No configuration file found"));
    }

    #[test]
    fn test_loaded_config_resolves_folder_against_file() {
        let loaded = LoadedConfig {
            settings: Settings { folder: "walls".to_string(), ..Settings::default() },
            path: Some(PathBuf::from("/home/me/.config/wallshift/config.json")),
        };

        assert_eq!(loaded.base_dir(), PathBuf::from("/home/me/.config/wallshift"));
        assert_eq!(loaded.folder(), PathBuf::from("/home/me/.config/wallshift/walls"));
    }

    #[test]
    fn test_loaded_config_without_file_uses_home() {
        let loaded = LoadedConfig { settings: Settings::default(), path: None };
        assert_eq!(loaded.base_dir(), dirs::home_dir().unwrap_or_default());
    }

    #[test]
    fn test_broken_file_keeps_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.jsonc");
        std::fs::write(&path, "{ \"folder\": \"walls\", oops }").unwrap();

        let loaded = load_or_default_from(path.clone());

        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.settings, Settings::default());
        assert_eq!(loaded.base_dir(), dir.path());
    }

    #[test]
    fn test_valid_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.jsonc");
        std::fs::write(&path, "{\n  // pictures\n  \"folder\": \"walls\"\n}").unwrap();

        let loaded = load_or_default_from(path.clone());

        assert_eq!(loaded.settings.folder, "walls");
        assert_eq!(loaded.folder(), dir.path().join("walls"));
    }

    #[test]
    fn test_missing_file_gets_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.jsonc");

        let loaded = load_or_default_from(path.clone());

        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert!(path.exists());
        assert!(load_config_from_path(&path).is_ok());
    }
}
