//! Configuration template generation.
//!
//! Generates a commented configuration template with all available options.

use std::fs;
use std::path::Path;

/// Generates a configuration template with all options commented out.
#[must_use]
pub fn generate_config_template() -> String {
    r#"// Wallshift Configuration File
// ============================
// This file uses JSONC format (JSON with comments).
// All options below are commented out and show their default values.
// Uncomment and modify the options you want to configure.
//
// Run `wallshift schema` to print the JSON Schema for editor completion.

{
  // ============================================================================
  // Images
  // ============================================================================
  // Folder containing the images to rotate (png, jpg, jpeg, bmp, gif).
  // Relative paths are resolved against this file's directory.
  // "folder": "~",

  // Rescan the folder automatically when images are added or removed
  // "watchFolder": false,

  // ============================================================================
  // Timing
  // ============================================================================
  // "fixed" waits `interval` seconds between changes.
  // "randomized" waits a random number of seconds between `randomMin` and `randomMax`.
  // "mode": "fixed",

  // Seconds between changes in fixed mode (minimum 10)
  // "interval": 300,

  // Randomized mode bounds in seconds (minimum 10, randomMax >= randomMin)
  // "randomMin": 60,
  // "randomMax": 600,

  // Pause rotation while a screensaver is running
  // "pauseOnScreensaver": true,

  // ============================================================================
  // Targets
  // ============================================================================
  // Set the desktop wallpaper
  // "applyWallpaper": true,

  // Also use the image as the browser new tab background
  // "browsers": {
  //   "edge": false,
  //   "chrome": false,
  //   "firefox": false
  // },

  // ============================================================================
  // Startup
  // ============================================================================
  // Start Wallshift when you log in
  // "autostart": false
}
"#
    .to_string()
}

/// Creates a configuration file with the template at the specified path.
///
/// Creates parent directories if they don't exist.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, generate_config_template())
}
