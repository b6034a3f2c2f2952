//! Cache directory utilities.
//!
//! Provides a centralized way to get the application's cache directory, which
//! holds the control socket and the shared wallpaper copy handed to browsers.
//! Falls back to `<tmp>/{APP_BUNDLE_ID}/` when no user cache directory exists.

use std::path::PathBuf;

use crate::constants::APP_BUNDLE_ID;

/// Returns the root cache directory for the application.
#[must_use]
pub fn get_cache_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(
        || std::env::temp_dir().join(APP_BUNDLE_ID),
        |cache| cache.join(APP_BUNDLE_ID),
    )
}

/// Returns a cache subdirectory for the given component (e.g. `browser`).
#[must_use]
pub fn get_cache_subdir(subdir: &str) -> PathBuf { get_cache_dir().join(subdir) }
