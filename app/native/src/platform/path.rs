//! Path utilities for shell-like path expansion.
//!
//! Settings store the image folder as the user typed it (`~/Pictures`,
//! `wallpapers`, an absolute path). These helpers turn that into a usable path.

use std::path::{Path, PathBuf};

/// Expands a leading `~` to the user's home directory.
///
/// Absolute and relative paths are returned unchanged; surrounding whitespace
/// is trimmed and an empty input yields an empty path.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Expands `~` and resolves what is still relative against `base_dir`.
///
/// Used to interpret the configured folder relative to the directory that
/// holds the configuration file.
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let expanded = expand(path);

    if expanded.as_os_str().is_empty() || expanded.is_absolute() {
        return expanded;
    }

    base_dir.join(expanded)
}
