//! Image discovery.
//!
//! The catalog is a stateless lister: it reports which files in a folder can
//! be used as wallpapers. Presentation order is decided by the pool.

use std::fs;
use std::path::{Path, PathBuf};

use natord::compare;

/// Supported image file extensions (compared case-insensitively).
const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Source of candidate wallpaper images.
pub trait ImageCatalog: Send + Sync {
    /// Lists the eligible images in `folder`.
    ///
    /// A missing folder, or a path that is not a directory, yields an empty list.
    fn list(&self, folder: &Path) -> Vec<PathBuf>;
}

/// Lists image files directly inside a directory on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryCatalog;

impl ImageCatalog for DirectoryCatalog {
    fn list(&self, folder: &Path) -> Vec<PathBuf> { list_images_in_directory(folder) }
}

/// Returns whether the file has one of the supported image extensions.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Lists all supported image files in a directory, in natural order.
///
/// Subdirectories are not descended into.
#[must_use]
pub fn list_images_in_directory(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut images = Vec::new();

    match fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() && is_supported_image(&path) {
                    images.push(path);
                }
            }
        }
        Err(err) => {
            tracing::debug!(folder = %dir.display(), error = %err, "failed to read image folder");
        }
    }

    images.sort_by(|a, b| compare(a.to_string_lossy().as_ref(), b.to_string_lossy().as_ref()));
    images
}
