//! Applying a chosen image to the desktop and browsers.
//!
//! The scheduler hands every pick to a [`WallpaperSink`]. Sinks are
//! best-effort: failures are logged here and never reach the scheduler.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use parking_lot::RwLock;
use thiserror::Error;

use super::browser::{self, BrowserError, BrowserTarget};
use crate::constants::SHARED_IMAGE_NAME;

/// Receives every image the scheduler picks.
pub trait WallpaperSink: Send + Sync {
    /// Applies `path`. Must not panic and must not block for long.
    fn apply(&self, path: &Path);
}

/// Errors raised while applying an image.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The image file does not exist.
    #[error("wallpaper file not found: {0}")]
    FileNotFound(PathBuf),
    /// The shared copy for browsers could not be written.
    #[error("failed to write shared image {path}: {source}")]
    SharedCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The operating system rejected the wallpaper.
    #[error("failed to set wallpaper: {0}")]
    SetWallpaperFailed(String),
    /// A browser profile could not be updated.
    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// What the system sink does with each image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkOptions {
    /// Set the OS desktop wallpaper.
    pub apply_wallpaper: bool,
    /// Browsers whose new tab background follows the wallpaper.
    pub browsers: Vec<BrowserTarget>,
}

impl Default for SinkOptions {
    fn default() -> Self { Self { apply_wallpaper: true, browsers: Vec::new() } }
}

/// Sink for the running platform.
pub struct SystemWallpaperSink {
    options: RwLock<SinkOptions>,
    shared_dir: PathBuf,
}

impl SystemWallpaperSink {
    /// Creates a sink that keeps browser files in `shared_dir`.
    #[must_use]
    pub fn new(options: SinkOptions, shared_dir: PathBuf) -> Self {
        tracing::debug!(
            platform = std::env::consts::OS,
            shared_dir = %shared_dir.display(),
            "wallpaper sink selected"
        );
        Self { options: RwLock::new(options), shared_dir }
    }

    /// Replaces the options used for subsequent images.
    pub fn update(&self, options: SinkOptions) { *self.options.write() = options; }

    /// Returns the options currently in effect.
    #[must_use]
    pub fn options(&self) -> SinkOptions { self.options.read().clone() }

    /// Applies `path`, returning the first failure.
    ///
    /// Browser targets are attempted even if setting the desktop wallpaper
    /// failed. The shared PNG copy is only written when a browser needs it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or any step fails.
    pub fn try_apply(&self, path: &Path) -> Result<(), SinkError> {
        if !path.is_file() {
            return Err(SinkError::FileNotFound(path.to_path_buf()));
        }

        let options = self.options();
        let mut first_error = None;

        if options.apply_wallpaper
            && let Err(err) = set_desktop_wallpaper(path)
        {
            first_error.get_or_insert(err);
        }

        if options.browsers.is_empty() {
            return first_error.map_or(Ok(()), Err);
        }

        let shared = match write_shared_copy(path, &self.shared_dir) {
            Ok(shared) => Some(shared),
            Err(err) => {
                first_error.get_or_insert(err);
                None
            }
        };

        let browser_image = shared.as_deref().unwrap_or(path);
        for target in &options.browsers {
            match browser::sync_background(*target, browser_image, &self.shared_dir) {
                Ok(profiles) => {
                    tracing::debug!(browser = %target, profiles, "browser background updated");
                }
                Err(err) => {
                    first_error.get_or_insert(err.into());
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl WallpaperSink for SystemWallpaperSink {
    fn apply(&self, path: &Path) {
        match self.try_apply(path) {
            Ok(()) => tracing::info!(path = %path.display(), "wallpaper applied"),
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "failed to apply wallpaper");
            }
        }
    }
}

/// Sets the desktop wallpaper through the OS.
///
/// # Errors
///
/// Returns an error if the OS call fails.
pub fn set_desktop_wallpaper(path: &Path) -> Result<(), SinkError> {
    let path_str = path.display().to_string();

    wallpaper::set_from_path(&path_str).map_err(|e| SinkError::SetWallpaperFailed(e.to_string()))
}

/// Writes a PNG copy of `source` into `dir` and returns its path.
///
/// Images that cannot be decoded are copied byte for byte.
///
/// # Errors
///
/// Returns an error if neither the conversion nor the raw copy succeeds.
pub fn write_shared_copy(source: &Path, dir: &Path) -> Result<PathBuf, SinkError> {
    let target = dir.join(SHARED_IMAGE_NAME);
    let io_err = |source| SinkError::SharedCopy { path: target.clone(), source };

    fs::create_dir_all(dir).map_err(io_err)?;

    let converted = image::open(source)
        .and_then(|img| img.save_with_format(&target, ImageFormat::Png));

    if let Err(err) = converted {
        tracing::debug!(error = %err, "png conversion failed, copying raw image");
        fs::copy(source, &target).map_err(io_err)?;
    }

    Ok(target)
}
