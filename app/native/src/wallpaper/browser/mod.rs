//! Browser new tab background synchronization.
//!
//! Best-effort writers that point a browser's new tab page at the current
//! wallpaper:
//!
//! - [`chromium`] - Edge and Chrome `Preferences` files
//! - [`firefox`] - Firefox `user.js` plus a generated new tab page

pub mod chromium;
pub mod firefox;

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised while rewriting browser profile files.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The browser's profile directory could not be determined.
    #[error("{0} profile directory not found")]
    ProfileDirNotFound(BrowserTarget),
    /// A profile file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A preferences file is not valid JSON.
    #[error("invalid preferences file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A preferences file is valid JSON but not an object.
    #[error("preferences file {0} is not a JSON object")]
    NotAnObject(PathBuf),
}

impl BrowserError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

/// Browsers whose new tab background can follow the wallpaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BrowserTarget {
    Edge,
    Chrome,
    Firefox,
}

impl std::fmt::Display for BrowserTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Edge => write!(f, "Edge"),
            Self::Chrome => write!(f, "Chrome"),
            Self::Firefox => write!(f, "Firefox"),
        }
    }
}

/// Points `target`'s new tab background at `image`.
///
/// `work_dir` holds generated files shared by all profiles (the Firefox new
/// tab page). Returns the number of profiles updated.
///
/// # Errors
///
/// Returns an error if the browser's profile root cannot be located or a file
/// shared by all profiles cannot be written. Individual broken profiles are
/// skipped and logged.
pub fn sync_background(
    target: BrowserTarget,
    image: &Path,
    work_dir: &Path,
) -> Result<usize, BrowserError> {
    match target {
        BrowserTarget::Edge | BrowserTarget::Chrome => {
            let user_data = chromium::user_data_dir(target)
                .ok_or(BrowserError::ProfileDirNotFound(target))?;
            Ok(chromium::apply_to_all_profiles(&user_data, image))
        }
        BrowserTarget::Firefox => {
            let base = firefox::base_dir().ok_or(BrowserError::ProfileDirNotFound(target))?;
            firefox::apply_to_all_profiles(&base, image, work_dir)
        }
    }
}

/// Converts a filesystem path to a percent-encoded `file://` URL.
///
/// Relative paths are made absolute against the working directory first.
#[must_use]
pub fn file_url(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    match Url::from_file_path(&absolute) {
        Ok(url) => url.into(),
        Err(()) => encode_as_path(&absolute),
    }
}

/// Fallback for paths the platform cannot express as a file URL.
fn encode_as_path(path: &Path) -> String {
    let Ok(mut url) = Url::parse("file:///") else {
        return String::new();
    };
    url.set_path(&path.to_string_lossy().replace('\\', "/"));
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_file_url_unix_path() {
        assert_eq!(file_url(Path::new("/home/me/a.png")), "file:///home/me/a.png");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url_escapes_spaces() {
        assert_eq!(
            file_url(Path::new("/home/me/My Pictures/a b.png")),
            "file:///home/me/My%20Pictures/a%20b.png"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url_escapes_reserved_characters() {
        assert_eq!(file_url(Path::new("/pics/#1 sunset.png")), "file:///pics/%231%20sunset.png");
        assert_eq!(file_url(Path::new("/pics/100%.png")), "file:///pics/100%25.png");
        assert_eq!(file_url(Path::new("/pics/why?.png")), "file:///pics/why%3F.png");
        assert_eq!(file_url(Path::new("/pics/\"quoted\".png")), "file:///pics/%22quoted%22.png");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url_escapes_non_ascii() {
        assert_eq!(file_url(Path::new("/pics/café.png")), "file:///pics/caf%C3%A9.png");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url_relative_path_becomes_absolute() {
        let url = file_url(Path::new("a.png"));
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(url, Url::from_file_path(cwd.join("a.png")).unwrap().to_string());
    }

    #[cfg(windows)]
    #[test]
    fn test_file_url_windows_path() {
        assert_eq!(file_url(Path::new(r"C:\Users\me\a b.png")), "file:///C:/Users/me/a%20b.png");
    }

    #[test]
    fn test_browser_target_display_and_serde() {
        assert_eq!(BrowserTarget::Edge.to_string(), "Edge");
        assert_eq!(serde_json::to_string(&BrowserTarget::Firefox).unwrap(), r#""firefox""#);
    }

    #[test]
    fn test_error_display_mentions_browser() {
        let err = BrowserError::ProfileDirNotFound(BrowserTarget::Chrome);
        assert_eq!(err.to_string(), "Chrome profile directory not found");
    }
}
