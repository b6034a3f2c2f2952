//! Edge and Chrome new tab backgrounds.
//!
//! Chromium browsers keep the custom new tab background in each profile's
//! `Preferences` JSON file. The image is copied into the profile so the browser
//! can read it regardless of where the wallpaper folder lives.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};

use super::{BrowserError, BrowserTarget, file_url};
use crate::constants::SHARED_IMAGE_NAME;

/// Profile directory Chromium uses for internal state; never user-facing.
const SYSTEM_PROFILE: &str = "system profile";

/// Name of the per-profile preferences file.
const PREFERENCES_FILE: &str = "Preferences";

/// Returns the user data directory for a Chromium-family browser.
#[must_use]
pub fn user_data_dir(target: BrowserTarget) -> Option<PathBuf> {
    let (windows, macos, linux): (&[&str], &[&str], &[&str]) = match target {
        BrowserTarget::Edge => (
            &["Microsoft", "Edge", "User Data"],
            &["Microsoft Edge"],
            &["microsoft-edge"],
        ),
        BrowserTarget::Chrome => (
            &["Google", "Chrome", "User Data"],
            &["Google", "Chrome"],
            &["google-chrome"],
        ),
        BrowserTarget::Firefox => return None,
    };

    let (root, parts) = if cfg!(target_os = "windows") {
        (dirs::data_local_dir()?, windows)
    } else if cfg!(target_os = "macos") {
        (dirs::config_dir()?, macos)
    } else {
        (dirs::config_dir()?, linux)
    };

    Some(parts.iter().fold(root, |path, part| path.join(part)))
}

/// Lists the `Preferences` files of all user-facing profiles.
#[must_use]
pub fn preference_files(user_data_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(user_data_dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| !name.to_string_lossy().eq_ignore_ascii_case(SYSTEM_PROFILE))
        })
        .map(|path| path.join(PREFERENCES_FILE))
        .filter(|prefs| prefs.is_file())
        .collect();

    files.sort();
    files
}

/// Rewrites every profile under `user_data_dir`. Returns how many succeeded.
pub fn apply_to_all_profiles(user_data_dir: &Path, image: &Path) -> usize {
    preference_files(user_data_dir)
        .iter()
        .filter(|prefs| match write_background(prefs, image) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "skipping browser profile");
                false
            }
        })
        .count()
}

/// Sets `image` as the custom new tab background in one `Preferences` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or written. Failing to
/// copy the image into the profile is not an error; the original path is used.
pub fn write_background(prefs_path: &Path, image: &Path) -> Result<(), BrowserError> {
    let raw = fs::read_to_string(prefs_path).map_err(|err| BrowserError::io(prefs_path, err))?;
    let mut prefs: Value = serde_json::from_str(&raw).map_err(|source| BrowserError::Json {
        path: prefs_path.to_path_buf(),
        source,
    })?;
    let Some(root) = prefs.as_object_mut() else {
        return Err(BrowserError::NotAnObject(prefs_path.to_path_buf()));
    };

    let image = copy_into_profile(prefs_path, image);
    apply_background_keys(root, &image);

    let serialized = serde_json::to_string_pretty(&prefs).map_err(|source| BrowserError::Json {
        path: prefs_path.to_path_buf(),
        source,
    })?;
    fs::write(prefs_path, serialized).map_err(|err| BrowserError::io(prefs_path, err))
}

fn copy_into_profile(prefs_path: &Path, image: &Path) -> PathBuf {
    let source = fs::canonicalize(image).unwrap_or_else(|_| image.to_path_buf());
    let Some(profile_dir) = prefs_path.parent() else {
        return source;
    };

    let copied = profile_dir.join(SHARED_IMAGE_NAME);
    match fs::copy(&source, &copied) {
        Ok(_) => copied,
        Err(err) => {
            tracing::debug!(error = %err, "using original image path for browser background");
            source
        }
    }
}

fn apply_background_keys(root: &mut Map<String, Value>, image: &Path) {
    let entry = root
        .entry("ntp_custom_background_dict")
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Some(background) = entry.as_object_mut() {
        background.insert("background_url".into(), json!(""));
        background.insert("collection_id".into(), json!(""));
        background.insert("custom_background_local_to_drive".into(), json!(true));
        background.insert("local_background_image_file_url".into(), json!(file_url(image)));
        background.insert(
            "local_background_image_path".into(),
            json!(image.to_string_lossy()),
        );
        background.insert("local_background_image_id".into(), json!(""));
    }

    root.insert("ntp_custom_background_enabled".into(), json!(true));
    root.insert("ntp_custom_background_set_by_admin".into(), json!(false));
    root.insert("ntp_custom_background_disabled_by_policy".into(), json!(false));
    root.insert("ntp_show_background_image".into(), json!(true));
    // 1 = custom background
    root.insert("ntp_background_source".into(), json!(1));
    root.insert("ntp_custom_background_local_to_device".into(), json!(true));
}
