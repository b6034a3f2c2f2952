//! Firefox new tab backgrounds.
//!
//! Firefox has no preference for a new tab image, so a small HTML page showing
//! the wallpaper is generated and every profile's `user.js` is pointed at it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{BrowserError, file_url};
use crate::constants::FIREFOX_NEWTAB_NAME;

const PROFILES_INI: &str = "profiles.ini";
const USER_JS: &str = "user.js";

/// Matches `user_pref("name",` and captures the name. ASCII classes only, as
/// the `regex` build has no Unicode Perl classes.
static USER_PREF_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"^[ \t]*user_pref\([ \t]*"([^"]+)"[ \t]*,"#).ok());

/// Name of the preference set by a `user_pref(...)` line.
fn pref_name(line: &str) -> Option<&str> {
    let caps = USER_PREF_RE.as_ref()?.captures(line)?;
    caps.get(1).map(|name| name.as_str())
}

/// A preference value written to `user.js`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl PrefValue {
    fn to_js(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Str(value) => {
                format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
            }
        }
    }
}

/// Returns the directory holding `profiles.ini` on this platform.
#[must_use]
pub fn base_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::config_dir().map(|dir| dir.join("Mozilla").join("Firefox"))
    } else if cfg!(target_os = "macos") {
        dirs::config_dir().map(|dir| dir.join("Firefox"))
    } else {
        dirs::home_dir().map(|dir| dir.join(".mozilla").join("firefox"))
    }
}

#[derive(Debug, Default)]
struct ProfileSection {
    path: Option<String>,
    is_relative: bool,
    is_default: bool,
}

/// Lists profile directories from `profiles.ini`, default profile first.
#[must_use]
pub fn locate_profiles(base: &Path) -> Vec<PathBuf> {
    let Ok(ini) = fs::read_to_string(base.join(PROFILES_INI)) else {
        return Vec::new();
    };

    let mut sections: Vec<ProfileSection> = Vec::new();
    let mut in_profile = false;

    for line in ini.lines().map(str::trim) {
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_profile = name.starts_with("Profile");
            if in_profile {
                sections.push(ProfileSection { is_relative: true, ..ProfileSection::default() });
            }
            continue;
        }
        if !in_profile {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some(section) = sections.last_mut() else {
            continue;
        };
        match key.trim() {
            "Path" => section.path = Some(value.trim().to_string()),
            "IsRelative" => section.is_relative = value.trim() == "1",
            "Default" => section.is_default = value.trim() == "1",
            _ => {}
        }
    }

    // Stable sort keeps file order within each group.
    sections.sort_by_key(|section| !section.is_default);

    sections
        .into_iter()
        .filter_map(|section| {
            let path = section.path?;
            Some(if section.is_relative { base.join(path) } else { PathBuf::from(path) })
        })
        .filter(|dir| dir.is_dir())
        .collect()
}

/// Writes the new tab page showing `image` into `dir` and returns its path.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_newtab_html(dir: &Path, image: &Path) -> Result<PathBuf, BrowserError> {
    fs::create_dir_all(dir).map_err(|err| BrowserError::io(dir, err))?;

    let html = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>New Tab</title>\n\
         <style>\n\
         html, body {{ margin: 0; height: 100%; }}\n\
         body {{ background: url(\"{}\") center center / cover no-repeat fixed; }}\n\
         </style>\n\
         </head>\n\
         <body></body>\n\
         </html>\n",
        file_url(image)
    );

    let path = dir.join(FIREFOX_NEWTAB_NAME);
    fs::write(&path, html).map_err(|err| BrowserError::io(&path, err))?;
    Ok(path)
}

/// Preferences that make Firefox open `newtab` for new tabs.
#[must_use]
pub fn newtab_prefs(newtab: &Path) -> Vec<(&'static str, PrefValue)> {
    vec![
        ("toolkit.legacyUserProfileCustomizations.stylesheets", PrefValue::Bool(true)),
        ("browser.newtabpage.activity-stream.newTabURL", PrefValue::Str(file_url(newtab))),
        ("browser.newtabpage.enabled", PrefValue::Bool(true)),
        ("browser.newtabpage.activity-stream.enabled", PrefValue::Bool(true)),
    ]
}

/// Merges `prefs` into the `user.js` at `path`.
///
/// Existing lines for the same preference names are replaced; every other line
/// is kept in place.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, or cannot be written.
pub fn merge_user_prefs(path: &Path, prefs: &[(&str, PrefValue)]) -> Result<(), BrowserError> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(BrowserError::io(path, err)),
    };

    let mut lines: Vec<String> = existing
        .lines()
        .filter(|line| {
            pref_name(line).is_none_or(|name| !prefs.iter().any(|(key, _)| *key == name))
        })
        .map(str::to_string)
        .collect();

    lines.extend(
        prefs
            .iter()
            .map(|(key, value)| format!("user_pref(\"{key}\", {});", value.to_js())),
    );

    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).map_err(|err| BrowserError::io(path, err))
}

/// Updates every profile under `base`. Returns how many succeeded.
///
/// # Errors
///
/// Returns an error if the shared new tab page cannot be written.
pub fn apply_to_all_profiles(
    base: &Path,
    image: &Path,
    work_dir: &Path,
) -> Result<usize, BrowserError> {
    let profiles = locate_profiles(base);
    if profiles.is_empty() {
        tracing::debug!(base = %base.display(), "no firefox profiles found");
        return Ok(0);
    }

    let newtab = write_newtab_html(work_dir, image)?;
    let prefs = newtab_prefs(&newtab);

    Ok(profiles
        .iter()
        .filter(|profile| match merge_user_prefs(&profile.join(USER_JS), &prefs) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "skipping firefox profile");
                false
            }
        })
        .count())
}
