//! Login-item installation.
//!
//! Wallshift starts at login through the platform's native mechanism:
//!
//! - Linux: an XDG autostart `.desktop` entry
//! - macOS: a launch agent property list
//! - Windows: a batch file in the Startup folder

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::{APP_BUNDLE_ID, APP_NAME};

/// Errors raised while changing the login item.
#[derive(Debug, Error)]
pub enum AutostartError {
    /// The running platform has no supported login-item mechanism.
    #[error("autostart is not supported on {0}")]
    Unsupported(String),
    /// The login item location could not be determined.
    #[error("cannot locate the {0} directory")]
    MissingDirectory(&'static str),
    /// The path of the running executable is unknown.
    #[error("cannot determine the current executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    /// The login item could not be written or removed.
    #[error("failed to update {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Login-item mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutostartKind {
    DesktopEntry,
    LaunchAgent,
    StartupScript,
    Unsupported(String),
}

impl AutostartKind {
    /// The mechanism for the platform this binary was built for.
    #[must_use]
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Self::DesktopEntry,
            "macos" => Self::LaunchAgent,
            "windows" => Self::StartupScript,
            other => Self::Unsupported(other.to_string()),
        }
    }

    fn default_target(&self) -> Result<PathBuf, AutostartError> {
        match self {
            Self::DesktopEntry => dirs::config_dir()
                .map(|dir| dir.join("autostart").join(format!("{APP_NAME}.desktop")))
                .ok_or(AutostartError::MissingDirectory("config")),
            Self::LaunchAgent => dirs::home_dir()
                .map(|home| {
                    home.join("Library").join("LaunchAgents").join(format!("{APP_BUNDLE_ID}.plist"))
                })
                .ok_or(AutostartError::MissingDirectory("home")),
            Self::StartupScript => dirs::config_dir()
                .map(|appdata| {
                    appdata
                        .join("Microsoft")
                        .join("Windows")
                        .join("Start Menu")
                        .join("Programs")
                        .join("Startup")
                        .join(format!("{APP_NAME}.bat"))
                })
                .ok_or(AutostartError::MissingDirectory("APPDATA")),
            Self::Unsupported(os) => Err(AutostartError::Unsupported(os.clone())),
        }
    }
}

/// Installs and removes the Wallshift login item.
#[derive(Debug, Clone)]
pub struct AutostartManager {
    kind: AutostartKind,
    target: Option<PathBuf>,
    command: Vec<String>,
}

impl AutostartManager {
    /// Creates a manager for this platform that launches `<current exe> run`.
    ///
    /// # Errors
    ///
    /// Returns an error if the current executable cannot be determined.
    pub fn new() -> Result<Self, AutostartError> {
        let exe = std::env::current_exe().map_err(AutostartError::CurrentExe)?;
        let kind = AutostartKind::current();
        let target = kind.default_target().ok();

        Ok(Self::with_target(kind, target, vec![exe.display().to_string(), "run".to_string()]))
    }

    /// Creates a manager writing to an explicit location.
    #[must_use]
    pub const fn with_target(
        kind: AutostartKind,
        target: Option<PathBuf>,
        command: Vec<String>,
    ) -> Self {
        Self { kind, target, command }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self.kind, AutostartKind::Unsupported(_)) && self.target.is_some()
    }

    /// Returns whether the login item exists.
    #[must_use]
    pub fn is_enabled(&self) -> bool { self.target.as_deref().is_some_and(Path::exists) }

    /// Location of the login item.
    #[must_use]
    pub fn target_path(&self) -> Option<&Path> { self.target.as_deref() }

    /// Writes the login item, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform is unsupported or the file cannot be written.
    pub fn enable(&self) -> Result<(), AutostartError> {
        let target = self.require_target()?;
        let content = self.render()?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| AutostartError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(target, content)
            .map_err(|source| AutostartError::Io { path: target.to_path_buf(), source })?;

        tracing::info!(path = %target.display(), "autostart enabled");
        Ok(())
    }

    /// Removes the login item if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform is unsupported or the file cannot be removed.
    pub fn disable(&self) -> Result<(), AutostartError> {
        let target = self.require_target()?;
        if !target.exists() {
            return Ok(());
        }

        fs::remove_file(target)
            .map_err(|source| AutostartError::Io { path: target.to_path_buf(), source })?;

        tracing::info!(path = %target.display(), "autostart disabled");
        Ok(())
    }

    /// Enables or disables the login item.
    ///
    /// # Errors
    ///
    /// See [`AutostartManager::enable`] and [`AutostartManager::disable`].
    pub fn set_enabled(&self, enabled: bool) -> Result<(), AutostartError> {
        if enabled { self.enable() } else { self.disable() }
    }

    fn require_target(&self) -> Result<&Path, AutostartError> {
        if let AutostartKind::Unsupported(os) = &self.kind {
            return Err(AutostartError::Unsupported(os.clone()));
        }
        self.target.as_deref().ok_or(AutostartError::MissingDirectory("autostart"))
    }

    fn render(&self) -> Result<String, AutostartError> {
        match &self.kind {
            AutostartKind::DesktopEntry => Ok(render_desktop_entry(&self.command)),
            AutostartKind::LaunchAgent => Ok(render_launch_agent(&self.command)),
            AutostartKind::StartupScript => Ok(render_startup_script(&self.command)),
            AutostartKind::Unsupported(os) => Err(AutostartError::Unsupported(os.clone())),
        }
    }
}

fn render_desktop_entry(command: &[String]) -> String {
    let exec = command.iter().map(|part| shell_quote(part)).collect::<Vec<_>>().join(" ");

    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name={APP_NAME}\n\
         Exec={exec}\n\
         X-GNOME-Autostart-enabled=true\n\
         Terminal=false\n"
    )
}

fn render_launch_agent(command: &[String]) -> String {
    let arguments: String = command
        .iter()
        .map(|arg| format!("\n        <string>{}</string>", xml_escape(arg)))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple Computer//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{APP_BUNDLE_ID}</string>
    <key>ProgramArguments</key>
    <array>{arguments}
    </array>
    <key>RunAtLoad</key>
    <true/>
</dict>
</plist>
"#
    )
}

fn render_startup_script(command: &[String]) -> String {
    let quoted = command.iter().map(|part| cmd_quote(part)).collect::<Vec<_>>().join(" ");
    format!("@echo off\r\nstart \"\" {quoted}\r\n")
}

/// POSIX shell quoting.
fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg.chars().all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe { arg.to_string() } else { format!("'{}'", arg.replace('\'', r"'\''")) }
}

/// `cmd.exe` argument quoting.
fn cmd_quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('"', "\\\""))
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn command(exe: &str) -> Vec<String> { vec![exe.to_string(), "run".to_string()] }

    #[test]
    fn test_desktop_entry_enable_disable() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("autostart").join("wallshift.desktop");
        let manager = AutostartManager::with_target(
            AutostartKind::DesktopEntry,
            Some(target.clone()),
            command("/opt/my apps/wallshift"),
        );

        assert!(manager.is_supported());
        assert!(!manager.is_enabled());

        manager.enable().unwrap();
        assert!(manager.is_enabled());
        let content = fs::read_to_string(&target).unwrap();
        assert!(content.starts_with("[Desktop Entry]\nType=Application\n"));
        assert!(content.contains("Exec='/opt/my apps/wallshift' run\n"));
        assert!(content.contains("X-GNOME-Autostart-enabled=true\n"));

        manager.disable().unwrap();
        assert!(!manager.is_enabled());
        manager.disable().unwrap();
    }

    #[test]
    fn test_launch_agent_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("com.wallshift.app.plist");
        let manager = AutostartManager::with_target(
            AutostartKind::LaunchAgent,
            Some(target.clone()),
            command("/Applications/Wall & Shift/wallshift"),
        );

        manager.enable().unwrap();
        let content = fs::read_to_string(&target).unwrap();
        assert!(content.contains("<string>com.wallshift.app</string>"));
        assert!(content.contains("<string>/Applications/Wall &amp; Shift/wallshift</string>"));
        assert!(content.contains("<string>run</string>"));
        assert!(content.contains("<key>RunAtLoad</key>\n    <true/>"));
    }

    #[test]
    fn test_startup_script_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("Startup").join("wallshift.bat");
        let manager = AutostartManager::with_target(
            AutostartKind::StartupScript,
            Some(target.clone()),
            command(r"C:\Program Files\wallshift\wallshift.exe"),
        );

        manager.set_enabled(true).unwrap();
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "@echo off\r\nstart \"\" \"C:\\Program Files\\wallshift\\wallshift.exe\" run\r\n"
        );

        manager.set_enabled(false).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_unsupported_platform() {
        let manager = AutostartManager::with_target(
            AutostartKind::Unsupported("plan9".to_string()),
            None,
            command("/bin/wallshift"),
        );

        assert!(!manager.is_supported());
        assert!(!manager.is_enabled());
        let err = manager.enable().unwrap_err();
        assert_eq!(err.to_string(), "autostart is not supported on plan9");
        assert!(matches!(manager.disable(), Err(AutostartError::Unsupported(_))));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/usr/bin/wallshift"), "/usr/bin/wallshift");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_current_kind_matches_platform() {
        let kind = AutostartKind::current();
        if cfg!(target_os = "linux") {
            assert_eq!(kind, AutostartKind::DesktopEntry);
        } else if cfg!(target_os = "macos") {
            assert_eq!(kind, AutostartKind::LaunchAgent);
        }
    }
}
