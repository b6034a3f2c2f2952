//! Screensaver detection.
//!
//! The gate is advisory: any detection failure reads as "not active" so a broken
//! detector never stops rotation.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sysinfo::{ProcessesToUpdate, System};

/// Process that runs while the macOS screensaver is showing.
const MACOS_SCREENSAVER_PROCESS: &str = "ScreenSaverEngine";

/// Extension of Windows screensaver executables.
const WINDOWS_SCREENSAVER_EXTENSION: &str = ".scr";

/// GNOME screensaver control binary.
const GNOME_SCREENSAVER_COMMAND: &str = "gnome-screensaver-command";

/// Condition that pauses rotation while true.
pub trait ScreensaverGate: Send + Sync {
    /// Samples the condition now. Implementations must not cache across polls.
    fn is_active(&self) -> bool;
}

/// A gate that never closes, used when pausing is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverActive;

impl ScreensaverGate for NeverActive {
    fn is_active(&self) -> bool { false }
}

/// Wraps a gate so pausing can be turned off without replacing it.
pub struct SwitchableGate<G> {
    enabled: AtomicBool,
    inner: G,
}

impl<G: ScreensaverGate> SwitchableGate<G> {
    #[must_use]
    pub const fn new(inner: G, enabled: bool) -> Self {
        Self { enabled: AtomicBool::new(enabled), inner }
    }

    pub fn set_enabled(&self, enabled: bool) { self.enabled.store(enabled, Ordering::SeqCst); }

    #[must_use]
    pub fn is_enabled(&self) -> bool { self.enabled.load(Ordering::SeqCst) }
}

impl<G: ScreensaverGate> ScreensaverGate for SwitchableGate<G> {
    fn is_active(&self) -> bool { self.is_enabled() && self.inner.is_active() }
}

/// How the system gate samples the screensaver state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Detection {
    /// A process with this exact name is running (macOS).
    ProcessNamed(&'static str),
    /// A process whose name ends with this suffix is running (Windows).
    ProcessSuffix(&'static str),
    /// `gnome-screensaver-command --query` reports an active screensaver.
    GnomeQuery(PathBuf),
    /// Nothing usable on this system.
    Unavailable,
}

/// Best-effort detector for the running platform.
///
/// The detection method is chosen once at construction.
pub struct SystemScreensaverGate {
    method: Detection,
    system: Mutex<System>,
}

impl SystemScreensaverGate {
    /// Picks the detection method for the current platform.
    #[must_use]
    pub fn detect() -> Self {
        let method = if cfg!(target_os = "macos") {
            Detection::ProcessNamed(MACOS_SCREENSAVER_PROCESS)
        } else if cfg!(target_os = "windows") {
            Detection::ProcessSuffix(WINDOWS_SCREENSAVER_EXTENSION)
        } else {
            which::which(GNOME_SCREENSAVER_COMMAND).map_or(Detection::Unavailable, Detection::GnomeQuery)
        };

        tracing::debug!(method = ?method, "screensaver detection selected");

        Self {
            method,
            system: Mutex::new(System::new()),
        }
    }

    fn any_process(&self, matches: impl Fn(&OsStr) -> bool) -> bool {
        let mut system = self.system.lock();
        system.refresh_processes(ProcessesToUpdate::All, true);
        system.processes().values().any(|process| matches(process.name()))
    }
}

impl ScreensaverGate for SystemScreensaverGate {
    fn is_active(&self) -> bool {
        match &self.method {
            Detection::ProcessNamed(name) => self.any_process(|process| process == *name),
            Detection::ProcessSuffix(suffix) => self.any_process(|process| {
                process.to_string_lossy().to_lowercase().ends_with(suffix)
            }),
            Detection::GnomeQuery(command) => gnome_screensaver_active(command),
            Detection::Unavailable => false,
        }
    }
}

fn gnome_screensaver_active(command: &Path) -> bool {
    match Command::new(command).arg("--query").output() {
        Ok(output) => query_reports_active(&String::from_utf8_lossy(&output.stdout)),
        Err(err) => {
            tracing::debug!(error = %err, "screensaver query failed");
            false
        }
    }
}

/// Interprets `gnome-screensaver-command --query` output.
fn query_reports_active(stdout: &str) -> bool { stdout.to_lowercase().contains("is active") }
