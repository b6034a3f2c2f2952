//! Error types for Wallshift.
//!
//! Library modules keep their own narrow error enums; this module provides the
//! unified error the CLI reports to the user.

use serde::Serialize;
use thiserror::Error;

use crate::autostart::AutostartError;
use crate::config::ConfigError;
use crate::ipc::IpcError;
use crate::wallpaper::{SinkError, TimingError};

/// Errors that can occur during command execution.
///
/// Serializes as `{"kind": ..., "message": ...}` so control-socket clients get
/// structured error information.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum WallshiftError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Wallpaper operation failed.
    #[error("Wallpaper error: {0}")]
    WallpaperError(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Autostart installation failed.
    #[error("Autostart error: {0}")]
    AutostartError(String),
    /// IPC communication error.
    #[error("IPC error: {0}")]
    IpcError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<std::io::Error> for WallshiftError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for WallshiftError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<ConfigError> for WallshiftError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<TimingError> for WallshiftError {
    fn from(err: TimingError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<AutostartError> for WallshiftError {
    fn from(err: AutostartError) -> Self { Self::AutostartError(err.to_string()) }
}

impl From<SinkError> for WallshiftError {
    fn from(err: SinkError) -> Self { Self::WallpaperError(err.to_string()) }
}

impl From<IpcError> for WallshiftError {
    fn from(err: IpcError) -> Self { Self::IpcError(err.to_string()) }
}

impl From<String> for WallshiftError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for WallshiftError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_display() {
        let err = WallshiftError::InvalidArguments("Cannot combine --json and --plain".to_string());
        assert_eq!(err.to_string(), "Cannot combine --json and --plain");
    }

    #[test]
    fn test_wallpaper_error_display() {
        let err = WallshiftError::WallpaperError("No images in folder".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Wallpaper error"));
        assert!(msg.contains("No images in folder"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err: WallshiftError = io_err.into();
        assert!(matches!(err, WallshiftError::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_timing_error_becomes_config_error() {
        let err: WallshiftError = TimingError::BelowMinimum { field: "interval", value: 3 }.into();
        assert!(matches!(err, WallshiftError::ConfigError(_)));
        assert!(err.to_string().contains("interval"));
    }

    #[test]
    fn test_autostart_error_conversion() {
        let err: WallshiftError = AutostartError::Unsupported("plan9".to_string()).into();
        assert!(matches!(err, WallshiftError::AutostartError(_)));
        assert!(err.to_string().contains("plan9"));
    }

    #[test]
    fn test_from_str() {
        let err: WallshiftError = "test error".into();
        assert!(matches!(err, WallshiftError::CommandError(_)));
    }

    #[test]
    fn test_error_serializes_with_kind() {
        let err = WallshiftError::IpcError("socket closed".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("IpcError"));
        assert!(json.contains("socket closed"));
    }
}
