//! Commands that drive a running daemon over the control socket.

use serde_json::Value;

use crate::cli::output::{print_highlighted_json, print_status};
use crate::config;
use crate::daemon::apply_random_once;
use crate::error::WallshiftError;
use crate::ipc::{self, IpcError, IpcQuery, IpcResponse};
use crate::wallpaper::list_images_in_directory;

/// Sends `query` and unwraps the response payload.
fn query_daemon(query: IpcQuery) -> Result<Value, IpcError> {
    match ipc::send_query(query)? {
        IpcResponse::Success { data } => Ok(data),
        IpcResponse::Error { error } => Err(IpcError::InvalidResponse(error)),
    }
}

fn to_command_error(err: IpcError) -> WallshiftError {
    match err {
        IpcError::AppNotRunning => WallshiftError::IpcError(
            "wallshift is not running. Start it with `wallshift run`.".to_string(),
        ),
        IpcError::InvalidResponse(message) => WallshiftError::CommandError(message),
        other => other.into(),
    }
}

fn require_daemon(query: IpcQuery) -> Result<Value, WallshiftError> {
    query_daemon(query).map_err(to_command_error)
}

/// Advances the daemon, or applies one random image when none is running.
pub fn next() -> Result<(), WallshiftError> {
    let applied = match query_daemon(IpcQuery::Next) {
        Ok(data) => data.as_str().unwrap_or_default().to_string(),
        Err(IpcError::AppNotRunning) => {
            tracing::debug!("no daemon running, applying a single image");
            let loaded = config::load_or_default();
            apply_random_once(&loaded)?.display().to_string()
        }
        Err(err) => return Err(to_command_error(err)),
    };

    println!("{applied}");
    Ok(())
}

pub fn refresh() -> Result<(), WallshiftError> {
    let status = require_daemon(IpcQuery::Refresh)?;
    println!("Found {} images.", status["poolSize"].as_u64().unwrap_or(0));
    Ok(())
}

pub fn start() -> Result<(), WallshiftError> {
    print_status(&require_daemon(IpcQuery::Start)?);
    Ok(())
}

pub fn stop() -> Result<(), WallshiftError> {
    print_status(&require_daemon(IpcQuery::Stop)?);
    Ok(())
}

pub fn status(json: bool) -> Result<(), WallshiftError> {
    let status = require_daemon(IpcQuery::Status)?;
    if json {
        print_highlighted_json(&status);
    } else {
        print_status(&status);
    }
    Ok(())
}

pub fn reload() -> Result<(), WallshiftError> {
    require_daemon(IpcQuery::Reload)?;
    println!("Configuration reloaded.");
    Ok(())
}

pub fn quit() -> Result<(), WallshiftError> {
    require_daemon(IpcQuery::Quit)?;
    println!("wallshift stopped.");
    Ok(())
}

/// Lists the images in the configured folder, in natural order.
///
/// Reads the folder directly so it works without a daemon.
#[allow(clippy::unnecessary_wraps)] // Consistent return type with other CLI functions
pub fn list(json: bool) -> Result<(), WallshiftError> {
    let folder = config::load_or_default().folder();
    let images = list_images_in_directory(&folder);

    if json {
        let paths: Vec<Value> =
            images.iter().map(|path| Value::String(path.display().to_string())).collect();
        print_highlighted_json(&Value::Array(paths));
    } else if images.is_empty() {
        println!("No images found in {}.", folder.display());
    } else {
        for image in &images {
            println!("{}", image.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_running_error_suggests_run() {
        let err = to_command_error(IpcError::AppNotRunning);
        assert!(matches!(err, WallshiftError::IpcError(_)));
        assert!(err.to_string().contains("wallshift run"));
    }

    #[test]
    fn test_daemon_error_is_passed_through() {
        let err = to_command_error(IpcError::InvalidResponse("no images found in /x".to_string()));
        assert_eq!(err.to_string(), "no images found in /x");
    }

    #[test]
    fn test_transport_error_keeps_context() {
        let err = to_command_error(IpcError::Timeout);
        assert!(err.to_string().contains("timed out"));
    }
}
