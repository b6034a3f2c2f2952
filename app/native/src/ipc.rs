//! Control socket for CLI<->daemon communication.
//!
//! The daemon listens on a Unix domain socket in the cache directory. Each
//! connection carries one JSON query line and receives one JSON response line:
//!
//! ```json
//! {"type": "status"}
//! {"data": {"state": "waiting", "poolSize": 12, ...}}
//! {"error": "invalid query"}
//! ```
//!
//! If the socket is missing or refuses connections, no daemon is running.
//! Non-Unix platforms have no control socket.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::get_cache_dir;

/// Socket filename within the cache directory.
const SOCKET_FILENAME: &str = "wallshift.sock";

/// Default timeout for socket operations in milliseconds.
#[cfg_attr(not(unix), allow(dead_code))]
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Number of retry attempts for transient connection failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retry attempts in milliseconds.
const RETRY_DELAY_MS: u64 = 100;

/// Queries the CLI can send to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IpcQuery {
    /// Check that the daemon is running.
    Ping,
    /// Scheduler status snapshot.
    Status,
    /// Change the wallpaper now.
    Next,
    /// Rescan the image folder.
    Refresh,
    /// Resume rotation.
    Start,
    /// Pause rotation.
    Stop,
    /// Re-read the configuration file.
    Reload,
    /// Shut the daemon down.
    Quit,
}

/// Response from the daemon to the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpcResponse {
    /// Successful response with data.
    Success { data: serde_json::Value },
    /// Error response.
    Error { error: String },
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(data: impl Serialize) -> Self {
        Self::Success {
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self { Self::Error { error: message.into() } }
}

/// Errors from the control socket.
#[derive(Debug, Error)]
pub enum IpcError {
    /// No daemon is listening.
    #[error("wallshift is not running")]
    AppNotRunning,
    /// Another daemon already owns the socket.
    #[error("wallshift is already running ({0})")]
    AlreadyRunning(PathBuf),
    /// The daemon did not answer in time.
    #[error("connection timed out")]
    Timeout,
    /// Socket I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The peer sent something that is not a valid message.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// This platform has no Unix domain sockets.
    #[error("the control socket is not supported on {0}")]
    Unsupported(&'static str),
}

/// Gets the default path of the control socket.
#[must_use]
pub fn get_socket_path() -> PathBuf { get_cache_dir().join(SOCKET_FILENAME) }

/// Sends a query to the daemon on the default socket.
///
/// # Errors
///
/// Returns [`IpcError::AppNotRunning`] when no daemon answers.
pub fn send_query(query: IpcQuery) -> Result<IpcResponse, IpcError> {
    send_query_to(&get_socket_path(), query)
}

/// Sends a query to the daemon listening on `socket_path`.
///
/// Automatically retries on transient connection failures (up to 3 attempts).
///
/// # Errors
///
/// Returns [`IpcError::AppNotRunning`] when no daemon answers, or the
/// transport error.
pub fn send_query_to(socket_path: &Path, query: IpcQuery) -> Result<IpcResponse, IpcError> {
    let mut last_error = IpcError::AppNotRunning;

    for attempt in 0..MAX_RETRIES {
        match imp::send_query_once(socket_path, query) {
            Ok(response) => return Ok(response),
            Err(e) => {
                last_error = e;

                // Only connection failures are worth retrying.
                if !matches!(last_error, IpcError::AppNotRunning) || !socket_path.exists() {
                    break;
                }

                if attempt < MAX_RETRIES - 1 {
                    std::thread::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS));
                }
            }
        }
    }

    Err(last_error)
}

/// Checks if a daemon answers on `socket_path`.
#[must_use]
pub fn is_app_running(socket_path: &Path) -> bool {
    matches!(imp::send_query_once(socket_path, IpcQuery::Ping), Ok(IpcResponse::Success { .. }))
}

pub use imp::ControlServer;

#[cfg(unix)]
mod imp {
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::{UnixListener, UnixStream};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::{DEFAULT_TIMEOUT_MS, IpcError, IpcQuery, IpcResponse, is_app_running};
    use crate::platform::spawn_named_thread;

    /// Listening side of the control socket. Dropping it stops the server.
    pub struct ControlServer {
        path: PathBuf,
        running: Arc<AtomicBool>,
    }

    impl ControlServer {
        /// Binds `path` and serves queries on a background thread.
        ///
        /// A stale socket file left by a crashed daemon is replaced.
        ///
        /// # Errors
        ///
        /// Returns [`IpcError::AlreadyRunning`] if a live daemon owns the
        /// socket, or the bind error.
        pub fn start<F>(path: &Path, handler: F) -> Result<Self, IpcError>
        where F: Fn(IpcQuery) -> IpcResponse + Send + Sync + 'static {
            if path.exists() {
                if is_app_running(path) {
                    return Err(IpcError::AlreadyRunning(path.to_path_buf()));
                }
                std::fs::remove_file(path)?;
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let listener = UnixListener::bind(path)?;
            let running = Arc::new(AtomicBool::new(true));

            tracing::info!(path = %path.display(), "control socket listening");

            let handler = Arc::new(handler);
            let server_running = Arc::clone(&running);
            spawn_named_thread("ipc-server", move || {
                server_loop(&listener, &server_running, &handler);
            })?;

            Ok(Self { path: path.to_path_buf(), running })
        }

        #[must_use]
        pub fn path(&self) -> &Path { &self.path }

        /// Stops accepting connections and removes the socket file.
        pub fn stop(&self) {
            if !self.running.swap(false, Ordering::SeqCst) {
                return;
            }
            // Wake the blocking accept so the loop sees the flag.
            let _ = UnixStream::connect(&self.path);
            let _ = std::fs::remove_file(&self.path);
            tracing::debug!("control socket closed");
        }
    }

    impl Drop for ControlServer {
        fn drop(&mut self) { self.stop(); }
    }

    fn server_loop<F>(listener: &UnixListener, running: &AtomicBool, handler: &Arc<F>)
    where F: Fn(IpcQuery) -> IpcResponse + Send + Sync + 'static {
        for stream in listener.incoming() {
            if !running.load(Ordering::SeqCst) {
                break;
            }

            match stream {
                Ok(stream) => {
                    let handler = Arc::clone(handler);
                    let _ = spawn_named_thread("ipc-client", move || {
                        handle_connection(&stream, handler.as_ref());
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "control socket connection error");
                }
            }
        }
    }

    fn handle_connection<F>(stream: &UnixStream, handler: &F)
    where F: Fn(IpcQuery) -> IpcResponse {
        let _ = stream.set_read_timeout(Some(Duration::from_millis(DEFAULT_TIMEOUT_MS)));

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() {
            return;
        }

        let response = match serde_json::from_str::<IpcQuery>(line.trim()) {
            Ok(query) => {
                tracing::debug!(?query, "control query received");
                handler(query)
            }
            Err(e) => IpcResponse::error(format!("Invalid query: {e}")),
        };

        let response_json = serde_json::to_string(&response)
            .unwrap_or_else(|_| r#"{"error":"Failed to serialize response"}"#.to_string());

        let mut stream = reader.into_inner();
        let _ = writeln!(stream, "{response_json}");
    }

    pub(super) fn send_query_once(
        socket_path: &Path,
        query: IpcQuery,
    ) -> Result<IpcResponse, IpcError> {
        if !socket_path.exists() {
            return Err(IpcError::AppNotRunning);
        }

        let mut stream = UnixStream::connect(socket_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::NotFound
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset => IpcError::AppNotRunning,
            _ => IpcError::Io(e),
        })?;

        let timeout = Duration::from_millis(DEFAULT_TIMEOUT_MS);
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;

        let query_json = serde_json::to_string(&query)
            .map_err(|e| IpcError::InvalidResponse(format!("Failed to serialize query: {e}")))?;

        writeln!(stream, "{query_json}").map_err(|e| {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                IpcError::AppNotRunning
            } else {
                IpcError::Io(e)
            }
        })?;

        let mut reader = BufReader::new(stream);
        let mut response_line = String::new();
        reader.read_line(&mut response_line).map_err(|e| match e.kind() {
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => IpcError::Timeout,
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
                IpcError::AppNotRunning
            }
            _ => IpcError::Io(e),
        })?;

        serde_json::from_str(response_line.trim())
            .map_err(|e| IpcError::InvalidResponse(format!("Failed to parse response: {e}")))
    }
}

#[cfg(not(unix))]
mod imp {
    use std::path::Path;

    use super::{IpcError, IpcQuery, IpcResponse};

    /// Placeholder; the control socket needs Unix domain sockets.
    pub struct ControlServer;

    impl ControlServer {
        /// Always fails on this platform.
        ///
        /// # Errors
        ///
        /// Always returns [`IpcError::Unsupported`].
        pub fn start<F>(_path: &Path, _handler: F) -> Result<Self, IpcError>
        where F: Fn(IpcQuery) -> IpcResponse + Send + Sync + 'static {
            Err(IpcError::Unsupported(std::env::consts::OS))
        }

        pub fn stop(&self) {}
    }

    pub(super) fn send_query_once(
        _socket_path: &Path,
        _query: IpcQuery,
    ) -> Result<IpcResponse, IpcError> {
        Err(IpcError::AppNotRunning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_path() {
        let path = get_socket_path();
        assert!(path.to_string_lossy().ends_with("wallshift.sock"));
    }

    #[test]
    fn test_ipc_query_serialization() {
        assert_eq!(serde_json::to_string(&IpcQuery::Status).unwrap(), r#"{"type":"status"}"#);
        let query: IpcQuery = serde_json::from_str(r#"{"type":"refresh"}"#).unwrap();
        assert_eq!(query, IpcQuery::Refresh);
        assert!(serde_json::from_str::<IpcQuery>(r#"{"type":"explode"}"#).is_err());
    }

    #[test]
    fn test_ipc_response_serialization() {
        let response = IpcResponse::success(vec![1, 2, 3]);
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"data":[1,2,3]}"#);

        let response = IpcResponse::error("Not found");
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"error":"Not found"}"#);

        let parsed: IpcResponse = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(parsed, IpcResponse::error("boom"));
    }

    #[test]
    fn test_app_not_running_when_no_socket() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing.sock");

        assert!(!is_app_running(&path));
        assert!(matches!(send_query_to(&path, IpcQuery::Ping), Err(IpcError::AppNotRunning)));
    }

    #[cfg(unix)]
    #[test]
    fn test_server_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ctl.sock");

        let server = ControlServer::start(&path, |query| match query {
            IpcQuery::Ping => IpcResponse::success("pong"),
            IpcQuery::Status => IpcResponse::success(serde_json::json!({ "state": "waiting" })),
            _ => IpcResponse::error("unsupported"),
        })
        .unwrap();

        assert!(is_app_running(&path));
        assert_eq!(
            send_query_to(&path, IpcQuery::Ping).unwrap(),
            IpcResponse::success("pong")
        );
        let IpcResponse::Success { data } = send_query_to(&path, IpcQuery::Status).unwrap() else {
            panic!("expected success");
        };
        assert_eq!(data["state"], "waiting");
        assert_eq!(
            send_query_to(&path, IpcQuery::Quit).unwrap(),
            IpcResponse::error("unsupported")
        );

        server.stop();
        assert!(!path.exists());
        assert!(!is_app_running(&path));
    }

    #[cfg(unix)]
    #[test]
    fn test_second_server_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ctl.sock");

        let _first = ControlServer::start(&path, |_| IpcResponse::success("pong")).unwrap();
        let second = ControlServer::start(&path, |_| IpcResponse::success("pong"));

        assert!(matches!(second, Err(IpcError::AlreadyRunning(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_socket_is_replaced() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ctl.sock");
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        let _server = ControlServer::start(&path, |_| IpcResponse::success("pong")).unwrap();
        assert!(is_app_running(&path));
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_query_gets_error_response() {
        use std::io::{BufRead, BufReader, Write};

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ctl.sock");
        let _server = ControlServer::start(&path, |_| IpcResponse::success("pong")).unwrap();

        let mut stream = std::os::unix::net::UnixStream::connect(&path).unwrap();
        writeln!(stream, "not json").unwrap();
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).unwrap();

        assert!(line.contains("Invalid query"));
    }
}
