use std::io;
use std::thread::{self, JoinHandle};

use crate::constants::APP_NAME;

/// Spawns a thread named `wallshift-{name}`.
///
/// # Errors
///
/// Returns the OS error when the thread cannot be created; it is also logged.
pub fn spawn_named_thread<F>(name: &str, task: F) -> io::Result<JoinHandle<()>>
where F: FnOnce() + Send + 'static {
    let thread_name = format!("{APP_NAME}-{name}");

    thread::Builder::new().name(thread_name.clone()).spawn(task).inspect_err(|err| {
        tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
    })
}
