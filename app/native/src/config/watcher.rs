//! File watching for hot-reloading.
//!
//! Watches the configuration file and the image folder. Editors and file
//! managers emit bursts of events for a single change, so callbacks run once
//! the path has been quiet for a short debounce window.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::platform::spawn_named_thread;

/// Debounce duration for file changes.
const DEBOUNCE_MS: u64 = 200;

/// Keeps a watch alive. Dropping it stops the watch and its thread.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

/// Calls `on_change` whenever the configuration file at `config_path` changes.
///
/// The parent directory is watched so editors that save by renaming a
/// temporary file are picked up.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created.
pub fn watch_config_file<F>(config_path: &Path, on_change: F) -> notify::Result<FileWatcher>
where F: Fn() + Send + 'static {
    let config_filename: OsString = config_path.file_name().map(OsString::from).unwrap_or_default();
    let watch_path = config_path.parent().unwrap_or(config_path).to_path_buf();

    spawn_watch(
        "config-watch",
        watch_path,
        move |event: &Event| {
            event.paths.iter().any(|p| p.file_name().is_some_and(|name| name == config_filename))
        },
        on_change,
    )
}

/// Calls `on_change` whenever entries in `folder` are created, removed or renamed.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or the folder cannot be watched.
pub fn watch_folder<F>(folder: &Path, on_change: F) -> notify::Result<FileWatcher>
where F: Fn() + Send + 'static {
    spawn_watch(
        "folder-watch",
        folder.to_path_buf(),
        |event: &Event| event.kind.is_create() || event.kind.is_remove() || event.kind.is_modify(),
        on_change,
    )
}

fn spawn_watch<P, F>(
    name: &str,
    watch_path: PathBuf,
    relevant: P,
    on_change: F,
) -> notify::Result<FileWatcher>
where
    P: Fn(&Event) -> bool + Send + 'static,
    F: Fn() + Send + 'static,
{
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(tx)?;
    watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

    tracing::debug!(path = %watch_path.display(), "watching for changes");

    spawn_named_thread(name, move || {
        debounce_events(&rx, Duration::from_millis(DEBOUNCE_MS), &relevant, &on_change);
    })
    .map_err(notify::Error::io)?;

    Ok(FileWatcher { _watcher: watcher })
}

/// Runs until the sender side is dropped.
fn debounce_events<P, F>(
    rx: &Receiver<notify::Result<Event>>,
    window: Duration,
    relevant: &P,
    on_change: &F,
) where
    P: Fn(&Event) -> bool,
    F: Fn(),
{
    let mut pending = false;

    loop {
        let received =
            if pending { rx.recv_timeout(window) } else { rx.recv().map_err(RecvTimeoutError::from) };

        match received {
            Ok(Ok(event)) => {
                if relevant(&event) {
                    pending = true;
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "file watch error");
            }
            Err(RecvTimeoutError::Timeout) => {
                pending = false;
                on_change();
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
