//! The long-running wallshift process.
//!
//! Wires the configuration, the rotation scheduler, the control socket and the
//! file watchers together, then blocks until Ctrl-C or a `quit` query.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rand::seq::IndexedRandom;
use tokio::sync::Notify;

use crate::autostart::AutostartManager;
use crate::cache::get_cache_subdir;
use crate::config::{self, FileWatcher, LoadedConfig, watch_config_file, watch_folder};
use crate::error::WallshiftError;
use crate::ipc::{self, ControlServer, IpcError, IpcQuery, IpcResponse};
use crate::wallpaper::{
    DirectoryCatalog, RotationScheduler, SwitchableGate, SystemScreensaverGate,
    SystemWallpaperSink, TimingPolicy, list_images_in_directory,
};

/// Cache subdirectory holding the shared copy and browser files.
const SHARED_SUBDIR: &str = "browser";

struct FolderWatch {
    folder: PathBuf,
    _watcher: FileWatcher,
}

/// Running daemon state shared with the control socket and watchers.
pub struct Daemon {
    loaded: Mutex<LoadedConfig>,
    scheduler: Arc<RotationScheduler>,
    sink: Arc<SystemWallpaperSink>,
    gate: Arc<SwitchableGate<SystemScreensaverGate>>,
    folder_watch: Mutex<Option<FolderWatch>>,
    quit: Notify,
}

impl Daemon {
    /// Builds a stopped daemon from `loaded`.
    ///
    /// An invalid timing policy is reported and replaced by the default one.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler cannot be created.
    pub fn build(loaded: LoadedConfig, shared_dir: PathBuf) -> Result<Self, WallshiftError> {
        let settings = &loaded.settings;
        let sink = Arc::new(SystemWallpaperSink::new(settings.sink_options(), shared_dir));
        let gate = Arc::new(SwitchableGate::new(
            SystemScreensaverGate::detect(),
            settings.pause_on_screensaver,
        ));

        let policy = settings.timing_policy().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "invalid timing settings, using defaults");
            TimingPolicy::default()
        });

        let scheduler = Arc::new(RotationScheduler::new(
            loaded.folder(),
            policy,
            Arc::new(DirectoryCatalog),
            gate.clone(),
            sink.clone(),
        )?);

        let daemon = Self {
            loaded: Mutex::new(loaded),
            scheduler,
            sink,
            gate,
            folder_watch: Mutex::new(None),
            quit: Notify::new(),
        };
        daemon.update_folder_watch();

        Ok(daemon)
    }

    #[must_use]
    pub fn scheduler(&self) -> &RotationScheduler { &self.scheduler }

    /// Answers one control-socket query.
    pub fn handle(&self, query: IpcQuery) -> IpcResponse {
        tracing::debug!(?query, "control query");

        match query {
            IpcQuery::Ping => IpcResponse::success("pong"),
            IpcQuery::Status => IpcResponse::success(self.scheduler.status()),
            IpcQuery::Next => self.scheduler.advance_now().map_or_else(
                || {
                    IpcResponse::error(format!(
                        "no images found in {}",
                        self.scheduler.folder().display()
                    ))
                },
                IpcResponse::success,
            ),
            IpcQuery::Refresh => {
                self.scheduler.refresh();
                IpcResponse::success(self.scheduler.status())
            }
            IpcQuery::Start => match self.scheduler.start() {
                Ok(()) => IpcResponse::success(self.scheduler.status()),
                Err(err) => IpcResponse::error(format!("failed to start rotation: {err}")),
            },
            IpcQuery::Stop => {
                self.scheduler.stop();
                IpcResponse::success(self.scheduler.status())
            }
            IpcQuery::Reload => match self.reload() {
                Ok(()) => IpcResponse::success(self.scheduler.status()),
                Err(err) => IpcResponse::error(err.to_string()),
            },
            IpcQuery::Quit => {
                self.quit.notify_one();
                IpcResponse::success("bye")
            }
        }
    }

    /// Re-reads the configuration file and applies it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds invalid timing
    /// values. The running configuration is kept in that case.
    pub fn reload(&self) -> Result<(), WallshiftError> {
        let (settings, path) = config::load_config()?;
        self.apply(LoadedConfig { settings, path: Some(path) })?;
        self.sync_autostart();
        tracing::info!("configuration reloaded");
        Ok(())
    }

    /// Applies new settings to the running components.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving everything unchanged, if the timing values
    /// are invalid.
    pub fn apply(&self, loaded: LoadedConfig) -> Result<(), WallshiftError> {
        let settings = &loaded.settings;
        self.scheduler.configure(settings.timing_policy()?)?;
        self.scheduler.set_folder(loaded.folder());
        self.sink.update(settings.sink_options());
        self.gate.set_enabled(settings.pause_on_screensaver);

        *self.loaded.lock() = loaded;
        self.update_folder_watch();
        Ok(())
    }

    /// Installs or removes the autostart entry to match the settings.
    pub fn sync_autostart(&self) {
        let wanted = self.loaded.lock().settings.autostart;

        let result = AutostartManager::new().and_then(|manager| {
            if !manager.is_supported() || manager.is_enabled() == wanted {
                return Ok(());
            }
            manager.set_enabled(wanted)
        });

        if let Err(err) = result {
            tracing::warn!(error = %err, enabled = wanted, "failed to update autostart");
        }
    }

    fn update_folder_watch(&self) {
        let (enabled, folder) = {
            let loaded = self.loaded.lock();
            (loaded.settings.watch_folder, loaded.folder())
        };

        let mut slot = self.folder_watch.lock();
        if !enabled {
            *slot = None;
            return;
        }
        if slot.as_ref().is_some_and(|watch| watch.folder == folder) {
            return;
        }

        let scheduler = Arc::downgrade(&self.scheduler);
        *slot = match watch_folder(&folder, move || {
            if let Some(scheduler) = scheduler.upgrade() {
                tracing::debug!("image folder changed");
                scheduler.refresh();
            }
        }) {
            Ok(watcher) => Some(FolderWatch { folder, _watcher: watcher }),
            Err(err) => {
                tracing::warn!(error = %err, folder = %folder.display(), "cannot watch image folder");
                None
            }
        };
    }

    fn config_path(&self) -> Option<PathBuf> { self.loaded.lock().path.clone() }
}

/// Runs the daemon in the foreground until interrupted.
///
/// # Errors
///
/// Returns an error if another daemon is already running or the rotation
/// cannot be started.
pub fn run_daemon() -> Result<(), WallshiftError> {
    let loaded = config::load_or_default();
    let daemon = Arc::new(Daemon::build(loaded, get_cache_subdir(SHARED_SUBDIR))?);
    daemon.sync_autostart();

    let _server = start_control_server(&daemon)?;
    let _config_watch = daemon.config_path().and_then(|path| start_config_watch(&daemon, &path));

    daemon.scheduler.start()?;
    let waited = wait_for_shutdown(&daemon.quit);
    daemon.scheduler.stop();

    tracing::info!("wallshift stopped");
    waited
}

fn start_control_server(daemon: &Arc<Daemon>) -> Result<Option<ControlServer>, WallshiftError> {
    let weak: Weak<Daemon> = Arc::downgrade(daemon);
    let handler = move |query| {
        weak.upgrade()
            .map_or_else(|| IpcResponse::error("wallshift is shutting down"), |d| d.handle(query))
    };

    match ControlServer::start(&ipc::get_socket_path(), handler) {
        Ok(server) => Ok(Some(server)),
        Err(err @ IpcError::AlreadyRunning(_)) => Err(err.into()),
        Err(err) => {
            tracing::warn!(error = %err, "control socket unavailable");
            Ok(None)
        }
    }
}

fn start_config_watch(daemon: &Arc<Daemon>, path: &Path) -> Option<FileWatcher> {
    let weak = Arc::downgrade(daemon);
    let watched = watch_config_file(path, move || {
        if let Some(daemon) = weak.upgrade()
            && let Err(err) = daemon.reload()
        {
            tracing::warn!(error = %err, "configuration not reloaded");
        }
    });

    match watched {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "cannot watch configuration file");
            None
        }
    }
}

/// Blocks until Ctrl-C or a `quit` notification.
fn wait_for_shutdown(quit: &Notify) -> Result<(), WallshiftError> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    runtime.block_on(async {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => tracing::info!("interrupt received"),
                Err(err) => {
                    tracing::warn!(error = %err, "cannot listen for Ctrl-C");
                    quit.notified().await;
                }
            },
            () = quit.notified() => tracing::info!("quit requested"),
        }
    });

    Ok(())
}

/// Applies one random image from the configured folder without a daemon.
///
/// # Errors
///
/// Returns an error if the folder has no images or applying fails.
pub fn apply_random_once(loaded: &LoadedConfig) -> Result<PathBuf, WallshiftError> {
    apply_random_from(loaded, get_cache_subdir(SHARED_SUBDIR))
}

fn apply_random_from(loaded: &LoadedConfig, shared_dir: PathBuf) -> Result<PathBuf, WallshiftError> {
    let folder = loaded.folder();
    let images = list_images_in_directory(&folder);
    let image = images.choose(&mut rand::rng()).ok_or_else(|| {
        WallshiftError::WallpaperError(format!("no images found in {}", folder.display()))
    })?;

    SystemWallpaperSink::new(loaded.settings.sink_options(), shared_dir).try_apply(image)?;
    Ok(image.clone())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::config::Settings;
    use crate::wallpaper::{RunState, TimingMode};

    fn settings_for(folder: &Path) -> Settings {
        Settings {
            folder: folder.display().to_string(),
            apply_wallpaper: false,
            pause_on_screensaver: false,
            watch_folder: false,
            ..Settings::default()
        }
    }

    fn daemon_with(folder: &TempDir, shared: &TempDir) -> Daemon {
        let loaded = LoadedConfig { settings: settings_for(folder.path()), path: None };
        Daemon::build(loaded, shared.path().to_path_buf()).unwrap()
    }

    fn write_images(dir: &TempDir, names: &[&str]) {
        for name in names {
            fs::write(dir.path().join(name), b"not really an image").unwrap();
        }
    }

    #[test]
    fn test_ping_and_status() {
        let folder = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        let daemon = daemon_with(&folder, &shared);

        let IpcResponse::Success { data } = daemon.handle(IpcQuery::Ping) else {
            panic!("ping failed");
        };
        assert_eq!(data, "pong");

        let IpcResponse::Success { data } = daemon.handle(IpcQuery::Status) else {
            panic!("status failed");
        };
        assert_eq!(data["state"], "stopped");
    }

    #[test]
    fn test_next_applies_an_image() {
        let folder = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        write_images(&folder, &["a.png", "b.jpg"]);
        let daemon = daemon_with(&folder, &shared);

        let IpcResponse::Success { data } = daemon.handle(IpcQuery::Next) else {
            panic!("next failed");
        };
        let applied = PathBuf::from(data.as_str().unwrap());
        assert!(applied.starts_with(folder.path()));
        assert_eq!(daemon.scheduler().status().current, Some(applied));
    }

    #[test]
    fn test_next_with_empty_folder_is_an_error() {
        let folder = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        let daemon = daemon_with(&folder, &shared);

        let IpcResponse::Error { error } = daemon.handle(IpcQuery::Next) else {
            panic!("expected an error");
        };
        assert!(error.contains("no images found"));
    }

    #[test]
    fn test_start_and_stop_queries() {
        let folder = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        write_images(&folder, &["a.png"]);
        let daemon = daemon_with(&folder, &shared);

        daemon.handle(IpcQuery::Start);
        assert!(daemon.scheduler().is_running());

        daemon.handle(IpcQuery::Stop);
        assert!(!daemon.scheduler().is_running());
        assert_eq!(daemon.scheduler().state(), RunState::Stopped);
    }

    #[test]
    fn test_apply_updates_components() {
        let folder = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        write_images(&other, &["x.png", "y.png", "z.png"]);
        let daemon = daemon_with(&folder, &shared);

        let settings = Settings {
            mode: TimingMode::Randomized,
            random_min: 30,
            random_max: 90,
            pause_on_screensaver: true,
            ..settings_for(other.path())
        };
        daemon.apply(LoadedConfig { settings, path: None }).unwrap();

        assert_eq!(daemon.scheduler().folder(), other.path());
        assert_eq!(daemon.scheduler().policy(), TimingPolicy::randomized(30, 90));
        assert_eq!(daemon.scheduler().status().pool_size, 3);
        assert!(daemon.gate.is_enabled());
    }

    #[test]
    fn test_apply_rejects_invalid_timing() {
        let folder = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        let daemon = daemon_with(&folder, &shared);
        let before = daemon.scheduler().policy();

        let settings = Settings { interval: 2, ..settings_for(folder.path()) };
        assert!(daemon.apply(LoadedConfig { settings, path: None }).is_err());
        assert_eq!(daemon.scheduler().policy(), before);
    }

    #[test]
    fn test_invalid_timing_at_build_falls_back_to_default() {
        let folder = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        let settings = Settings { interval: 1, ..settings_for(folder.path()) };

        let daemon =
            Daemon::build(LoadedConfig { settings, path: None }, shared.path().to_path_buf())
                .unwrap();
        assert_eq!(daemon.scheduler().policy(), TimingPolicy::default());
    }

    #[test]
    fn test_folder_watch_follows_setting() {
        let folder = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        let daemon = daemon_with(&folder, &shared);
        assert!(daemon.folder_watch.lock().is_none());

        let settings = Settings { watch_folder: true, ..settings_for(folder.path()) };
        daemon.apply(LoadedConfig { settings, path: None }).unwrap();
        assert!(daemon.folder_watch.lock().is_some());

        daemon.apply(LoadedConfig { settings: settings_for(folder.path()), path: None }).unwrap();
        assert!(daemon.folder_watch.lock().is_none());
    }

    #[test]
    fn test_apply_random_once() {
        let folder = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        write_images(&folder, &["only.png"]);
        let loaded = LoadedConfig { settings: settings_for(folder.path()), path: None };

        let applied = apply_random_from(&loaded, shared.path().to_path_buf()).unwrap();
        assert_eq!(applied, folder.path().join("only.png"));
    }

    #[test]
    fn test_apply_random_once_empty_folder() {
        let folder = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        let loaded = LoadedConfig { settings: settings_for(folder.path()), path: None };

        let err = apply_random_from(&loaded, shared.path().to_path_buf()).unwrap_err();
        assert!(err.to_string().contains("no images found"));
    }
}
