//! Background rotation scheduler.
//!
//! One worker thread per [`RotationScheduler`] picks an image, hands it to the
//! sink, waits according to the [`TimingPolicy`] and repeats. Waiting happens in
//! short slices so the worker reacts quickly to `stop()`, to the screensaver
//! gate and to manual advances.
//!
//! The image pool and policy live behind one mutex. The lock is never held
//! while sleeping or while the sink runs. Sink calls are serialized, and the
//! reported current image changes only once the sink has returned.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use super::catalog::ImageCatalog;
use super::gate::ScreensaverGate;
use super::pool::ImagePool;
use super::signal::{ExitGuard, RunSignal};
use super::sink::WallpaperSink;
use super::timing::{TimingError, TimingPolicy};
use crate::platform::spawn_named_thread;

/// Slice lengths used by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Countdown slice.
    pub tick: Duration,
    /// How often the gate is re-checked while paused.
    pub gate_poll: Duration,
    /// How long `stop()` waits for the worker to exit.
    pub stop_grace: Duration,
    /// Real duration of one policy second.
    pub unit: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            gate_poll: Duration::from_secs(5),
            stop_grace: Duration::from_secs(2),
            unit: Duration::from_secs(1),
        }
    }
}

impl Pacing {
    fn seconds(&self, seconds: u64) -> Duration {
        self.unit.saturating_mul(u32::try_from(seconds).unwrap_or(u32::MAX))
    }
}

/// What the scheduler is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    Stopped,
    Waiting,
    Paused,
    Picking,
}

impl RunState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Paused,
            2 => Self::Picking,
            _ => Self::Waiting,
        }
    }

    const fn as_u8(self) -> u8 {
        match self {
            Self::Stopped | Self::Waiting => 0,
            Self::Paused => 1,
            Self::Picking => 2,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Stopped => "stopped",
            Self::Waiting => "waiting",
            Self::Paused => "paused",
            Self::Picking => "picking",
        };
        f.write_str(label)
    }
}

/// Snapshot returned by [`RotationScheduler::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub state: RunState,
    pub folder: PathBuf,
    pub policy: TimingPolicy,
    pub pool_size: usize,
    pub current: Option<PathBuf>,
}

struct Rotation {
    folder: PathBuf,
    pool: ImagePool,
    policy: TimingPolicy,
}

struct Shared {
    rotation: Mutex<Rotation>,
    catalog: Arc<dyn ImageCatalog>,
    gate: Arc<dyn ScreensaverGate>,
    sink: Arc<dyn WallpaperSink>,
    pacing: Pacing,
    phase: AtomicU8,
    /// Bumped by manual advances so a running countdown starts over.
    epoch: AtomicU64,
    /// Held for the duration of a sink call.
    applying: Mutex<()>,
    /// Last image the sink finished applying.
    current: Mutex<Option<PathBuf>>,
}

struct Worker {
    signal: Arc<RunSignal>,
    handle: JoinHandle<()>,
}

/// Rotates wallpapers from a folder on a timer.
pub struct RotationScheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl RotationScheduler {
    /// Creates a stopped scheduler with the default pacing.
    ///
    /// # Errors
    ///
    /// Returns an error if `policy` is invalid.
    pub fn new(
        folder: PathBuf,
        policy: TimingPolicy,
        catalog: Arc<dyn ImageCatalog>,
        gate: Arc<dyn ScreensaverGate>,
        sink: Arc<dyn WallpaperSink>,
    ) -> Result<Self, TimingError> {
        Self::with_pacing(folder, policy, catalog, gate, sink, Pacing::default())
    }

    /// Creates a stopped scheduler with custom slice lengths.
    ///
    /// # Errors
    ///
    /// Returns an error if `policy` is invalid.
    pub fn with_pacing(
        folder: PathBuf,
        policy: TimingPolicy,
        catalog: Arc<dyn ImageCatalog>,
        gate: Arc<dyn ScreensaverGate>,
        sink: Arc<dyn WallpaperSink>,
        pacing: Pacing,
    ) -> Result<Self, TimingError> {
        policy.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                rotation: Mutex::new(Rotation { folder, pool: ImagePool::new(), policy }),
                catalog,
                gate,
                sink,
                pacing,
                phase: AtomicU8::new(RunState::Waiting.as_u8()),
                epoch: AtomicU64::new(0),
                applying: Mutex::new(()),
                current: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        })
    }

    /// Starts the worker. Does nothing if it is already running.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn start(&self) -> std::io::Result<()> {
        let mut slot = self.worker.lock();
        if slot.is_some() {
            return Ok(());
        }

        let signal = Arc::new(RunSignal::new());
        let shared = Arc::clone(&self.shared);
        let worker_signal = Arc::clone(&signal);
        shared.set_phase(RunState::Waiting);

        let handle = spawn_named_thread("rotation", move || shared.run(&worker_signal))?;
        *slot = Some(Worker { signal, handle });

        tracing::info!(folder = %self.shared.rotation.lock().folder.display(), "rotation started");
        Ok(())
    }

    /// Stops the worker, waiting at most the stop grace period for it to exit.
    ///
    /// Does nothing if the scheduler is not running.
    pub fn stop(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        worker.signal.stop();
        if worker.signal.wait_exited(self.shared.pacing.stop_grace) {
            if worker.handle.join().is_err() {
                tracing::warn!("rotation worker panicked");
            }
        } else {
            tracing::warn!(
                grace_ms = self.shared.pacing.stop_grace.as_millis(),
                "rotation worker did not exit in time"
            );
        }

        tracing::info!("rotation stopped");
    }

    /// Returns whether the worker is running.
    #[must_use]
    pub fn is_running(&self) -> bool { self.worker.lock().is_some() }

    /// Re-scans the folder and rebuilds the pool.
    pub fn refresh(&self) { self.shared.refresh(); }

    /// Picks and applies the next image immediately on the caller's thread.
    ///
    /// A running countdown starts over. Returns the applied image, or `None` if
    /// the folder has no images.
    pub fn advance_now(&self) -> Option<PathBuf> {
        let picked = self.shared.pick()?;
        self.shared.apply(&picked);
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        Some(picked)
    }

    /// Replaces the timing policy. Takes effect at the next wait computation.
    ///
    /// # Errors
    ///
    /// Returns an error and keeps the current policy if `policy` is invalid.
    pub fn configure(&self, policy: TimingPolicy) -> Result<(), TimingError> {
        policy.validate()?;
        self.shared.rotation.lock().policy = policy;
        tracing::debug!(?policy, "timing policy updated");
        Ok(())
    }

    /// Binds a new folder and refreshes the pool from it.
    pub fn set_folder(&self, folder: PathBuf) {
        let mut rotation = self.shared.rotation.lock();
        if rotation.folder == folder {
            return;
        }
        rotation.folder = folder;
        self.shared.reload_pool(&mut rotation);
    }

    /// Returns the current timing policy.
    #[must_use]
    pub fn policy(&self) -> TimingPolicy { self.shared.rotation.lock().policy }

    /// Returns the bound folder.
    #[must_use]
    pub fn folder(&self) -> PathBuf { self.shared.rotation.lock().folder.clone() }

    #[must_use]
    pub fn state(&self) -> RunState {
        if self.is_running() { self.shared.phase() } else { RunState::Stopped }
    }

    #[must_use]
    pub fn status(&self) -> SchedulerStatus {
        let state = self.state();
        let current = self.shared.current.lock().clone();
        let rotation = self.shared.rotation.lock();

        SchedulerStatus {
            state,
            folder: rotation.folder.clone(),
            policy: rotation.policy,
            pool_size: rotation.pool.len(),
            current,
        }
    }
}

impl Drop for RotationScheduler {
    fn drop(&mut self) { self.stop(); }
}

impl Shared {
    fn phase(&self) -> RunState { RunState::from_u8(self.phase.load(Ordering::SeqCst)) }

    fn set_phase(&self, state: RunState) { self.phase.store(state.as_u8(), Ordering::SeqCst); }

    fn run(&self, signal: &RunSignal) {
        let _exit = ExitGuard(signal);

        loop {
            if !self.wait_while_gated(signal) || signal.is_stopped() {
                break;
            }

            self.set_phase(RunState::Picking);
            if let Some(path) = self.pick() {
                self.apply(&path);
            }

            let wait = self.next_wait();
            self.set_phase(RunState::Waiting);
            tracing::debug!(wait_ms = wait.as_millis(), "next rotation scheduled");

            if !self.countdown(wait, signal) {
                break;
            }
        }
    }

    /// Blocks while the gate is active. Returns `false` if stopped meanwhile.
    fn wait_while_gated(&self, signal: &RunSignal) -> bool {
        if !self.gate.is_active() {
            return true;
        }

        self.set_phase(RunState::Paused);
        tracing::debug!("screensaver active, rotation paused");
        while self.gate.is_active() {
            if signal.wait(self.pacing.gate_poll) {
                return false;
            }
        }
        self.set_phase(RunState::Waiting);
        tracing::debug!("screensaver inactive, rotation resumed");
        true
    }

    /// Waits `total` in slices, pausing on the gate and restarting after a
    /// manual advance. Returns `false` if stopped.
    fn countdown(&self, total: Duration, signal: &RunSignal) -> bool {
        let mut elapsed = Duration::ZERO;
        let mut epoch = self.epoch.load(Ordering::SeqCst);

        while elapsed < total {
            if self.gate.is_active() {
                if !self.wait_while_gated(signal) {
                    return false;
                }
                continue;
            }

            let slice = self.pacing.tick.min(total - elapsed);
            if signal.wait(slice) {
                return false;
            }
            elapsed += slice;

            let current = self.epoch.load(Ordering::SeqCst);
            if current != epoch {
                epoch = current;
                elapsed = Duration::ZERO;
            }
        }

        true
    }

    fn apply(&self, path: &Path) {
        let _applying = self.applying.lock();
        self.sink.apply(path);
        *self.current.lock() = Some(path.to_path_buf());
    }

    fn next_wait(&self) -> Duration {
        let policy = self.rotation.lock().policy;
        self.pacing.seconds(policy.next_wait_seconds(&mut rand::rng()))
    }

    /// Takes the next image from the pool, loading the pool first if empty.
    fn pick(&self) -> Option<PathBuf> {
        let mut rotation = self.rotation.lock();
        if rotation.pool.is_empty() {
            self.reload_pool(&mut rotation);
        }
        rotation.pool.next(&mut rand::rng())
    }

    fn refresh(&self) {
        let mut rotation = self.rotation.lock();
        self.reload_pool(&mut rotation);
    }

    fn reload_pool(&self, rotation: &mut Rotation) {
        let images = self.catalog.list(&rotation.folder);
        tracing::debug!(folder = %rotation.folder.display(), count = images.len(), "image pool loaded");
        rotation.pool.replace(images, &mut rand::rng());
    }
}
