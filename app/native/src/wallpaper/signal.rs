//! Interruptible waits shared by a rotation worker and its controller.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct SignalState {
    stopped: bool,
    exited: bool,
}

/// Stop flag for one worker run.
///
/// Every wait wakes as soon as [`RunSignal::stop`] is called. The worker marks
/// the signal as exited when it returns, which lets the controller join with a
/// deadline.
#[derive(Debug, Default)]
pub struct RunSignal {
    state: Mutex<SignalState>,
    changed: Condvar,
}

impl RunSignal {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Requests the worker to stop and wakes any pending wait.
    pub fn stop(&self) {
        self.state.lock().stopped = true;
        self.changed.notify_all();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool { self.state.lock().stopped }

    /// Sleeps for `timeout` unless stopped first. Returns `true` if stopped.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.stopped {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.stopped
    }

    /// Records that the worker has returned.
    pub fn mark_exited(&self) {
        self.state.lock().exited = true;
        self.changed.notify_all();
    }

    /// Waits up to `timeout` for the worker to exit. Returns `true` if it did.
    pub fn wait_exited(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.exited {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.exited
    }
}

/// Marks the signal as exited when dropped, including on panic.
pub struct ExitGuard<'a>(pub &'a RunSignal);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) { self.0.mark_exited(); }
}
