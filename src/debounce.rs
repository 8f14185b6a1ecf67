//! Cancellable one-shot timers on the tokio runtime.
//!
//! `schedule_after` runs an action once a delay elapses unless the returned
//! handle is cancelled first. `Debouncer` keeps at most one such timer alive:
//! every `trigger` cancels the previous one, so only the last action in a burst
//! runs, one quiet period after the burst ends.

use std::time::Duration;
use tokio::task::JoinHandle;

pub const SEARCH_QUIET_PERIOD: Duration = Duration::from_millis(400);

/// Handle to a pending timer. Cancelling after the action ran is a no-op.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run `action` after `delay`. Must be called from inside a tokio runtime.
pub fn schedule_after<F>(delay: Duration, action: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        action();
    });
    TimerHandle { task }
}

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<TimerHandle>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Restart the quiet period with a new action.
    pub fn trigger<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.pending = Some(schedule_after(self.delay, action));
    }

    /// Drop the pending action, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                tracing::trace!("cancelling pending debounce timer");
            }
            handle.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
