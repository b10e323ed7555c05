//! Repeating refresh bound to a view's lifetime (native runtime).

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::sync::LinkSynchronizer;

/// Starts the periodic refresh task.
pub struct Poller;

impl Poller {
    /// Attach `sync`, refresh immediately, then refresh every `period`.
    ///
    /// Each tick spawns its refresh without waiting for the previous one, so
    /// slow responses may overlap; the synchronizer resolves the race.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use = "dropping the handle stops polling"]
    pub fn start(sync: LinkSynchronizer, period: Duration) -> PollHandle {
        sync.attach();
        let ticker = sync.clone();
        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let sync = ticker.clone();
                tokio::spawn(async move {
                    sync.refresh().await;
                });
            }
        });
        debug!(period_ms = period.as_millis(), "link polling started");
        PollHandle {
            sync,
            task: Some(task),
        }
    }
}

/// Owner of a running poll loop. Stops polling when stopped or dropped.
pub struct PollHandle {
    sync: LinkSynchronizer,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Cancel the timer and detach the synchronizer.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.sync.detach();
            debug!("link polling stopped");
        }
    }

    /// Whether the loop is still scheduled.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Synchronizer driven by this handle.
    #[must_use]
    pub const fn synchronizer(&self) -> &LinkSynchronizer {
        &self.sync
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
