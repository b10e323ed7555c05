use std::time::Duration;

use gloo_timers::callback::Interval;
use tracing::debug;
use wasm_bindgen_futures::spawn_local;

use crate::sync::LinkSynchronizer;

/// `setInterval`-driven refresh loop. Stops when stopped or dropped.
pub struct IntervalPoller {
    sync: LinkSynchronizer,
    interval: Option<Interval>,
}

impl IntervalPoller {
    /// Attach `sync`, refresh immediately, then refresh every `period`.
    #[must_use = "dropping the poller stops polling"]
    pub fn start(sync: LinkSynchronizer, period: Duration) -> Self {
        sync.attach();
        spawn_refresh(&sync);
        let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
        let ticker = sync.clone();
        let interval = Interval::new(millis, move || spawn_refresh(&ticker));
        debug!(period_ms = millis, "link polling started");
        Self {
            sync,
            interval: Some(interval),
        }
    }

    /// Cancel the timer and detach the synchronizer.
    pub fn stop(&mut self) {
        if let Some(interval) = self.interval.take() {
            interval.cancel();
            self.sync.detach();
            debug!("link polling stopped");
        }
    }

    /// Whether the timer is still scheduled.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.interval.is_some()
    }
}

impl Drop for IntervalPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_refresh(sync: &LinkSynchronizer) {
    let sync = sync.clone();
    spawn_local(async move {
        sync.refresh().await;
    });
}
