//! Recurring purge timer for one aggregation.
//!
//! Each aggregation owns its own `PurgeScheduler`; cancelling or replacing
//! one aggregation's timer never touches another's.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use telemetry::metrics;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::purge::PurgeTask;

struct ActiveTimer {
    aggregation: String,
    handle: JoinHandle<()>,
}

/// Counts a running timer loop for as long as it lives.
struct LiveTimer(Arc<AtomicUsize>);

impl LiveTimer {
    fn new(live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        metrics().active_timers.inc();
        Self(live)
    }
}

impl Drop for LiveTimer {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
        metrics().active_timers.dec();
    }
}

/// Owns the single recurring purge timer of an aggregation.
pub struct PurgeScheduler {
    runtime: Handle,
    timer: Mutex<Option<ActiveTimer>>,
    live: Arc<AtomicUsize>,
}

impl PurgeScheduler {
    /// Scheduler that spawns its timer on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            timer: Mutex::new(None),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Installs `task` on a fixed-delay timer, replacing any existing one.
    ///
    /// The previous timer is aborted, interrupting an in-flight tick at its
    /// next await point, and fully torn down before the new timer starts.
    /// Concurrent calls serialize, so at most one timer exists whenever
    /// `install` returns. A task with purging disabled leaves no timer.
    pub async fn install(&self, task: Arc<PurgeTask>) {
        let mut slot = self.timer.lock().await;

        if let Some(previous) = slot.take() {
            cancel(previous).await;
        }

        if !task.is_purging_enabled() {
            info!(
                aggregation = %task.aggregation_id(),
                "Purging disabled, no purge timer installed"
            );
            return;
        }

        let aggregation = task.aggregation_id().to_string();
        let interval = task.interval();
        let live = LiveTimer::new(self.live.clone());

        let handle = self.runtime.spawn(async move {
            let _live = live;
            run_timer(task, interval).await;
        });
        metrics().timers_installed.inc();

        info!(
            aggregation = %aggregation,
            interval_ms = interval.as_millis() as u64,
            "Purge timer installed"
        );

        *slot = Some(ActiveTimer {
            aggregation,
            handle,
        });
    }

    /// Cancels the active timer, if any.
    pub async fn shutdown(&self) {
        if let Some(timer) = self.timer.lock().await.take() {
            cancel(timer).await;
        }
    }

    /// Whether a timer is currently installed and running.
    pub async fn is_scheduled(&self) -> bool {
        self.timer
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Number of timer loops of this scheduler that are still alive.
    pub fn active_timers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl Drop for PurgeScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.handle.abort();
        }
    }
}

/// Aborts a timer and waits until its task has been dropped.
async fn cancel(timer: ActiveTimer) {
    timer.handle.abort();
    if let Err(e) = timer.handle.await {
        if !e.is_cancelled() {
            error!(aggregation = %timer.aggregation, error = %e, "Purge timer terminated abnormally");
        }
    }
    metrics().timers_cancelled.inc();
    debug!(aggregation = %timer.aggregation, "Purge timer cancelled");
}

/// Fixed-delay loop: wait one interval, tick, repeat.
async fn run_timer(task: Arc<PurgeTask>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;

        if let Err(e) = task.run().await {
            error!(
                aggregation = %task.aggregation_id(),
                table = %e.table,
                cutoff = e.cutoff,
                error = %e,
                "Purge tick failed"
            );
        }
    }
}
