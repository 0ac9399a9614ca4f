//! Upload coordinator: owns the shared counter and every progress worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use ovfpush_protocol::LEASE_PROGRESS_INTERVAL;

use crate::heartbeat::{LeaseProgress, lease_percentage, run_heartbeat};
use crate::progress::watch_item;
use crate::types::ItemProgress;

/// Aggregates progress of every file of an import and keeps the lease alive.
///
/// [`start`](Self::start) spawns one watcher per file plus the lease
/// heartbeat. [`stop`](Self::stop) consumes the coordinator and returns only
/// after all of them have exited. Dropping it without calling `stop` still
/// signals the workers to exit, but does not wait for them.
pub struct UploadCoordinator {
    position: Arc<AtomicI64>,
    total: i64,
    stop: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl UploadCoordinator {
    /// Starts watching `items` and reporting to `lease` every `interval`.
    ///
    /// A zero `interval` falls back to [`LEASE_PROGRESS_INTERVAL`].
    /// Must be called from within a tokio runtime.
    pub fn start<L>(lease: Arc<L>, items: Vec<ItemProgress>, interval: Duration) -> Self
    where
        L: LeaseProgress + ?Sized + 'static,
    {
        let interval = if interval.is_zero() {
            warn!(fallback = ?LEASE_PROGRESS_INTERVAL, "zero lease progress interval");
            LEASE_PROGRESS_INTERVAL
        } else {
            interval
        };
        let position = Arc::new(AtomicI64::new(0));
        let stop = CancellationToken::new();
        let total: i64 = items.iter().map(|item| item.size() as i64).sum();

        let mut tasks = Vec::with_capacity(items.len() + 1);
        let count = items.len();
        for item in items {
            tasks.push(tokio::spawn(watch_item(
                item,
                Arc::clone(&position),
                stop.clone(),
            )));
        }

        tasks.push(tokio::spawn(run_heartbeat(
            lease,
            Arc::clone(&position),
            total,
            interval,
            stop.clone(),
        )));

        debug!(items = count, total_bytes = total, ?interval, "upload coordinator started");

        Self {
            position,
            total,
            stop,
            tasks,
        }
    }

    /// Bytes credited so far across all files.
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::SeqCst).max(0) as u64
    }

    /// Declared size of all files.
    pub fn total(&self) -> u64 {
        self.total as u64
    }

    /// The percentage the heartbeat would report right now.
    pub fn percentage(&self) -> i32 {
        lease_percentage(self.position.load(Ordering::SeqCst), self.total)
    }

    /// Stops every worker and waits for all of them to exit.
    pub async fn stop(mut self) {
        self.stop.cancel();

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!(error = %e, "upload progress worker panicked");
            }
        }

        debug!(
            position = self.position(),
            total_bytes = self.total,
            "upload coordinator stopped"
        );
    }
}

impl Drop for UploadCoordinator {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
