//! Lease heartbeat: periodic aggregate progress reports.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::TransferError;

/// Receiver of aggregate progress for an import lease.
///
/// A report renews the lease even when the value has not changed.
pub trait LeaseProgress: Send + Sync {
    /// Reports overall completion as an integer in `0..=100`.
    fn report_progress(
        &self,
        percent: i32,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransferError>> + Send + '_>>;
}

/// Overall completion in percent, rounded and clamped to `0..=100`.
///
/// An empty import (`total == 0`) is complete by definition.
pub fn lease_percentage(position: i64, total: i64) -> i32 {
    if total <= 0 {
        return 100;
    }
    let pct = (100.0 * position as f64 / total as f64).round();
    pct.clamp(0.0, 100.0) as i32
}

/// Reports the aggregate percentage on every tick until `stop` fires.
///
/// Report failures are logged and the loop carries on.
pub(crate) async fn run_heartbeat<L>(
    lease: Arc<L>,
    position: Arc<AtomicI64>,
    total: i64,
    period: Duration,
    stop: CancellationToken,
) where
    L: LeaseProgress + ?Sized,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // Skip immediate first tick.

    let mut failures: u32 = 0;

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = interval.tick() => {
                let percent = lease_percentage(position.load(Ordering::SeqCst), total);
                let result = tokio::select! {
                    _ = stop.cancelled() => break,
                    r = lease.report_progress(percent) => r,
                };

                match result {
                    Ok(()) => {
                        if failures > 0 {
                            debug!(failures, percent, "lease progress reporting recovered");
                        }
                        failures = 0;
                        trace!(percent, "lease progress reported");
                    }
                    Err(e) => {
                        failures += 1;
                        warn!(
                            percent,
                            consecutive_failures = failures,
                            error = %e,
                            "lease progress report failed"
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every report; fails the first `fail_first` of them.
    struct MockLease {
        reports: Mutex<Vec<i32>>,
        fail_first: usize,
    }

    impl MockLease {
        fn new(fail_first: usize) -> Arc<Self> {
            Arc::new(Self {
                reports: Mutex::new(Vec::new()),
                fail_first,
            })
        }

        fn reports(&self) -> Vec<i32> {
            self.reports.lock().unwrap().clone()
        }
    }

    impl LeaseProgress for MockLease {
        fn report_progress(
            &self,
            percent: i32,
        ) -> Pin<Box<dyn Future<Output = Result<(), TransferError>> + Send + '_>> {
            Box::pin(async move {
                let mut reports = self.reports.lock().unwrap();
                reports.push(percent);
                if reports.len() <= self.fail_first {
                    Err(TransferError::Lease("connection refused".into()))
                } else {
                    Ok(())
                }
            })
        }
    }

    /// Never completes a report.
    struct StuckLease;

    impl LeaseProgress for StuckLease {
        fn report_progress(
            &self,
            _percent: i32,
        ) -> Pin<Box<dyn Future<Output = Result<(), TransferError>> + Send + '_>> {
            Box::pin(std::future::pending::<Result<(), TransferError>>())
        }
    }

    #[test]
    fn percentage_rounds() {
        assert_eq!(lease_percentage(0, 1000), 0);
        assert_eq!(lease_percentage(4, 1000), 0);
        assert_eq!(lease_percentage(5, 1000), 1);
        assert_eq!(lease_percentage(333, 1000), 33);
        assert_eq!(lease_percentage(1000, 1000), 100);
    }

    #[test]
    fn percentage_clamps() {
        assert_eq!(lease_percentage(1200, 1000), 100);
        assert_eq!(lease_percentage(-10, 1000), 0);
    }

    #[test]
    fn percentage_of_empty_import() {
        assert_eq!(lease_percentage(0, 0), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_on_every_tick_even_without_progress() {
        let lease = MockLease::new(0);
        let position = Arc::new(AtomicI64::new(0));
        let stop = CancellationToken::new();

        let handle = tokio::spawn(run_heartbeat(
            Arc::clone(&lease),
            Arc::clone(&position),
            1000,
            Duration::from_secs(2),
            stop.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(7)).await;
        stop.cancel();
        handle.await.unwrap();

        assert_eq!(lease.reports(), vec![0, 0, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_current_position() {
        let lease = MockLease::new(0);
        let position = Arc::new(AtomicI64::new(0));
        let stop = CancellationToken::new();

        let handle = tokio::spawn(run_heartbeat(
            Arc::clone(&lease),
            Arc::clone(&position),
            200,
            Duration::from_secs(2),
            stop.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(3)).await;
        position.store(100, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(2)).await;
        position.store(200, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(2)).await;
        stop.cancel();
        handle.await.unwrap();

        assert_eq!(lease.reports(), vec![0, 50, 100]);
    }

    #[tokio::test(start_paused = true)]
    async fn survives_consecutive_failures() {
        let lease = MockLease::new(3);
        let position = Arc::new(AtomicI64::new(500));
        let stop = CancellationToken::new();

        let handle = tokio::spawn(run_heartbeat(
            Arc::clone(&lease),
            Arc::clone(&position),
            1000,
            Duration::from_secs(2),
            stop.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(11)).await;
        stop.cancel();
        handle.await.unwrap();

        assert_eq!(lease.reports().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_stuck_report() {
        let position = Arc::new(AtomicI64::new(0));
        let stop = CancellationToken::new();

        let handle = tokio::spawn(run_heartbeat(
            Arc::new(StuckLease),
            position,
            10,
            Duration::from_secs(2),
            stop.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(3)).await;
        stop.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("should stop")
            .expect("no panic");
    }
}
