use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::types::{ItemProgress, ProgressReport};

/// Converts a percentage of `size` into whole bytes.
///
/// The percentage is clamped to `0..=100` so a single file can never move
/// the shared counter past its declared size.
pub fn bytes_for_percentage(size: u64, percentage: f32) -> i64 {
    let pct = if percentage.is_nan() {
        0.0
    } else {
        f64::from(percentage.clamp(0.0, 100.0))
    };
    (size as f64 * pct / 100.0).floor() as i64
}

/// Folds one file's progress channel into the shared byte counter.
///
/// Every event moves `position` by the delta since the previous event. A
/// normal close credits whatever the transport did not report, so each
/// file counts its full size exactly once. A failure stops crediting.
pub(crate) async fn watch_item(
    mut item: ItemProgress,
    position: Arc<AtomicI64>,
    stop: CancellationToken,
) {
    let total = item.size as i64;
    let mut pos: i64 = 0;

    loop {
        tokio::select! {
            _ = stop.cancelled() => return,
            report = item.rx.recv() => match report {
                Some(ProgressReport::Percentage(pct)) => {
                    let x = bytes_for_percentage(item.size, pct);
                    position.fetch_add(x - pos, Ordering::SeqCst);
                    pos = x;
                }
                Some(ProgressReport::Failed(error)) => {
                    debug!(item = %item.label, credited = pos, %error, "transfer failed");
                    return;
                }
                None => {
                    position.fetch_add(total - pos, Ordering::SeqCst);
                    return;
                }
            }
        }
    }
}
