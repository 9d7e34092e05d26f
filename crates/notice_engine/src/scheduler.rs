use std::sync::Arc;
use std::time::Duration;

use notice_logging::{notice_info, notice_warn};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::Watcher;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Poll once right away, then every `interval`, until `cancel` fires.
///
/// A poll that is underway when cancellation arrives runs to completion, so
/// a commit is never cut in half.
pub async fn run_schedule(watcher: Arc<Watcher>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    notice_info!("Scheduler started, polling every {:?}", interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => match watcher.poll(false).await {
                Ok(outcome) => notice_info!("Scheduled poll: {}", outcome),
                Err(failure) => notice_warn!("Scheduled poll failed: {}", failure),
            },
        }
    }
    notice_info!("Scheduler stopped");
}
