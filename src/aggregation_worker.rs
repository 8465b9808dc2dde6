// Hour-boundary worker: sleeps until the next UTC hour, then flushes the open
// window and cascades hourly -> daily -> monthly. The record is stamped inside
// the hour it closes, never with the wake-up time. On shutdown it performs one
// final flush before returning, so awaiting its handle waits for that write.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::monitor::Monitor;

const SECS_PER_HOUR: u64 = 3600;

/// Wall clock can trail the monotonic timer slightly; wake just past the boundary.
const BOUNDARY_SLACK: Duration = Duration::from_millis(500);

/// Spawns the hourly rollup worker. Returns a join handle.
pub fn spawn(monitor: Arc<Monitor>, shutdown_rx: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(monitor, shutdown_rx).await;
    })
}

#[instrument(skip_all)]
async fn run(monitor: Arc<Monitor>, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        let now = Utc::now();
        let boundary = next_hour(now);
        let delay = until_next_hour(now) + BOUNDARY_SLACK;
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                if let Err(e) = monitor.on_hour_boundary_at(closing_stamp(boundary)).await {
                    warn!(error = %e, "hourly rollup failed");
                }
            }
            _ = shutdown_rx.changed() => break,
        }
    }

    info!("Shutting down, saving last hourly data...");
    match monitor.on_hour_boundary().await {
        Ok(()) => info!("saving last hourly data done"),
        Err(e) => warn!(error = %e, "final hourly flush failed"),
    }
}

/// Time from `now` to the start of the next UTC hour.
pub fn until_next_hour(now: DateTime<Utc>) -> Duration {
    let into_hour = Duration::new(
        now.timestamp().rem_euclid(SECS_PER_HOUR as i64) as u64,
        now.timestamp_subsec_nanos(),
    );
    Duration::from_secs(SECS_PER_HOUR).saturating_sub(into_hour)
}

/// Start of the UTC hour after `now`.
pub fn next_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    let hour = SECS_PER_HOUR as i64;
    let start = now.timestamp().div_euclid(hour) * hour;
    DateTime::from_timestamp(start + hour, 0).unwrap_or(now)
}

/// Stamp of the window closed at `boundary`: its last microsecond.
pub fn closing_stamp(boundary: DateTime<Utc>) -> DateTime<Utc> {
    boundary - TimeDelta::microseconds(1)
}
