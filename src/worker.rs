// Background sampler: one snapshot per tick, folded into the open window and
// broadcast to /ws subscribers. Sole caller of the sample source.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{broadcast, watch};
use tokio::time::{Duration, Instant, interval};

use crate::models::Snapshot;
use crate::monitor::Monitor;

/// Rate limit for "no receivers" debug line (avoid logging every second when no one is on /ws)
const NO_RECEIVERS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Engine, channels, and shutdown for the sampler.
pub struct WorkerDeps {
    pub monitor: Arc<Monitor>,
    pub tx: broadcast::Sender<Snapshot>,
    pub ws_connections: Arc<AtomicUsize>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Sampler timing and logging config.
pub struct WorkerConfig {
    pub sample_interval_ms: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        monitor,
        tx,
        ws_connections,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        sample_interval_ms,
        stats_log_interval_secs,
    } = config;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_millis(sample_interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut samples_total: u64 = 0;
        let mut last_no_receivers_log: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let snapshot = match monitor.sample().await {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::warn!(error = %e, operation = "sample", "sampling failed");
                            continue;
                        }
                    };
                    samples_total += 1;

                    if tx.send(snapshot).is_err() {
                        let should_log = last_no_receivers_log
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_LOG_INTERVAL);
                        if should_log {
                            tracing::debug!(
                                operation = "broadcast_snapshot",
                                "No active WebSocket clients; broadcast channel has no receivers"
                            );
                            last_no_receivers_log = Some(Instant::now());
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    tracing::debug!("Sampler shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        ws_clients = ws_connections.load(Ordering::Relaxed),
                        window_samples = monitor.window_sample_count(),
                        samples_total,
                        hourly_flushes_total = monitor.hourly_flushes_total(),
                        "app stats"
                    );
                }
            }
        }
    })
}
