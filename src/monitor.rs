// Engine facade: owns the accumulator and the history store, and exposes the
// three entry points used by workers and routes (tick, hour boundary, query).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::accumulator::{Accumulator, WindowStats};
use crate::error::{MonitorError, Result};
use crate::history_repo::HistoryRepo;
use crate::models::{AggregateRecord, Granularity, Snapshot};
use crate::query;

/// Produces host snapshots. Called from a blocking thread once per sample.
pub trait SampleSource: Send + 'static {
    fn sample(&mut self) -> anyhow::Result<Snapshot>;
}

pub struct Monitor {
    source: Arc<Mutex<Box<dyn SampleSource>>>,
    accumulator: Mutex<Accumulator>,
    history: HistoryRepo,
    hourly_flushes_total: AtomicU64,
}

impl Monitor {
    pub fn new(source: Box<dyn SampleSource>, history: HistoryRepo) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            accumulator: Mutex::new(Accumulator::new()),
            history,
            hourly_flushes_total: AtomicU64::new(0),
        }
    }

    pub fn history(&self) -> &HistoryRepo {
        &self.history
    }

    fn accumulator(&self) -> MutexGuard<'_, Accumulator> {
        self.accumulator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the source (on a blocking thread) and folds the result in.
    #[instrument(skip(self), fields(operation = "sample"))]
    pub async fn sample(&self) -> anyhow::Result<Snapshot> {
        let source = self.source.clone();
        let snapshot = tokio::task::spawn_blocking(move || {
            let mut source = source
                .lock()
                .map_err(|e| anyhow::anyhow!("sample source lock poisoned: {}", e))?;
            source.sample()
        })
        .await
        .map_err(|e| anyhow::anyhow!("sample task join: {}", e))??;
        Ok(self.on_tick(snapshot))
    }

    /// Folds one snapshot into the open window; returns it rounded for streaming.
    pub fn on_tick(&self, snapshot: Snapshot) -> Snapshot {
        let snapshot = snapshot.rounded();
        self.accumulator().update(&snapshot);
        snapshot
    }

    /// Flushes the open window stamped with the current time and cascades
    /// hourly -> daily -> monthly. An empty window writes nothing.
    pub async fn on_hour_boundary(&self) -> Result<()> {
        self.on_hour_boundary_at(Utc::now()).await
    }

    /// Like `on_hour_boundary`, with the record stamped `stamp`. The stamp decides
    /// which hour, day and month the window is filed under.
    #[instrument(skip(self), fields(operation = "on_hour_boundary"))]
    pub async fn on_hour_boundary_at(&self, stamp: DateTime<Utc>) -> Result<()> {
        let Some(record) = self.accumulator().flush_and_reset(stamp) else {
            tracing::debug!("no samples in window; nothing to flush");
            return Ok(());
        };
        self.history.push_cascade(record).await?;
        self.hourly_flushes_total.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Last `max_records` of a series, converted for display in `timezone` (UTC when absent).
    #[instrument(skip(self), fields(operation = "query"))]
    pub async fn query(
        &self,
        granularity: Granularity,
        timezone: Option<&str>,
        max_records: usize,
    ) -> Result<Vec<AggregateRecord>> {
        let tz = query::parse_timezone(timezone.unwrap_or(query::DEFAULT_TIMEZONE))?;

        let records = match granularity {
            Granularity::Hourly => {
                if !self.history.exists(Granularity::Hourly).await {
                    self.on_hour_boundary().await?;
                }
                self.history.load_series(Granularity::Hourly).await
            }
            Granularity::Daily | Granularity::Monthly => {
                match self.history.read_series(granularity).await {
                    Ok(Some(records)) => records,
                    Ok(None) => return Err(MonitorError::NoData(granularity)),
                    Err(e) => {
                        tracing::warn!(error = %e, series = %granularity, "series unreadable, treating as empty");
                        Vec::new()
                    }
                }
            }
        };

        Ok(query::present(records, granularity, tz, max_records))
    }

    /// Live state of the open window.
    pub fn window(&self) -> WindowStats {
        self.accumulator().window(Utc::now())
    }

    pub fn window_sample_count(&self) -> u64 {
        self.accumulator().sample_count()
    }

    pub fn hourly_flushes_total(&self) -> u64 {
        self.hourly_flushes_total.load(Ordering::Relaxed)
    }
}
