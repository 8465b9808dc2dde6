// File-backed history: one JSON series per granularity (hourly, daily, monthly).
// Every write is a load -> transform -> store cycle under a single write lock, so
// concurrent callers never interleave a read-modify-write on the same files.
//
// Inspecting series: `cargo run --example dump_history -- [DATA_DIR] [hourly|daily|monthly]`.

pub mod aggregation;
mod file;

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::instrument;

use crate::config::TrimPolicy;
use crate::error::Result;
use crate::models::{AggregateRecord, Granularity};

/// Retention limit per series (records kept after each write).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub hourly: usize,
    pub daily: usize,
    pub monthly: usize,
    pub hourly_trim: TrimPolicy,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            hourly: 7 * 24,
            daily: 30,
            monthly: 12,
            hourly_trim: TrimPolicy::KeepNewest,
        }
    }
}

pub struct HistoryRepo {
    data_dir: PathBuf,
    retention: Retention,
    write_lock: Mutex<()>,
}

impl HistoryRepo {
    /// Opens the store in `data_dir`, creating the directory if missing.
    pub fn open(data_dir: impl Into<PathBuf>, retention: Retention) -> anyhow::Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            retention,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    pub fn path(&self, granularity: Granularity) -> PathBuf {
        self.data_dir.join(granularity.file_name())
    }

    /// Reads a series as stored. `Ok(None)` when its file does not exist;
    /// `StorageCorrupt` when it cannot be parsed.
    pub async fn read_series(
        &self,
        granularity: Granularity,
    ) -> Result<Option<Vec<AggregateRecord>>> {
        file::read_series_file(&self.path(granularity)).await
    }

    /// Reads a series, degrading any failure (missing, corrupt, unreadable) to empty.
    pub async fn load_series(&self, granularity: Granularity) -> Vec<AggregateRecord> {
        match self.read_series(granularity).await {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    series = %granularity,
                    operation = "load_series",
                    "series unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    pub async fn exists(&self, granularity: Granularity) -> bool {
        tokio::fs::try_exists(self.path(granularity))
            .await
            .unwrap_or(false)
    }

    async fn store_series(&self, granularity: Granularity, records: &[AggregateRecord]) -> Result<()> {
        let path = self.path(granularity);
        file::write_series_file(&path, records).await?;
        tracing::info!(
            series = %granularity,
            records = records.len(),
            path = %path.display(),
            "series written"
        );
        Ok(())
    }

    /// Folds a flushed record into the hourly series (same-hour records merge in place).
    #[instrument(skip(self, record), fields(repo = "history", operation = "push_hourly"))]
    pub async fn push_hourly(&self, record: AggregateRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.push_hourly_locked(record).await
    }

    /// Recomputes the daily series from the hourly one.
    #[instrument(skip(self), fields(repo = "history", operation = "push_daily"))]
    pub async fn push_daily(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.push_daily_locked().await
    }

    /// Recomputes the monthly series from the daily one.
    #[instrument(skip(self), fields(repo = "history", operation = "push_monthly"))]
    pub async fn push_monthly(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.push_monthly_locked().await
    }

    /// Hourly push followed by the daily and monthly rollups, as one locked unit.
    #[instrument(skip(self, record), fields(repo = "history", operation = "push_cascade"))]
    pub async fn push_cascade(&self, record: AggregateRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.push_hourly_locked(record).await?;
        self.push_daily_locked().await?;
        self.push_monthly_locked().await
    }

    /// Daily then monthly rollup without a new hourly record (startup catch-up).
    #[instrument(skip(self), fields(repo = "history", operation = "rollup"))]
    pub async fn rollup(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.push_daily_locked().await?;
        self.push_monthly_locked().await
    }

    /// Sidecar holding records trimmed from `granularity` whose coarser bucket is
    /// still open. Absent when there are none.
    pub fn retired_path(&self, granularity: Granularity) -> PathBuf {
        let stem = granularity.file_name().trim_end_matches(".json");
        self.data_dir.join(format!("{stem}.retired.json"))
    }

    async fn load_retired(&self, granularity: Granularity) -> Vec<AggregateRecord> {
        match file::read_series_file(&self.retired_path(granularity)).await {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    series = %granularity,
                    operation = "load_retired",
                    "retired records unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    async fn store_retired(&self, granularity: Granularity, records: &[AggregateRecord]) -> Result<()> {
        let path = self.retired_path(granularity);
        if records.is_empty() {
            return match tokio::fs::remove_file(&path).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(anyhow::Error::new(e)
                    .context(format!("remove {}", path.display()))
                    .into()),
                _ => Ok(()),
            };
        }
        file::write_series_file(&path, records).await?;
        tracing::debug!(series = %granularity, records = records.len(), "retired records written");
        Ok(())
    }

    // Retired records are written before the trimmed series; a crash in between
    // leaves them in both files, which the rollup counts once.
    async fn push_hourly_locked(&self, record: AggregateRecord) -> Result<()> {
        let mut hourly = self.load_series(Granularity::Hourly).await;
        aggregation::fold_hourly(&mut hourly, record);
        let dropped = aggregation::trim(&mut hourly, self.retention.hourly, self.retention.hourly_trim);
        if !dropped.is_empty() {
            let mut retired = self.load_retired(Granularity::Hourly).await;
            aggregation::retire(&mut retired, dropped);
            self.store_retired(Granularity::Hourly, &retired).await?;
        }
        self.store_series(Granularity::Hourly, &hourly).await
    }

    async fn push_daily_locked(&self) -> Result<()> {
        let hourly = self.load_series(Granularity::Hourly).await;
        if hourly.is_empty() {
            return Ok(());
        }
        let hourly_retired = self.load_retired(Granularity::Hourly).await;
        let existing = self.load_series(Granularity::Daily).await;
        let daily = aggregation::rollup(
            &hourly,
            &hourly_retired,
            &existing,
            aggregation::day_key,
            self.retention.daily,
        );
        if !daily.dropped.is_empty() {
            let mut daily_retired = self.load_retired(Granularity::Daily).await;
            aggregation::retire(&mut daily_retired, daily.dropped);
            self.store_retired(Granularity::Daily, &daily_retired).await?;
        }
        self.store_series(Granularity::Daily, &daily.series).await?;

        let kept = aggregation::prune_retired(hourly_retired, &hourly, aggregation::day_key);
        self.store_retired(Granularity::Hourly, &kept).await
    }

    async fn push_monthly_locked(&self) -> Result<()> {
        let daily = self.load_series(Granularity::Daily).await;
        if daily.is_empty() {
            return Ok(());
        }
        let daily_retired = self.load_retired(Granularity::Daily).await;
        let existing = self.load_series(Granularity::Monthly).await;
        let monthly = aggregation::rollup(
            &daily,
            &daily_retired,
            &existing,
            aggregation::month_key,
            self.retention.monthly,
        );
        self.store_series(Granularity::Monthly, &monthly.series).await?;

        let kept = aggregation::prune_retired(daily_retired, &daily, aggregation::month_key);
        self.store_retired(Granularity::Daily, &kept).await
    }
}
