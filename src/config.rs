use std::path::PathBuf;

use serde::Deserialize;

use crate::history_repo::Retention;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Which end of the hourly series survives when it exceeds `max_hourly_records`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimPolicy {
    /// Trailing window: drop the oldest records.
    #[default]
    KeepNewest,
    /// Legacy behaviour: keep the first N records, newest ones are discarded.
    KeepOldest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding monitor_1h.json, monitor_1day.json and monitor_1month.json.
    pub data_dir: PathBuf,
    #[serde(default = "default_max_hourly_records")]
    pub max_hourly_records: usize,
    #[serde(default = "default_max_daily_records")]
    pub max_daily_records: usize,
    #[serde(default = "default_max_monthly_records")]
    pub max_monthly_records: usize,
    #[serde(default)]
    pub hourly_trim: TrimPolicy,
}

fn default_max_hourly_records() -> usize {
    7 * 24
}

fn default_max_daily_records() -> usize {
    30
}

fn default_max_monthly_records() -> usize {
    12
}

impl StorageConfig {
    pub fn retention(&self) -> Retention {
        Retention {
            hourly: self.max_hourly_records,
            daily: self.max_daily_records,
            monthly: self.max_monthly_records,
            hourly_trim: self.hourly_trim,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    /// How often to log app stats (ws clients, samples in the open window) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
    /// Max number of snapshots buffered for /ws (slow clients may lag).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    /// Mount point whose usage is reported as disk used/total.
    #[serde(default = "default_disk_mount")]
    pub disk_mount: PathBuf,
}

fn default_sample_interval_ms() -> u64 {
    1000
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

fn default_broadcast_capacity() -> usize {
    16
}

fn default_disk_mount() -> PathBuf {
    PathBuf::from("/")
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
            broadcast_capacity: default_broadcast_capacity(),
            disk_mount: default_disk_mount(),
        }
    }
}

/// Record counts returned by POST /fetch_monitor_data (and default history limits).
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_hourly_count")]
    pub hourly_count: usize,
    #[serde(default = "default_weekly_count")]
    pub weekly_count: usize,
    #[serde(default = "default_monthly_days_count")]
    pub monthly_days_count: usize,
    #[serde(default = "default_yearly_count")]
    pub yearly_count: usize,
}

fn default_hourly_count() -> usize {
    24
}

fn default_weekly_count() -> usize {
    7
}

fn default_monthly_days_count() -> usize {
    30
}

fn default_yearly_count() -> usize {
    12
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            hourly_count: default_hourly_count(),
            weekly_count: default_weekly_count(),
            monthly_days_count: default_monthly_days_count(),
            yearly_count: default_yearly_count(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.storage.data_dir.as_os_str().is_empty(),
            "storage.data_dir must be non-empty"
        );
        anyhow::ensure!(
            self.storage.max_hourly_records > 0,
            "storage.max_hourly_records must be > 0, got {}",
            self.storage.max_hourly_records
        );
        anyhow::ensure!(
            self.storage.max_daily_records > 0,
            "storage.max_daily_records must be > 0, got {}",
            self.storage.max_daily_records
        );
        anyhow::ensure!(
            self.storage.max_monthly_records > 0,
            "storage.max_monthly_records must be > 0, got {}",
            self.storage.max_monthly_records
        );
        anyhow::ensure!(
            self.monitoring.sample_interval_ms > 0,
            "monitoring.sample_interval_ms must be > 0, got {}",
            self.monitoring.sample_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.broadcast_capacity > 0,
            "monitoring.broadcast_capacity must be > 0, got {}",
            self.monitoring.broadcast_capacity
        );
        anyhow::ensure!(
            self.query.hourly_count > 0
                && self.query.weekly_count > 0
                && self.query.monthly_days_count > 0
                && self.query.yearly_count > 0,
            "query counts must all be > 0"
        );
        Ok(())
    }
}
