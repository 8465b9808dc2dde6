// Aggregated record: one per bucket (hour, day or month) in a persisted series.
// Field names follow the on-disk JSON written by earlier releases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Transfer, Unit, Usage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuAggregate {
    #[serde(rename = "cpu_per_core_avg")]
    pub per_core_avg: Vec<f64>,
    #[serde(rename = "cpu_total_avg")]
    pub total_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RamAggregate {
    #[serde(default = "Unit::gigabytes")]
    pub unit: Unit,
    pub avg_used: f64,
    pub min_used: f64,
    pub max_used: f64,
    pub total: f64,
}

/// One finalized bucket. `datetime` is the bucket key: an RFC 3339 UTC instant
/// for hourly records, `YYYY-MM-DD` for daily, `YYYY-MM` for monthly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub datetime: String,
    pub cpu: CpuAggregate,
    pub ram: RamAggregate,
    pub disk: Usage,
    pub bandwidth: Transfer,
}

impl AggregateRecord {
    /// Parses `datetime` as an instant. Only hourly records carry one.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.datetime)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
