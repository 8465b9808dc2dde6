// Running statistics for the open window (normally one hour of 1s samples).
// CPU/RAM use incremental averages, RAM keeps extrema, bandwidth is summed and
// disk is last-write-wins. Values keep full precision until the window is finalized.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::models::{
    AggregateRecord, CpuAggregate, RamAggregate, Snapshot, Transfer, Unit, Usage, round2,
};

#[derive(Debug, Clone)]
pub struct Accumulator {
    per_core_avg: Vec<f64>,
    total_avg: f64,
    ram_avg: f64,
    ram_min: f64,
    ram_max: f64,
    ram_total: f64,
    bandwidth_total: f64,
    disk_used: f64,
    disk_total: f64,
    sample_count: u64,
}

/// Live view of the open window; the only place `sample_count` is exposed.
#[derive(Debug, Clone, Serialize)]
pub struct WindowStats {
    pub sample_count: u64,
    #[serde(flatten)]
    pub record: AggregateRecord,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            per_core_avg: Vec::new(),
            total_avg: 0.0,
            ram_avg: 0.0,
            ram_min: f64::INFINITY,
            ram_max: 0.0,
            ram_total: 0.0,
            bandwidth_total: 0.0,
            disk_used: 0.0,
            disk_total: 0.0,
            sample_count: 0,
        }
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Folds one snapshot into the window.
    pub fn update(&mut self, snapshot: &Snapshot) {
        let n = self.sample_count as f64;

        if self.sample_count == 0 || self.per_core_avg.is_empty() {
            self.per_core_avg = snapshot.cpu.clone();
        } else {
            // Core count is fixed by the first sample of the window.
            for (avg, value) in self.per_core_avg.iter_mut().zip(&snapshot.cpu) {
                *avg = (*avg * n + value) / (n + 1.0);
            }
        }
        self.total_avg = if self.per_core_avg.is_empty() {
            0.0
        } else {
            self.per_core_avg.iter().sum::<f64>() / self.per_core_avg.len() as f64
        };

        let ram_used = snapshot.ram.used;
        self.ram_avg = if self.sample_count == 0 {
            ram_used
        } else {
            (self.ram_avg * n + ram_used) / (n + 1.0)
        };
        self.ram_min = self.ram_min.min(ram_used);
        self.ram_max = self.ram_max.max(ram_used);
        self.ram_total = snapshot.ram.total;

        self.bandwidth_total += snapshot.bandwidth.transfer_total;
        self.disk_used = snapshot.disk.used;
        self.disk_total = snapshot.disk.total;
        self.sample_count += 1;
    }

    /// Finalizes the window into a record stamped `now` and resets all counters.
    /// Returns `None` (and leaves the state untouched) when no sample arrived.
    pub fn flush_and_reset(&mut self, now: DateTime<Utc>) -> Option<AggregateRecord> {
        if self.is_empty() {
            return None;
        }
        let record = self.to_record(now.to_rfc3339_opts(SecondsFormat::Micros, false));
        *self = Self::new();
        Some(record)
    }

    /// Current state of the open window, rounded like a finalized record.
    pub fn window(&self, now: DateTime<Utc>) -> WindowStats {
        WindowStats {
            sample_count: self.sample_count,
            record: self.to_record(now.to_rfc3339_opts(SecondsFormat::Micros, false)),
        }
    }

    fn to_record(&self, datetime: String) -> AggregateRecord {
        let ram_min = if self.ram_min.is_finite() {
            self.ram_min
        } else {
            0.0
        };
        AggregateRecord {
            datetime,
            cpu: CpuAggregate {
                per_core_avg: self.per_core_avg.iter().copied().map(round2).collect(),
                total_avg: round2(self.total_avg),
            },
            ram: RamAggregate {
                unit: Unit::Gigabytes,
                avg_used: round2(self.ram_avg),
                min_used: round2(ram_min),
                max_used: round2(self.ram_max),
                total: round2(self.ram_total),
            },
            disk: Usage::gigabytes(round2(self.disk_used), round2(self.disk_total)),
            bandwidth: Transfer::megabytes(round2(self.bandwidth_total)),
        }
    }
}
