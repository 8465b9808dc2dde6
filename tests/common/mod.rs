// Shared test helpers
#![allow(dead_code)]

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use hostmon::history_repo::{HistoryRepo, Retention};
use hostmon::models::*;
use hostmon::monitor::{Monitor, SampleSource};
use tempfile::TempDir;

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Hourly bucket key as written by the accumulator.
pub fn hour_key(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Hourly record on a 2-core host (32 GB RAM, 100 GB disk). RAM extrema are avg ± 1.
pub fn hourly_record(
    datetime: &str,
    cpu_total: f64,
    ram_avg: f64,
    bandwidth: f64,
    disk_used: f64,
) -> AggregateRecord {
    AggregateRecord {
        datetime: datetime.to_string(),
        cpu: CpuAggregate {
            per_core_avg: vec![cpu_total, cpu_total],
            total_avg: cpu_total,
        },
        ram: RamAggregate {
            unit: Unit::Gigabytes,
            avg_used: ram_avg,
            min_used: ram_avg - 1.0,
            max_used: ram_avg + 1.0,
            total: 32.0,
        },
        disk: Usage::gigabytes(disk_used, 100.0),
        bandwidth: Transfer::megabytes(bandwidth),
    }
}

/// 24 hourly records for `day`: cpu 30..53, disk 22..45, bandwidth 3..26.
pub fn day_of_hourly(y: i32, m: u32, d: u32) -> Vec<AggregateRecord> {
    (0..24)
        .map(|h| {
            let h_f = h as f64;
            hourly_record(&hour_key(at(y, m, d, h, 59)), 30.0 + h_f, 4.0, 3.0 + h_f, 22.0 + h_f)
        })
        .collect()
}

pub fn snapshot(cpu: Vec<f64>, ram_used: f64, bandwidth: f64) -> Snapshot {
    Snapshot {
        datetime: Utc::now(),
        cpu,
        ram: Usage::gigabytes(ram_used, 32.0),
        disk: Usage::gigabytes(40.0, 100.0),
        bandwidth: Transfer::megabytes(bandwidth),
    }
}

/// Sample source returning the same snapshot on every call.
pub struct ScriptedSource {
    snapshot: Snapshot,
}

impl ScriptedSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }
}

impl SampleSource for ScriptedSource {
    fn sample(&mut self) -> anyhow::Result<Snapshot> {
        let mut s = self.snapshot.clone();
        s.datetime = Utc::now();
        Ok(s)
    }
}

pub fn temp_repo(retention: Retention) -> (TempDir, HistoryRepo) {
    let dir = TempDir::new().unwrap();
    let repo = HistoryRepo::open(dir.path(), retention).unwrap();
    (dir, repo)
}

pub fn temp_monitor() -> (TempDir, Monitor) {
    let (dir, repo) = temp_repo(Retention::default());
    let source = ScriptedSource::new(snapshot(vec![10.0, 20.0], 8.0, 1.5));
    (dir, Monitor::new(Box::new(source), repo))
}
