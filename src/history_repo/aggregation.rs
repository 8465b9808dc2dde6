// Pure rollup logic: merge records into one bucket, group finer series into
// coarser buckets, trim to the retention window. File access stays in history_repo::mod.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, Timelike};

use crate::config::TrimPolicy;
use crate::models::{AggregateRecord, CpuAggregate, RamAggregate, Transfer, Unit, Usage, round2};

/// Merges records into one record keyed `bucket_key`.
///
/// Averages are unweighted (every input counts once, whatever its sample count),
/// RAM extrema are the extrema of the inputs, bandwidth is summed and disk usage
/// takes the peak. Totals come from the first input. Returns `None` for no input.
pub fn merge_records(records: &[&AggregateRecord], bucket_key: &str) -> Option<AggregateRecord> {
    let first = records.first()?;
    let n = records.len() as f64;

    let mut per_core_sum = vec![0.0; first.cpu.per_core_avg.len()];
    let mut total_sum = 0.0;
    let mut ram_avg_sum = 0.0;
    let mut ram_min = f64::INFINITY;
    let mut ram_max = f64::NEG_INFINITY;
    let mut bandwidth_total = 0.0;
    let mut disk_used_max: f64 = 0.0;

    for r in records {
        for (sum, value) in per_core_sum.iter_mut().zip(&r.cpu.per_core_avg) {
            *sum += value;
        }
        total_sum += r.cpu.total_avg;
        ram_avg_sum += r.ram.avg_used;
        ram_min = ram_min.min(r.ram.min_used);
        ram_max = ram_max.max(r.ram.max_used);
        bandwidth_total += r.bandwidth.transfer_total;
        disk_used_max = disk_used_max.max(r.disk.used);
    }

    Some(AggregateRecord {
        datetime: bucket_key.to_string(),
        cpu: CpuAggregate {
            per_core_avg: per_core_sum.into_iter().map(|s| round2(s / n)).collect(),
            total_avg: round2(total_sum / n),
        },
        ram: RamAggregate {
            unit: Unit::Gigabytes,
            avg_used: round2(ram_avg_sum / n),
            min_used: round2(ram_min),
            max_used: round2(ram_max),
            total: first.ram.total,
        },
        disk: Usage::gigabytes(round2(disk_used_max), first.disk.total),
        bandwidth: Transfer::megabytes(round2(bandwidth_total)),
    })
}

/// True when both records were flushed in the same UTC hour of the same date.
pub fn same_hour(a: &AggregateRecord, b: &AggregateRecord) -> bool {
    match (a.instant(), b.instant()) {
        (Some(a), Some(b)) => a.date_naive() == b.date_naive() && a.hour() == b.hour(),
        _ => false,
    }
}

/// `YYYY-MM-DD` of an hourly record's UTC instant.
pub fn day_key(record: &AggregateRecord) -> Option<String> {
    record
        .instant()
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
}

/// `YYYY-MM` of a daily record (date key) or of an instant.
pub fn month_key(record: &AggregateRecord) -> Option<String> {
    if let Ok(date) = NaiveDate::parse_from_str(&record.datetime, "%Y-%m-%d") {
        return Some(date.format("%Y-%m").to_string());
    }
    record.instant().map(|dt| dt.format("%Y-%m").to_string())
}

/// Folds a freshly flushed record into the hourly series: a record from the same
/// hour as the last one is merged into it (keeping the last one's key), anything
/// else is appended. The series stays sorted by key.
pub fn fold_hourly(series: &mut Vec<AggregateRecord>, record: AggregateRecord) {
    if let Some(last) = series.last_mut()
        && same_hour(last, &record)
    {
        if let Some(merged) = merge_records(&[&*last, &record], &last.datetime) {
            *last = merged;
        }
        return;
    }
    series.push(record);
    series.sort_by(|a, b| a.datetime.cmp(&b.datetime));
}

/// Caps `series` at `max_records` and returns the records removed. `KeepNewest`
/// drops from the front, `KeepOldest` drops the newest records.
pub fn trim(
    series: &mut Vec<AggregateRecord>,
    max_records: usize,
    policy: TrimPolicy,
) -> Vec<AggregateRecord> {
    if series.len() <= max_records {
        return Vec::new();
    }
    match policy {
        TrimPolicy::KeepNewest => series.drain(..series.len() - max_records).collect(),
        TrimPolicy::KeepOldest => series.split_off(max_records),
    }
}

/// Adds trimmed-off records to the retired set. A record already retired under
/// the same key is replaced. The set stays sorted by key.
pub fn retire(retired: &mut Vec<AggregateRecord>, dropped: Vec<AggregateRecord>) {
    for record in dropped {
        match retired.iter_mut().find(|r| r.datetime == record.datetime) {
            Some(slot) => *slot = record,
            None => retired.push(record),
        }
    }
    retired.sort_by(|a, b| a.datetime.cmp(&b.datetime));
}

/// Keeps only the retired records whose coarse bucket still has live finer
/// records. Once a bucket has none left its coarse record is final.
pub fn prune_retired<F>(
    retired: Vec<AggregateRecord>,
    finer: &[AggregateRecord],
    key_of: F,
) -> Vec<AggregateRecord>
where
    F: Fn(&AggregateRecord) -> Option<String>,
{
    let live: BTreeSet<String> = finer.iter().filter_map(&key_of).collect();
    retired
        .into_iter()
        .filter(|r| key_of(r).is_some_and(|key| live.contains(&key)))
        .collect()
}

#[derive(Default)]
struct Bucket<'a> {
    retired: Vec<&'a AggregateRecord>,
    live: Vec<&'a AggregateRecord>,
    existing: Option<&'a AggregateRecord>,
}

/// Result of one rollup stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Rollup {
    /// Coarse series, sorted by key and capped at the retention limit.
    pub series: Vec<AggregateRecord>,
    /// Coarse records that fell off the front of the series.
    pub dropped: Vec<AggregateRecord>,
}

/// Rolls finer records up into coarser buckets named by `key_of`, together with
/// the `existing` coarse series (grouped by its own keys).
///
/// `live` is the finer series as stored; `retired` holds finer records already
/// trimmed from it whose bucket is still open. A bucket with live records is
/// recomputed from its retired and live records. A bucket without live records
/// keeps its existing record unchanged. Output is capped at the last
/// `max_records`, so re-running on unchanged input reproduces the same series.
pub fn rollup<F>(
    live: &[AggregateRecord],
    retired: &[AggregateRecord],
    existing: &[AggregateRecord],
    key_of: F,
    max_records: usize,
) -> Rollup
where
    F: Fn(&AggregateRecord) -> Option<String>,
{
    let mut buckets: BTreeMap<String, Bucket<'_>> = BTreeMap::new();
    for r in live {
        match key_of(r) {
            Some(key) => buckets.entry(key).or_default().live.push(r),
            None => tracing::warn!(datetime = %r.datetime, "skipping record with unparseable datetime"),
        }
    }
    let live_keys: BTreeSet<&str> = live.iter().map(|r| r.datetime.as_str()).collect();
    for r in retired {
        // A record left in both sets by an interrupted write counts once.
        if live_keys.contains(r.datetime.as_str()) {
            continue;
        }
        if let Some(key) = key_of(r) {
            buckets.entry(key).or_default().retired.push(r);
        }
    }
    for r in existing {
        buckets.entry(r.datetime.clone()).or_default().existing = Some(r);
    }

    let mut series: Vec<AggregateRecord> = buckets
        .into_iter()
        .filter_map(|(key, bucket)| {
            if bucket.live.is_empty() {
                return bucket.existing.cloned();
            }
            let mut members = bucket.retired;
            members.extend(bucket.live);
            merge_records(&members, &key)
        })
        .collect();

    let dropped = trim(&mut series, max_records, TrimPolicy::KeepNewest);
    Rollup { series, dropped }
}
