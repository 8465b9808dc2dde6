// Aggregation logic tests: merge, hourly folding, trimming, rollup buckets, retired records

mod common;

use common::{at, day_of_hourly, hour_key, hourly_record};
use hostmon::config::TrimPolicy;
use hostmon::history_repo::aggregation::{
    day_key, fold_hourly, merge_records, month_key, prune_retired, retire, rollup, same_hour, trim,
};
use hostmon::models::AggregateRecord;

fn daily_record(key: &str, cpu_total: f64, bandwidth: f64) -> AggregateRecord {
    hourly_record(key, cpu_total, 4.0, bandwidth, 30.0)
}

#[test]
fn merge_one_day_of_hourly_records() {
    let hourly = day_of_hourly(2025, 1, 2);
    let refs: Vec<&AggregateRecord> = hourly.iter().collect();

    let merged = merge_records(&refs, "2025-01-02").unwrap();
    assert_eq!(merged.datetime, "2025-01-02");
    assert_eq!(merged.cpu.total_avg, 41.5);
    assert_eq!(merged.cpu.per_core_avg, vec![41.5, 41.5]);
    assert_eq!(merged.disk.used, 45.0);
    assert_eq!(merged.disk.total, 100.0);
    assert_eq!(merged.bandwidth.transfer_total, 348.0);
    assert_eq!(merged.ram.avg_used, 4.0);
    assert_eq!(merged.ram.total, 32.0);
}

#[test]
fn merge_takes_extrema_of_inputs() {
    let a = hourly_record("a", 10.0, 3.0, 1.0, 20.0);
    let b = hourly_record("b", 20.0, 6.0, 1.0, 20.0);

    let merged = merge_records(&[&a, &b], "k").unwrap();
    assert_eq!(merged.ram.avg_used, 4.5);
    assert_eq!(merged.ram.min_used, 2.0);
    assert_eq!(merged.ram.max_used, 7.0);
}

#[test]
fn merge_is_order_independent_and_keyed_by_argument() {
    let a = hourly_record("2025-01-02T01:00:00.000000+00:00", 10.25, 3.5, 1.5, 20.0);
    let b = hourly_record("2025-01-02T02:00:00.000000+00:00", 20.5, 6.25, 2.0, 35.0);
    let c = hourly_record("2025-01-02T03:00:00.000000+00:00", 33.75, 1.0, 0.25, 25.0);

    let forward = merge_records(&[&a, &b, &c], "bucket").unwrap();
    let reversed = merge_records(&[&c, &a, &b], "bucket").unwrap();
    assert_eq!(forward, reversed);
    assert_eq!(forward.datetime, "bucket");
    assert_eq!(forward.bandwidth.transfer_total, 3.75);
    assert_eq!(forward.disk.used, 35.0);
}

#[test]
fn merge_of_nothing_is_none() {
    assert!(merge_records(&[], "2025-01-02").is_none());
}

#[test]
fn same_hour_requires_same_date_and_hour() {
    let a = hourly_record(&hour_key(at(2025, 1, 2, 10, 5)), 0.0, 0.0, 0.0, 0.0);
    let b = hourly_record(&hour_key(at(2025, 1, 2, 10, 55)), 0.0, 0.0, 0.0, 0.0);
    let next_day = hourly_record(&hour_key(at(2025, 1, 3, 10, 5)), 0.0, 0.0, 0.0, 0.0);
    let next_hour = hourly_record(&hour_key(at(2025, 1, 2, 11, 0)), 0.0, 0.0, 0.0, 0.0);

    assert!(same_hour(&a, &b));
    assert!(!same_hour(&a, &next_day));
    assert!(!same_hour(&b, &next_hour));
}

#[test]
fn fold_hourly_merges_same_hour_into_last_record() {
    let first = hourly_record(&hour_key(at(2025, 1, 2, 10, 0)), 10.0, 4.0, 5.0, 30.0);
    let again = hourly_record(&hour_key(at(2025, 1, 2, 10, 40)), 30.0, 4.0, 2.0, 31.0);
    let mut series = vec![first.clone()];

    fold_hourly(&mut series, again);
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].datetime, first.datetime);
    assert_eq!(series[0].cpu.total_avg, 20.0);
    assert_eq!(series[0].bandwidth.transfer_total, 7.0);
    assert_eq!(series[0].disk.used, 31.0);
}

#[test]
fn fold_hourly_appends_new_hour_in_order() {
    let ten = hourly_record(&hour_key(at(2025, 1, 2, 10, 0)), 10.0, 4.0, 5.0, 30.0);
    let eleven = hourly_record(&hour_key(at(2025, 1, 2, 11, 0)), 10.0, 4.0, 5.0, 30.0);
    let nine = hourly_record(&hour_key(at(2025, 1, 2, 9, 0)), 10.0, 4.0, 5.0, 30.0);
    let mut series = vec![ten.clone()];

    fold_hourly(&mut series, eleven.clone());
    fold_hourly(&mut series, nine.clone());
    let keys: Vec<&str> = series.iter().map(|r| r.datetime.as_str()).collect();
    assert_eq!(keys, vec![nine.datetime.as_str(), ten.datetime.as_str(), eleven.datetime.as_str()]);
}

#[test]
fn trim_keep_newest_drops_front() {
    let mut series: Vec<_> = (0..5).map(|i| daily_record(&format!("2025-01-0{}", i + 1), 1.0, 1.0)).collect();
    let dropped = trim(&mut series, 3, TrimPolicy::KeepNewest);
    let keys: Vec<&str> = series.iter().map(|r| r.datetime.as_str()).collect();
    assert_eq!(keys, vec!["2025-01-03", "2025-01-04", "2025-01-05"]);
    let dropped: Vec<&str> = dropped.iter().map(|r| r.datetime.as_str()).collect();
    assert_eq!(dropped, vec!["2025-01-01", "2025-01-02"]);
}

#[test]
fn trim_keep_oldest_drops_newest() {
    let mut series: Vec<_> = (0..5).map(|i| daily_record(&format!("2025-01-0{}", i + 1), 1.0, 1.0)).collect();
    let dropped = trim(&mut series, 3, TrimPolicy::KeepOldest);
    let keys: Vec<&str> = series.iter().map(|r| r.datetime.as_str()).collect();
    assert_eq!(keys, vec!["2025-01-01", "2025-01-02", "2025-01-03"]);
    assert_eq!(dropped.len(), 2);
}

#[test]
fn trim_under_limit_is_noop() {
    let mut series = vec![daily_record("2025-01-01", 1.0, 1.0)];
    assert!(trim(&mut series, 3, TrimPolicy::KeepNewest).is_empty());
    assert_eq!(series.len(), 1);
}

#[test]
fn bucket_keys() {
    let hourly = hourly_record("2025-01-31T23:59:00.000000+00:00", 0.0, 0.0, 0.0, 0.0);
    assert_eq!(day_key(&hourly).as_deref(), Some("2025-01-31"));
    assert_eq!(month_key(&hourly).as_deref(), Some("2025-01"));
    assert_eq!(month_key(&daily_record("2025-02-14", 0.0, 0.0)).as_deref(), Some("2025-02"));
    assert_eq!(day_key(&daily_record("garbage", 0.0, 0.0)), None);
}

#[test]
fn daily_rollup_from_hourly() {
    let hourly = day_of_hourly(2025, 1, 2);
    let daily = rollup(&hourly, &[], &[], day_key, 30).series;

    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].datetime, "2025-01-02");
    assert_eq!(daily[0].cpu.total_avg, 41.5);
    assert_eq!(daily[0].disk.used, 45.0);
    assert_eq!(daily[0].bandwidth.transfer_total, 348.0);
}

#[test]
fn rollup_keeps_existing_buckets_without_finer_records() {
    let existing = vec![daily_record("2025-01-01", 12.0, 99.0)];
    let hourly = day_of_hourly(2025, 1, 2);

    let daily = rollup(&hourly, &[], &existing, day_key, 30).series;
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0], existing[0]);
    assert_eq!(daily[1].datetime, "2025-01-02");
}

#[test]
fn rollup_recomputes_bucket_instead_of_remerging() {
    let hourly = day_of_hourly(2025, 1, 2);
    let first = rollup(&hourly, &[], &[], day_key, 30).series;
    let second = rollup(&hourly, &[], &first, day_key, 30).series;
    let third = rollup(&hourly, &[], &second, day_key, 30).series;

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(third[0].bandwidth.transfer_total, 348.0);
}

#[test]
fn rollup_folds_late_hours_into_current_day() {
    let mut hourly = day_of_hourly(2025, 1, 2);
    hourly.truncate(12);
    let partial = rollup(&hourly, &[], &[], day_key, 30).series;
    assert_eq!(partial[0].bandwidth.transfer_total, (3..15).sum::<i32>() as f64);

    let full = rollup(&day_of_hourly(2025, 1, 2), &[], &partial, day_key, 30).series;
    assert_eq!(full.len(), 1);
    assert_eq!(full[0].bandwidth.transfer_total, 348.0);
}

#[test]
fn rollup_counts_retired_records_of_open_bucket() {
    // The hourly series has already lost the first 20 hours of 2025-01-02.
    let mut hourly = day_of_hourly(2025, 1, 2);
    let retired: Vec<_> = hourly.drain(..20).collect();
    hourly.extend(day_of_hourly(2025, 1, 3));
    let existing = vec![daily_record("2025-01-02", 41.5, 300.0)];

    let daily = rollup(&hourly, &retired, &existing, day_key, 30).series;
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].datetime, "2025-01-02");
    assert_eq!(daily[0].bandwidth.transfer_total, 348.0);
    assert_eq!(daily[0].disk.used, 45.0);
    assert_eq!(daily[1].bandwidth.transfer_total, 348.0);

    // Without the retired hours the bucket holds only what is left.
    let daily = rollup(&hourly, &[], &existing, day_key, 30).series;
    assert_eq!(daily[0].bandwidth.transfer_total, (23..27).sum::<i32>() as f64);
}

#[test]
fn rollup_current_month_oldest_bucket_at_capacity_is_recomputed() {
    // Daily series full at 30 days, all from the month still being written.
    let daily: Vec<_> = (2..=31)
        .map(|d| daily_record(&format!("2025-01-{d:02}"), 10.0, 24.0))
        .collect();
    let retired = vec![daily_record("2025-01-01", 10.0, 24.0)];
    let existing = vec![daily_record("2025-01", 10.0, 672.0)];

    let monthly = rollup(&daily, &retired, &existing, month_key, 12).series;
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].bandwidth.transfer_total, 744.0);
}

#[test]
fn rollup_ignores_retired_records_still_in_live_series() {
    let hourly = day_of_hourly(2025, 1, 2);
    let daily = rollup(&hourly, &hourly[..5], &[], day_key, 30).series;
    assert_eq!(daily[0].bandwidth.transfer_total, 348.0);
}

#[test]
fn rollup_reports_buckets_trimmed_off_the_front() {
    let mut hourly = day_of_hourly(2025, 1, 1);
    hourly.extend(day_of_hourly(2025, 1, 2));
    hourly.extend(day_of_hourly(2025, 1, 3));

    let result = rollup(&hourly, &[], &[], day_key, 2);
    assert_eq!(result.dropped.len(), 1);
    assert_eq!(result.dropped[0].datetime, "2025-01-01");
    assert_eq!(result.dropped[0].bandwidth.transfer_total, 348.0);
}

#[test]
fn retire_replaces_same_key_and_sorts() {
    let mut retired = vec![daily_record("2025-01-03", 1.0, 1.0)];
    retire(
        &mut retired,
        vec![daily_record("2025-01-01", 1.0, 5.0), daily_record("2025-01-03", 1.0, 9.0)],
    );
    let keys: Vec<&str> = retired.iter().map(|r| r.datetime.as_str()).collect();
    assert_eq!(keys, vec!["2025-01-01", "2025-01-03"]);
    assert_eq!(retired[1].bandwidth.transfer_total, 9.0);
}

#[test]
fn prune_retired_keeps_only_open_buckets() {
    let retired = vec![
        daily_record("2024-12-31", 1.0, 1.0),
        daily_record("2025-01-01", 1.0, 1.0),
    ];
    let daily = vec![daily_record("2025-01-02", 1.0, 1.0)];
    let kept = prune_retired(retired, &daily, month_key);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].datetime, "2025-01-01");
}

#[test]
fn rollup_caps_to_newest_buckets() {
    let mut hourly = day_of_hourly(2025, 1, 1);
    hourly.extend(day_of_hourly(2025, 1, 2));
    hourly.extend(day_of_hourly(2025, 1, 3));

    let daily = rollup(&hourly, &[], &[], day_key, 2).series;
    let keys: Vec<&str> = daily.iter().map(|r| r.datetime.as_str()).collect();
    assert_eq!(keys, vec!["2025-01-02", "2025-01-03"]);
}

#[test]
fn monthly_rollup_from_daily() {
    let daily = vec![
        daily_record("2025-01-30", 10.0, 100.0),
        daily_record("2025-01-31", 30.0, 50.0),
        daily_record("2025-02-01", 50.0, 25.0),
    ];
    let existing = vec![daily_record("2024-12", 5.0, 1000.0)];

    let monthly = rollup(&daily, &[], &existing, month_key, 12).series;
    let keys: Vec<&str> = monthly.iter().map(|r| r.datetime.as_str()).collect();
    assert_eq!(keys, vec!["2024-12", "2025-01", "2025-02"]);
    assert_eq!(monthly[1].cpu.total_avg, 20.0);
    assert_eq!(monthly[1].bandwidth.transfer_total, 150.0);
    assert_eq!(monthly[2].bandwidth.transfer_total, 25.0);
}

#[test]
fn rollup_skips_unparseable_finer_records() {
    let mut hourly = day_of_hourly(2025, 1, 2);
    hourly.push(hourly_record("not-a-date", 99.0, 4.0, 1000.0, 99.0));

    let daily = rollup(&hourly, &[], &[], day_key, 30).series;
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].bandwidth.transfer_total, 348.0);
}
