// Model serialization tests (wire field names, units, legacy files)

use hostmon::models::*;

#[test]
fn test_snapshot_serialization_units() {
    let snapshot = Snapshot {
        datetime: "2025-01-02T10:00:00Z".parse().unwrap(),
        cpu: vec![12.5, 40.0],
        ram: Usage::gigabytes(7.5, 32.0),
        disk: Usage::gigabytes(120.25, 512.0),
        bandwidth: Transfer::megabytes(1.75),
    };
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["cpu"], serde_json::json!([12.5, 40.0]));
    assert_eq!(json["ram"]["used"], 7.5);
    assert_eq!(json["ram"]["unit"], "GB");
    assert_eq!(json["disk"]["total"], 512.0);
    assert_eq!(json["bandwidth"]["transfer_total"], 1.75);
    assert_eq!(json["bandwidth"]["unit"], "MB");

    let back: Snapshot = serde_json::from_value(json).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn test_snapshot_rounded_to_two_decimals() {
    let snapshot = Snapshot {
        datetime: "2025-01-02T10:00:00Z".parse().unwrap(),
        cpu: vec![33.333333, 66.666666],
        ram: Usage::gigabytes(7.4444, 31.2999),
        disk: Usage::gigabytes(1.0, 2.0),
        bandwidth: Transfer::megabytes(0.123),
    };
    let rounded = snapshot.rounded();
    assert_eq!(rounded.cpu, vec![33.33, 66.67]);
    assert_eq!(rounded.ram.used, 7.44);
    assert_eq!(rounded.ram.total, 31.3);
    assert_eq!(rounded.bandwidth.transfer_total, 0.12);
    assert_eq!(rounded.datetime, snapshot.datetime);
}

#[test]
fn test_aggregate_record_field_names() {
    let record = AggregateRecord {
        datetime: "2025-01-02".into(),
        cpu: CpuAggregate {
            per_core_avg: vec![10.0, 20.0],
            total_avg: 15.0,
        },
        ram: RamAggregate {
            unit: Unit::Gigabytes,
            avg_used: 4.0,
            min_used: 3.0,
            max_used: 5.0,
            total: 32.0,
        },
        disk: Usage::gigabytes(45.0, 100.0),
        bandwidth: Transfer::megabytes(348.0),
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["datetime"], "2025-01-02");
    assert_eq!(json["cpu"]["cpu_per_core_avg"], serde_json::json!([10.0, 20.0]));
    assert_eq!(json["cpu"]["cpu_total_avg"], 15.0);
    assert_eq!(json["ram"]["unit"], "GB");
    assert_eq!(json["ram"]["avg_used"], 4.0);
    assert_eq!(json["ram"]["min_used"], 3.0);
    assert_eq!(json["ram"]["max_used"], 5.0);
    assert_eq!(json["disk"]["used"], 45.0);
    assert_eq!(json["bandwidth"]["transfer_total"], 348.0);
}

#[test]
fn test_aggregate_record_reads_files_without_units() {
    let raw = r#"{
        "datetime": "2025-01",
        "cpu": {"cpu_per_core_avg": [1.0], "cpu_total_avg": 1.0},
        "ram": {"avg_used": 2.0, "min_used": 1.0, "max_used": 3.0, "total": 16.0},
        "disk": {"used": 10.0, "total": 100.0},
        "bandwidth": {"transfer_total": 5.0}
    }"#;
    let record: AggregateRecord = serde_json::from_str(raw).unwrap();
    assert_eq!(record.ram.unit, Unit::Gigabytes);
    assert_eq!(record.disk.unit, Unit::Gigabytes);
    assert_eq!(record.bandwidth.unit, Unit::Megabytes);
}

#[test]
fn test_aggregate_record_instant() {
    let mut record: AggregateRecord = serde_json::from_value(serde_json::json!({
        "datetime": "2025-01-02T10:00:00.000000+07:00",
        "cpu": {"cpu_per_core_avg": [], "cpu_total_avg": 0.0},
        "ram": {"avg_used": 0.0, "min_used": 0.0, "max_used": 0.0, "total": 0.0},
        "disk": {"used": 0.0, "total": 0.0},
        "bandwidth": {"transfer_total": 0.0}
    }))
    .unwrap();
    let instant = record.instant().unwrap();
    assert_eq!(instant.to_rfc3339(), "2025-01-02T03:00:00+00:00");

    record.datetime = "2025-01-02".into();
    assert!(record.instant().is_none());
}

#[test]
fn test_granularity_names() {
    assert_eq!(serde_json::to_string(&Granularity::Hourly).unwrap(), "\"hourly\"");
    let g: Granularity = serde_json::from_str("\"monthly\"").unwrap();
    assert_eq!(g, Granularity::Monthly);
    assert!(serde_json::from_str::<Granularity>("\"weekly\"").is_err());
    assert_eq!(Granularity::Daily.file_name(), "monitor_1day.json");
    assert_eq!(Granularity::Daily.to_string(), "daily");
}

#[test]
fn test_round2() {
    assert_eq!(round2(41.499), 41.5);
    assert_eq!(round2(-1.236), -1.24);
    assert_eq!(round2(3.0), 3.0);
}
