// Display-side conversion of stored (UTC) records into a client timezone.
// Storage never sees these strings; everything here works on owned copies.

use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{MonitorError, Result};
use crate::models::{AggregateRecord, Granularity};

/// Zone used when the client does not send one.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Resolves an IANA zone name (e.g. "Asia/Ho_Chi_Minh").
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| MonitorError::InvalidTimezone(name.to_string()))
}

/// Last `max_records` of `records`, with keys rewritten for display in `tz`:
/// hourly `MM-DD HHh`, daily `YYYY-MM-DD`, monthly untouched.
pub fn present(
    mut records: Vec<AggregateRecord>,
    granularity: Granularity,
    tz: Tz,
    max_records: usize,
) -> Vec<AggregateRecord> {
    let skip = records.len().saturating_sub(max_records);
    records.drain(..skip);
    for record in &mut records {
        if let Some(display) = display_key(record, granularity, tz) {
            record.datetime = display;
        }
    }
    records
}

fn display_key(record: &AggregateRecord, granularity: Granularity, tz: Tz) -> Option<String> {
    match granularity {
        Granularity::Hourly => record
            .instant()
            .map(|dt| dt.with_timezone(&tz).format("%m-%d %Hh").to_string()),
        Granularity::Daily => {
            // Date keys are read as UTC midnight before conversion.
            let date = NaiveDate::parse_from_str(&record.datetime, "%Y-%m-%d").ok()?;
            let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?);
            Some(midnight.with_timezone(&tz).format("%Y-%m-%d").to_string())
        }
        Granularity::Monthly => None,
    }
}
