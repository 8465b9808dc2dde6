// Domain models: live snapshot, aggregated records, series granularity

mod aggregation;
mod granularity;
mod snapshot;

pub use aggregation::{AggregateRecord, CpuAggregate, RamAggregate};
pub use granularity::Granularity;
pub use snapshot::{Snapshot, Transfer, Unit, Usage};

/// Rounds to 2 decimal digits (precision of everything written or streamed).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
