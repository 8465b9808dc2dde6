// Per-second host snapshot (realtime stream + accumulator input)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display unit attached to every size/transfer figure on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "GB")]
    Gigabytes,
    #[serde(rename = "MB")]
    Megabytes,
}

impl Unit {
    pub fn gigabytes() -> Self {
        Unit::Gigabytes
    }

    pub fn megabytes() -> Self {
        Unit::Megabytes
    }
}

/// Used/total pair in GB (RAM, disk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub used: f64,
    pub total: f64,
    #[serde(default = "Unit::gigabytes")]
    pub unit: Unit,
}

impl Usage {
    pub fn gigabytes(used: f64, total: f64) -> Self {
        Self {
            used,
            total,
            unit: Unit::Gigabytes,
        }
    }
}

/// Network transfer in MB (sent + received).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub transfer_total: f64,
    #[serde(default = "Unit::megabytes")]
    pub unit: Unit,
}

impl Transfer {
    pub fn megabytes(transfer_total: f64) -> Self {
        Self {
            transfer_total,
            unit: Unit::Megabytes,
        }
    }
}

/// One sample of the host. `cpu` holds per-core utilisation percentages;
/// `bandwidth` is the delta since the previous sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub datetime: DateTime<Utc>,
    pub cpu: Vec<f64>,
    pub ram: Usage,
    pub disk: Usage,
    pub bandwidth: Transfer,
}

impl Snapshot {
    /// Copy with every figure rounded to 2 decimals (wire precision).
    pub fn rounded(&self) -> Self {
        Self {
            datetime: self.datetime,
            cpu: self.cpu.iter().copied().map(super::round2).collect(),
            ram: Usage::gigabytes(super::round2(self.ram.used), super::round2(self.ram.total)),
            disk: Usage::gigabytes(super::round2(self.disk.used), super::round2(self.disk.total)),
            bandwidth: Transfer::megabytes(super::round2(self.bandwidth.transfer_total)),
        }
    }
}
