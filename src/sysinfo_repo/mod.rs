// Host sampling via sysinfo: per-core CPU, RAM, one disk mount, network transfer delta.
// Disk space comes from statvfs on unix so that used = total - free.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sysinfo::{Disks, Networks, System};

use crate::models::{Snapshot, Transfer, Usage};
use crate::monitor::SampleSource;

const BYTES_PER_GB: f64 = (1u64 << 30) as f64;
const BYTES_PER_MB: f64 = (1u64 << 20) as f64;

pub struct SysinfoRepo {
    sys: System,
    disks: Disks,
    networks: Networks,
    disk_mount: PathBuf,
    /// Bytes sent + received over all interfaces at the previous sample.
    last_network_total: u64,
}

impl SysinfoRepo {
    pub fn new(disk_mount: impl Into<PathBuf>) -> Self {
        let mut sys = System::new();
        // First refresh only establishes the CPU usage baseline.
        sys.refresh_cpu_all();
        sys.refresh_memory();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();
        let last_network_total = network_total(&networks);
        Self {
            sys,
            disks,
            networks,
            disk_mount: disk_mount.into(),
            last_network_total,
        }
    }

    fn cpu_per_core(&mut self) -> Vec<f64> {
        self.sys.refresh_cpu_all();
        self.sys
            .cpus()
            .iter()
            .map(|c| (c.cpu_usage() as f64).clamp(0.0, 100.0))
            .collect()
    }

    fn ram(&mut self) -> Usage {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        let used = total.saturating_sub(self.sys.available_memory());
        Usage::gigabytes(used as f64 / BYTES_PER_GB, total as f64 / BYTES_PER_GB)
    }

    fn disk(&mut self) -> Usage {
        if let Some(usage) = filesystem_usage(&self.disk_mount) {
            return usage;
        }
        self.disks.refresh(false);
        let list = self.disks.list();
        let Some(disk) = list
            .iter()
            .find(|d| d.mount_point() == self.disk_mount.as_path())
            .or_else(|| list.first())
        else {
            return Usage::gigabytes(0.0, 0.0);
        };
        if let Some(usage) = filesystem_usage(disk.mount_point()) {
            return usage;
        }
        // Without statvfs, space reserved for root counts as used.
        let total = disk.total_space();
        let used = total.saturating_sub(disk.available_space());
        Usage::gigabytes(used as f64 / BYTES_PER_GB, total as f64 / BYTES_PER_GB)
    }

    fn bandwidth(&mut self) -> Transfer {
        self.networks.refresh(true);
        let total = network_total(&self.networks);
        // Counters can go backwards when an interface disappears.
        let delta = total.saturating_sub(self.last_network_total);
        self.last_network_total = total;
        Transfer::megabytes(delta as f64 / BYTES_PER_MB)
    }
}

/// Used and total space of the filesystem holding `path`, with used = total - free
/// (space reserved for root is not counted as used). `None` when `path` cannot be
/// queried.
#[cfg(unix)]
fn filesystem_usage(path: &Path) -> Option<Usage> {
    let stat = nix::sys::statvfs::statvfs(path).ok()?;
    let fragment = stat.fragment_size() as u64;
    let total = stat.blocks() as u64 * fragment;
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(stat.blocks_free() as u64 * fragment);
    Some(Usage::gigabytes(used as f64 / BYTES_PER_GB, total as f64 / BYTES_PER_GB))
}

#[cfg(not(unix))]
fn filesystem_usage(_path: &Path) -> Option<Usage> {
    None
}

fn network_total(networks: &Networks) -> u64 {
    networks
        .list()
        .values()
        .map(|data| data.total_received() + data.total_transmitted())
        .sum()
}

impl SampleSource for SysinfoRepo {
    fn sample(&mut self) -> anyhow::Result<Snapshot> {
        Ok(Snapshot {
            datetime: Utc::now(),
            cpu: self.cpu_per_core(),
            ram: self.ram(),
            disk: self.disk(),
            bandwidth: self.bandwidth(),
        })
    }
}
