// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Environment signals read from the machine we are running on.
//
// Memory comes from `sysinfo` on every platform. Battery is read from sysfs,
// so it is only known on Linux; other signals are reported as unavailable.

use std::path::{Path, PathBuf};

use folio_core::types::BatteryStatus;
use sysinfo::System;
use tracing::debug;

use crate::signals::{EnvironmentSignalSource, EnvironmentSignals};

/// Reads signals from the host operating system.
#[derive(Debug, Clone)]
pub struct HostSignals {
    power_supply_dir: PathBuf,
}

impl Default for HostSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSignals {
    pub fn new() -> Self {
        Self::with_power_supply_dir("/sys/class/power_supply")
    }

    /// Read batteries from another sysfs location.
    pub fn with_power_supply_dir(power_supply_dir: impl Into<PathBuf>) -> Self {
        Self {
            power_supply_dir: power_supply_dir.into(),
        }
    }

    fn memory(&self) -> (Option<f32>, Option<f32>) {
        let mut system = System::new();
        system.refresh_memory();
        memory_signals(system.total_memory(), system.used_memory())
    }

    fn battery(&self) -> Option<BatteryStatus> {
        let entries = std::fs::read_dir(&self.power_supply_dir).ok()?;
        for entry in entries.flatten() {
            let dir = entry.path();
            if read_trimmed(&dir.join("type")).as_deref() != Some("Battery") {
                continue;
            }
            let capacity: f32 = read_trimmed(&dir.join("capacity"))?.parse().ok()?;
            let status = read_trimmed(&dir.join("status")).unwrap_or_default();
            return Some(BatteryStatus {
                level: (capacity / 100.0).clamp(0.0, 1.0),
                charging: matches!(status.as_str(), "Charging" | "Full"),
            });
        }
        None
    }
}

impl EnvironmentSignalSource for HostSignals {
    fn snapshot(&self) -> EnvironmentSignals {
        let logical_cores = std::thread::available_parallelism()
            .ok()
            .map(|n| n.get() as u32);
        let (device_memory_gb, memory_usage_ratio) = self.memory();
        let battery = self.battery();

        let signals = EnvironmentSignals {
            device_memory_gb,
            logical_cores,
            user_agent: Some(platform_string()),
            viewport_width: None,
            touch_points: None,
            network: None,
            battery,
            memory_usage_ratio,
            frame_rate: None,
        };
        debug!(?signals, "host signals sampled");
        signals
    }

    fn source_name(&self) -> &str {
        "host"
    }
}

/// Operating system and architecture, shaped like a user-agent token.
fn platform_string() -> String {
    let os = match std::env::consts::OS {
        "android" => "Android",
        "ios" => "iPhone OS",
        "linux" => "Linux",
        "macos" => "Macintosh",
        "windows" => "Windows",
        other => other,
    };
    format!("{} ({})", os, std::env::consts::ARCH)
}

/// Total memory in GB and the used fraction, from byte counts. A zero total
/// means the platform reported nothing.
fn memory_signals(total_bytes: u64, used_bytes: u64) -> (Option<f32>, Option<f32>) {
    if total_bytes == 0 {
        return (None, None);
    }
    let total = total_bytes as f64;
    let gb = (total / (1024.0 * 1024.0 * 1024.0)) as f32;
    let ratio = (used_bytes as f64 / total).clamp(0.0, 1.0) as f32;
    (Some(gb), Some(ratio))
}

fn read_trimmed(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
}
