// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic environment signals.
//
// Every signal is best-effort: a source that cannot read one reports `None`
// and the consumers fall back to conservative defaults.

use std::sync::RwLock;

use folio_core::types::{BatteryStatus, NetworkClass};
use serde::{Deserialize, Serialize};

/// One reading of everything the assessor and budgeter look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSignals {
    /// Approximate device memory in gigabytes.
    pub device_memory_gb: Option<f32>,
    /// Logical CPU cores.
    pub logical_cores: Option<u32>,
    /// User agent or platform identification string.
    pub user_agent: Option<String>,
    /// Viewport width in logical pixels.
    pub viewport_width: Option<u32>,
    /// Maximum simultaneous touch points (0 = no touch input).
    pub touch_points: Option<u32>,
    pub network: Option<NetworkClass>,
    pub battery: Option<BatteryStatus>,
    /// Fraction of memory currently in use, 0-1.
    pub memory_usage_ratio: Option<f32>,
    /// Recent rendering frame rate.
    pub frame_rate: Option<f32>,
}

/// The fast-changing subset of the signals, read at every chunk boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveSignals {
    pub network: Option<NetworkClass>,
    pub battery: Option<BatteryStatus>,
    pub memory_usage_ratio: Option<f32>,
    pub frame_rate: Option<f32>,
}

impl From<&EnvironmentSignals> for LiveSignals {
    fn from(signals: &EnvironmentSignals) -> Self {
        Self {
            network: signals.network,
            battery: signals.battery,
            memory_usage_ratio: signals.memory_usage_ratio,
            frame_rate: signals.frame_rate,
        }
    }
}

/// Anything that can take a snapshot of the host environment.
///
/// Production code reads the real environment; tests hand in fixtures.
pub trait EnvironmentSignalSource: Send + Sync {
    /// Read every signal available right now.
    fn snapshot(&self) -> EnvironmentSignals;

    /// Human-readable source name for logs.
    fn source_name(&self) -> &str;
}

/// A source that returns whatever was last stored in it.
///
/// Used by tests, and by embedders that learn about the environment from
/// somewhere else (a UI shell pushing battery events, for example).
#[derive(Debug, Default)]
pub struct FixedSignals {
    signals: RwLock<EnvironmentSignals>,
}

impl FixedSignals {
    pub fn new(signals: EnvironmentSignals) -> Self {
        Self {
            signals: RwLock::new(signals),
        }
    }

    /// Replace the stored snapshot as a whole.
    pub fn set(&self, signals: EnvironmentSignals) {
        if let Ok(mut guard) = self.signals.write() {
            *guard = signals;
        }
    }

    /// Edit the stored snapshot in place.
    pub fn update(&self, edit: impl FnOnce(&mut EnvironmentSignals)) {
        if let Ok(mut guard) = self.signals.write() {
            edit(&mut guard);
        }
    }
}

impl EnvironmentSignalSource for FixedSignals {
    fn snapshot(&self) -> EnvironmentSignals {
        self.signals
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn source_name(&self) -> &str {
        "fixed"
    }
}
