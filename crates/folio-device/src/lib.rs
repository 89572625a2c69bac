// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-device — Device capability assessment and resource budgeting.
//
// Reads environment signals (memory, cores, mobile hints, network, battery)
// through a swappable source, classifies the device into a tier, derives the
// processing budget, and keeps a live copy of both up to date.

pub mod budget;
pub mod capability;
pub mod host;
pub mod monitor;
pub mod signals;

use std::sync::Arc;

pub use budget::{BudgetNotice, ResourceBudget, ResourceBudgeter};
pub use capability::{CapabilityAssessor, CapabilityProfile};
pub use host::HostSignals;
pub use monitor::{CriticalCondition, DeviceState, SignalBoard, SignalMonitor, check_critical};
pub use signals::{EnvironmentSignalSource, EnvironmentSignals, FixedSignals, LiveSignals};

/// The signal source for the machine we are running on.
pub fn host_signal_source() -> Arc<dyn EnvironmentSignalSource> {
    Arc::new(HostSignals::new())
}
