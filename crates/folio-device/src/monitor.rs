// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live device state and the background loop that keeps it fresh.
//
// The monitor is the only writer: it polls the signal source on a fixed
// interval, reassesses the tier, recomputes the budget, and replaces the
// published state as a whole. Processing code only ever reads a complete
// snapshot.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use folio_core::config::CriticalLimits;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::budget::{ResourceBudget, ResourceBudgeter};
use crate::capability::{CapabilityAssessor, CapabilityProfile};
use crate::signals::LiveSignals;

/// Everything the pipeline needs to know about the device right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub profile: CapabilityProfile,
    pub budget: ResourceBudget,
    pub live: LiveSignals,
}

impl DeviceState {
    /// Assess the environment once and derive a fresh budget.
    pub fn sample(assessor: &CapabilityAssessor, budgeter: &ResourceBudgeter) -> Self {
        let snapshot = assessor.source().snapshot();
        let profile = crate::capability::classify(&snapshot);
        let live = LiveSignals::from(&snapshot);
        let budget = budgeter.budget_for(&profile, &live);
        Self {
            profile,
            budget,
            live,
        }
    }
}

/// Why a batch must stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalCondition {
    MemoryPressure { ratio: f32 },
    LowFrameRate { fps: f32 },
    TooManyErrors { count: usize },
}

impl std::fmt::Display for CriticalCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoryPressure { ratio } => {
                write!(f, "memory usage at {:.0}%", ratio * 100.0)
            }
            Self::LowFrameRate { fps } => write!(f, "frame rate dropped to {fps:.1} fps"),
            Self::TooManyErrors { count } => write!(f, "{count} images failed"),
        }
    }
}

/// Compare live readings and the running error count against hard limits.
pub fn check_critical(
    live: &LiveSignals,
    errors: usize,
    limits: &CriticalLimits,
) -> Option<CriticalCondition> {
    if let Some(ratio) = live.memory_usage_ratio.filter(|r| *r > limits.max_memory_ratio) {
        return Some(CriticalCondition::MemoryPressure { ratio });
    }
    if let Some(fps) = live.frame_rate.filter(|f| *f < limits.min_frame_rate) {
        return Some(CriticalCondition::LowFrameRate { fps });
    }
    if errors > limits.max_errors {
        return Some(CriticalCondition::TooManyErrors { count: errors });
    }
    None
}

/// Holds the latest published `DeviceState`.
///
/// Writers replace the whole value; readers get a cheap `Arc` clone.
#[derive(Debug)]
pub struct SignalBoard {
    state: RwLock<Arc<DeviceState>>,
}

impl SignalBoard {
    pub fn new(initial: DeviceState) -> Self {
        Self {
            state: RwLock::new(Arc::new(initial)),
        }
    }

    /// The most recently published state.
    pub fn current(&self) -> Arc<DeviceState> {
        match self.state.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Replace the published state.
    pub fn publish(&self, next: DeviceState) {
        let next = Arc::new(next);
        match self.state.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Replace only the live readings, recomputing the budget for them.
    pub fn publish_live(&self, live: LiveSignals, budgeter: &ResourceBudgeter) {
        let current = self.current();
        let budget = budgeter.budget_for(&current.profile, &live);
        self.publish(DeviceState {
            profile: current.profile.clone(),
            budget,
            live,
        });
    }
}

/// Background polling loop feeding a `SignalBoard`.
pub struct SignalMonitor {
    handle: JoinHandle<()>,
    shutdown: Arc<Notify>,
}

impl SignalMonitor {
    /// Start polling every `interval`. Must be called inside a tokio runtime.
    pub fn spawn(
        assessor: CapabilityAssessor,
        budgeter: ResourceBudgeter,
        board: Arc<SignalBoard>,
        interval: Duration,
    ) -> Self {
        let shutdown = Arc::new(Notify::new());
        let stop = Arc::clone(&shutdown);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval_ms = interval.as_millis() as u64, "signal monitor started");

            loop {
                tokio::select! {
                    _ = stop.notified() => {
                        info!("signal monitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let next = DeviceState::sample(&assessor, &budgeter);
                        let previous = board.current();
                        if *previous == next {
                            continue;
                        }
                        if previous.profile.tier != next.profile.tier {
                            info!(
                                from = %previous.profile.tier,
                                to = %next.profile.tier,
                                "device tier changed"
                            );
                        }
                        for notice in &next.budget.notices {
                            if !previous.budget.notices.contains(notice) {
                                warn!("{}", notice.message());
                            }
                        }
                        debug!(live = ?next.live, "device state updated");
                        board.publish(next);
                    }
                }
            }
        });

        Self { handle, shutdown }
    }

    /// Ask the loop to exit and wait for it.
    pub async fn stop(self) {
        self.shutdown.notify_one();
        if let Err(err) = self.handle.await {
            warn!("signal monitor task ended abnormally: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{EnvironmentSignals, FixedSignals};
    use folio_core::types::{BatteryStatus, CapabilityTier};

    fn desktop() -> EnvironmentSignals {
        EnvironmentSignals {
            device_memory_gb: Some(16.0),
            logical_cores: Some(8),
            ..Default::default()
        }
    }

    #[test]
    fn critical_thresholds() {
        let limits = CriticalLimits::default();
        let calm = LiveSignals {
            memory_usage_ratio: Some(0.5),
            frame_rate: Some(60.0),
            ..Default::default()
        };
        assert_eq!(check_critical(&calm, 0, &limits), None);
        assert_eq!(check_critical(&calm, 5, &limits), None);
        assert_eq!(
            check_critical(&calm, 6, &limits),
            Some(CriticalCondition::TooManyErrors { count: 6 })
        );

        let pressured = LiveSignals {
            memory_usage_ratio: Some(0.95),
            ..calm
        };
        assert!(matches!(
            check_critical(&pressured, 0, &limits),
            Some(CriticalCondition::MemoryPressure { .. })
        ));

        let janky = LiveSignals {
            frame_rate: Some(8.0),
            ..calm
        };
        assert!(matches!(
            check_critical(&janky, 0, &limits),
            Some(CriticalCondition::LowFrameRate { .. })
        ));

        // Unknown readings never trip the check.
        assert_eq!(check_critical(&LiveSignals::default(), 0, &limits), None);
    }

    #[test]
    fn publish_live_recomputes_budget() {
        let assessor = CapabilityAssessor::new(Arc::new(FixedSignals::new(desktop())));
        let budgeter = ResourceBudgeter::new();
        let board = SignalBoard::new(DeviceState::sample(&assessor, &budgeter));
        assert_eq!(board.current().budget.inter_batch_delay_ms, 100);

        board.publish_live(
            LiveSignals {
                battery: Some(BatteryStatus {
                    level: 0.1,
                    charging: false,
                }),
                ..Default::default()
            },
            &budgeter,
        );
        let state = board.current();
        assert_eq!(state.budget.max_batch_size, 1);
        assert!(state.budget.inter_batch_delay_ms >= 1_000);
    }

    #[tokio::test]
    async fn monitor_publishes_environment_changes() {
        let source = Arc::new(FixedSignals::new(desktop()));
        let assessor = CapabilityAssessor::new(source.clone());
        let budgeter = ResourceBudgeter::new();
        let board = Arc::new(SignalBoard::new(DeviceState::sample(&assessor, &budgeter)));
        assert_eq!(board.current().profile.tier, CapabilityTier::High);

        let monitor = SignalMonitor::spawn(
            assessor,
            budgeter,
            Arc::clone(&board),
            Duration::from_millis(10),
        );

        source.update(|s| s.network = Some(folio_core::types::NetworkClass::TwoG));

        let mut tier = board.current().profile.tier;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tier = board.current().profile.tier;
            if tier == CapabilityTier::Low {
                break;
            }
        }
        monitor.stop().await;
        assert_eq!(tier, CapabilityTier::Low);
    }
}
