// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability assessment — classify the device into a low/medium/high tier.

use std::sync::{Arc, LazyLock};

use folio_core::types::{BatteryStatus, CapabilityTier, NetworkClass};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::signals::{EnvironmentSignalSource, EnvironmentSignals};

/// Assumed core count when the host does not report one.
pub const DEFAULT_CORES: u32 = 2;
/// Assumed memory (GB) when the host does not report it.
pub const DEFAULT_MEMORY_GB: f32 = 2.0;
/// Viewports at or below this width are treated as mobile.
pub const MOBILE_VIEWPORT_MAX: u32 = 768;

static MOBILE_AGENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)android|webos|iphone|ipad|ipod|blackberry|iemobile|opera mini|mobile")
        .expect("mobile user agent pattern is valid")
});

/// Tier plus the (defaulted) signals it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityProfile {
    pub tier: CapabilityTier,
    pub memory_gb: f32,
    pub cores: u32,
    pub is_mobile: bool,
    pub network: Option<NetworkClass>,
    pub battery: Option<BatteryStatus>,
    /// The hardware-only tier, before any network override.
    pub hardware_tier: CapabilityTier,
}

impl CapabilityProfile {
    /// Whether the network override pulled the tier down.
    pub fn network_limited(&self) -> bool {
        self.tier < self.hardware_tier
    }
}

/// Reads the environment and classifies it.
#[derive(Clone)]
pub struct CapabilityAssessor {
    source: Arc<dyn EnvironmentSignalSource>,
}

impl CapabilityAssessor {
    pub fn new(source: Arc<dyn EnvironmentSignalSource>) -> Self {
        Self { source }
    }

    /// Snapshot the environment and classify it. Never fails.
    #[instrument(skip(self), fields(source = self.source.source_name()))]
    pub fn assess(&self) -> CapabilityProfile {
        let profile = classify(&self.source.snapshot());
        debug!(tier = %profile.tier, mobile = profile.is_mobile, "capability assessed");
        profile
    }

    pub fn source(&self) -> &Arc<dyn EnvironmentSignalSource> {
        &self.source
    }
}

/// Any one of user agent, narrow viewport, or touch input marks a device mobile.
pub fn is_mobile(signals: &EnvironmentSignals) -> bool {
    let agent = signals
        .user_agent
        .as_deref()
        .is_some_and(|ua| MOBILE_AGENT.is_match(ua));
    let narrow = signals
        .viewport_width
        .is_some_and(|w| w <= MOBILE_VIEWPORT_MAX);
    let touch = signals.touch_points.is_some_and(|n| n > 0);
    agent || narrow || touch
}

/// Pure classification of a signal snapshot.
pub fn classify(signals: &EnvironmentSignals) -> CapabilityProfile {
    let memory_gb = signals
        .device_memory_gb
        .filter(|m| *m > 0.0)
        .unwrap_or(DEFAULT_MEMORY_GB);
    let cores = signals
        .logical_cores
        .filter(|c| *c > 0)
        .unwrap_or(DEFAULT_CORES);
    let mobile = is_mobile(signals);

    let hardware_tier = if mobile {
        if memory_gb <= 2.0 && cores <= 4 {
            CapabilityTier::Low
        } else if memory_gb <= 4.0 && cores <= 6 {
            CapabilityTier::Medium
        } else {
            CapabilityTier::High
        }
    } else if memory_gb <= 4.0 {
        CapabilityTier::Medium
    } else {
        CapabilityTier::High
    };

    // Network override goes last so it beats any hardware tier.
    let tier = match signals.network {
        Some(net) if net.is_degraded() => CapabilityTier::Low,
        _ => hardware_tier,
    };

    CapabilityProfile {
        tier,
        memory_gb,
        cores,
        is_mobile: mobile,
        network: signals.network,
        battery: signals.battery,
        hardware_tier,
    }
}
