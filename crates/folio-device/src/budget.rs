// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resource budgeting — turn a capability tier plus live battery/network
// readings into concrete limits for the enhancement pipeline.
//
// The tier picks the base row of the policy table; battery and network
// overrides are applied on top, in that order.

use std::time::Duration;

use folio_core::error::{FolioError, Result};
use folio_core::types::{CapabilityTier, EnhancementLevel, ImageItem};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::capability::CapabilityProfile;
use crate::signals::LiveSignals;

/// Pixel cap for low-tier devices (1 MP).
pub const LOW_MAX_PIXELS: u64 = 1_048_576;
/// Pixel cap for medium-tier devices (1920x1080).
pub const MEDIUM_MAX_PIXELS: u64 = 2_073_600;
/// Pixel cap for high-tier devices.
pub const HIGH_MAX_PIXELS: u64 = 4_915_200;

/// Shortest delay the charging bonus can bring us down to.
pub const MIN_DELAY_MS: u64 = 100;

const MIB: u64 = 1024 * 1024;

/// Something the user should be told about the current budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetNotice {
    /// Battery below 20%: one image at a time with long pauses.
    PowerSave,
    /// 2G or slower: images are shrunk and compressed harder.
    SlowNetwork,
}

impl BudgetNotice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::PowerSave => {
                "Battery is low, so images are processed one at a time to save power."
            }
            Self::SlowNetwork => {
                "Your connection is slow, so images are made smaller to keep things moving."
            }
        }
    }
}

/// Concrete processing limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceBudget {
    /// Largest pixel count processed in one go; bigger images are downscaled.
    pub max_pixel_count: u64,
    /// Images processed concurrently per chunk.
    pub max_batch_size: usize,
    /// Pause between chunks, in milliseconds.
    pub inter_batch_delay_ms: u64,
    pub recommended_level: EnhancementLevel,
    /// Subtracted from the encoder quality on constrained paths.
    pub quality_reduction: f32,
    pub notices: Vec<BudgetNotice>,
}

impl ResourceBudget {
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    /// Encoder quality after applying the reduction, kept within [0.5, 1.0].
    pub fn adjusted_quality(&self, base: f32) -> f32 {
        (base - self.quality_reduction).clamp(0.5, 1.0)
    }

    pub fn has_notice(&self, notice: BudgetNotice) -> bool {
        self.notices.contains(&notice)
    }
}

/// Derives budgets. Stateless; every call recomputes from scratch.
#[derive(Debug, Clone, Default)]
pub struct ResourceBudgeter;

impl ResourceBudgeter {
    pub fn new() -> Self {
        Self
    }

    /// Budget for the given profile and the latest live readings.
    #[instrument(skip(self, profile, live), fields(tier = %profile.tier))]
    pub fn budget_for(&self, profile: &CapabilityProfile, live: &LiveSignals) -> ResourceBudget {
        let mut budget = base_budget(profile.tier, profile.cores);

        if let Some(battery) = live.battery {
            let floor = if battery.level < 0.2 {
                budget.max_batch_size = 1;
                budget.notices.push(BudgetNotice::PowerSave);
                info!(level = battery.level, "{}", BudgetNotice::PowerSave.message());
                1_000
            } else if battery.level < 0.5 {
                500
            } else {
                MIN_DELAY_MS
            };
            budget.inter_batch_delay_ms = budget.inter_batch_delay_ms.max(floor);

            // Charging never takes the delay below the battery floor.
            budget.inter_batch_delay_ms = if battery.charging {
                budget
                    .inter_batch_delay_ms
                    .saturating_sub(100)
                    .max(floor)
            } else {
                budget.inter_batch_delay_ms + 100
            };
        }

        if live.network.is_some_and(|net| net.is_degraded()) {
            budget.max_pixel_count = budget.max_pixel_count.min(LOW_MAX_PIXELS);
            budget.quality_reduction = budget.quality_reduction.max(0.3);
            budget.notices.push(BudgetNotice::SlowNetwork);
            info!("{}", BudgetNotice::SlowNetwork.message());
        }

        debug!(
            max_pixels = budget.max_pixel_count,
            batch = budget.max_batch_size,
            delay_ms = budget.inter_batch_delay_ms,
            "budget computed"
        );
        budget
    }

    /// Memory a batch may use on a device of this tier.
    pub fn memory_ceiling_bytes(&self, tier: CapabilityTier) -> u64 {
        match tier {
            CapabilityTier::Low => 512 * MIB,
            CapabilityTier::Medium => 1024 * MIB,
            CapabilityTier::High => 2048 * MIB,
        }
    }

    /// Rough peak memory for enhancing `items` under `budget`.
    ///
    /// Every payload stays resident; on top of that one chunk of decoded
    /// RGBA buffers (source, output, and tile scratch) is live at a time.
    pub fn estimate_memory_demand(&self, items: &[ImageItem], budget: &ResourceBudget) -> u64 {
        let resident: u64 = items.iter().map(|item| item.payload().len() as u64).sum();
        let largest = items
            .iter()
            .map(|item| item.pixel_count().min(budget.max_pixel_count))
            .max()
            .unwrap_or(0);
        let concurrent = budget.max_batch_size.min(items.len()) as u64;
        resident + concurrent * largest * 4 * 3
    }

    /// Refuse a batch that would not fit before any work starts.
    pub fn check_batch(
        &self,
        items: &[ImageItem],
        profile: &CapabilityProfile,
        budget: &ResourceBudget,
    ) -> Result<()> {
        let demand = self.estimate_memory_demand(items, budget);
        let ceiling = self.memory_ceiling_bytes(profile.tier);
        if demand > ceiling {
            return Err(FolioError::BudgetExceeded {
                reason: format!(
                    "{} images need about {} MB but this device allows {} MB",
                    items.len(),
                    demand / MIB,
                    ceiling / MIB
                ),
            });
        }
        Ok(())
    }
}

fn base_budget(tier: CapabilityTier, cores: u32) -> ResourceBudget {
    let (max_pixel_count, max_batch_size, inter_batch_delay_ms, quality_reduction, recommended_level) =
        match tier {
            CapabilityTier::Low => (LOW_MAX_PIXELS, 1, 500, 0.2, EnhancementLevel::Light),
            CapabilityTier::Medium => (
                MEDIUM_MAX_PIXELS,
                if cores >= 4 { 2 } else { 1 },
                200,
                0.1,
                EnhancementLevel::Medium,
            ),
            CapabilityTier::High => (
                HIGH_MAX_PIXELS,
                if cores >= 8 { 3 } else { 2 },
                100,
                0.05,
                EnhancementLevel::Strong,
            ),
        };
    ResourceBudget {
        max_pixel_count,
        max_batch_size,
        inter_batch_delay_ms,
        recommended_level,
        quality_reduction,
        notices: Vec::new(),
    }
}
