// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FolioError, Result};
use crate::types::{EnhancementLevel, Orientation, PaperSize};

/// Hard limits that abort a running batch at the next chunk boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalLimits {
    /// Abort when the memory usage ratio rises above this.
    pub max_memory_ratio: f32,
    /// Abort when the frame rate drops below this.
    pub min_frame_rate: f32,
    /// Abort when more than this many images have failed.
    pub max_errors: usize,
}

impl Default for CriticalLimits {
    fn default() -> Self {
        Self {
            max_memory_ratio: 0.9,
            min_frame_rate: 10.0,
            max_errors: 5,
        }
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Paper size for generated documents.
    pub paper_size: PaperSize,
    pub orientation: Orientation,
    /// Blank margin around every image, in millimetres.
    pub margin_mm: f32,
    /// Title embedded in the PDF metadata.
    pub document_title: String,
    /// Level used when the caller does not pick one.
    pub default_level: EnhancementLevel,
    /// JPEG quality (0-1) for the full enhancement path.
    pub output_quality: f32,
    /// JPEG quality (0-1) for previews, before environment adjustment.
    pub preview_quality: f32,
    /// Longest preview side in pixels.
    pub preview_max_side: u32,
    /// Tile edge length for the block-wise filter.
    pub tile_size: u32,
    /// Images with at least this many pixels are filtered tile by tile.
    pub tiling_threshold: u64,
    /// Per-file size ceiling enforced at ingestion.
    pub max_file_bytes: u64,
    /// How often the environment monitor polls, in milliseconds.
    pub monitor_interval_ms: u64,
    pub critical: CriticalLimits,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            margin_mm: 10.0,
            document_title: "Folio Document".into(),
            default_level: EnhancementLevel::Medium,
            output_quality: 0.92,
            preview_quality: 0.75,
            preview_max_side: 300,
            tile_size: 512,
            tiling_threshold: 1_048_576,
            max_file_bytes: 100 * 1024 * 1024,
            monitor_interval_ms: 2_000,
            critical: CriticalLimits::default(),
        }
    }
}

impl FolioConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|err| {
            FolioError::Config(format!("{}: {}", path.display(), err))
        })?;
        config.validate()?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Reject values that would break the filters or the page layout.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.output_quality) || self.output_quality == 0.0 {
            return Err(FolioError::Config(format!(
                "output_quality must be in (0, 1], got {}",
                self.output_quality
            )));
        }
        if !(0.0..=1.0).contains(&self.preview_quality) || self.preview_quality == 0.0 {
            return Err(FolioError::Config(format!(
                "preview_quality must be in (0, 1], got {}",
                self.preview_quality
            )));
        }
        if self.tile_size < 3 {
            return Err(FolioError::Config(format!(
                "tile_size must be at least 3, got {}",
                self.tile_size
            )));
        }
        if self.preview_max_side == 0 {
            return Err(FolioError::Config("preview_max_side must be positive".into()));
        }
        let (w, h) = self.paper_size.dimensions_mm();
        if self.margin_mm < 0.0 || self.margin_mm * 2.0 >= w.min(h) as f32 {
            return Err(FolioError::Config(format!(
                "margin_mm {} does not fit on the page",
                self.margin_mm
            )));
        }
        Ok(())
    }
}
