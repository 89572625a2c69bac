// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement engine — decode, cap to the pixel budget, sharpen, re-encode.
//
// The engine is stateless apart from its settings and is shared by reference
// between concurrent per-image tasks.

use folio_core::config::FolioConfig;
use folio_core::error::Result;
use folio_core::types::{CapabilityTier, EnhancementLevel, ImageItem};
use folio_device::{CapabilityProfile, ResourceBudget};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::enhance::kernel::{self, Kernel3};
use crate::image::processor::ImageProcessor;

/// Strength above which a contrast pass follows the sharpen.
pub const CONTRAST_THRESHOLD: f32 = 0.6;

/// Which algorithm family to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementMode {
    /// 3x3 sharpen, tiled for large images, optional contrast pass.
    Full,
    /// Single 5-tap pass at the reduced strength table.
    Lightweight,
}

impl EnhancementMode {
    /// Mobile devices and low-tier hosts get the lightweight path.
    pub fn for_profile(profile: &CapabilityProfile) -> Self {
        if profile.is_mobile || profile.tier == CapabilityTier::Low {
            Self::Lightweight
        } else {
            Self::Full
        }
    }
}

/// How the full-mode sharpen walks the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStrategy {
    FullFrame,
    Tiled { tile_size: u32 },
}

/// Result of `EnhancementEngine::enhance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhanceOutcome {
    /// Level 0: the caller keeps its original bytes.
    Unchanged,
    /// Re-encoded, enhanced bytes.
    Enhanced(Vec<u8>),
}

/// Tunables pulled from `FolioConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceSettings {
    pub tile_size: u32,
    /// Images with at least this many pixels are processed tile by tile.
    pub tiling_threshold: u64,
    pub output_quality: f32,
    pub preview_quality: f32,
    pub preview_max_side: u32,
}

impl Default for EnhanceSettings {
    fn default() -> Self {
        Self::from(&FolioConfig::default())
    }
}

impl From<&FolioConfig> for EnhanceSettings {
    fn from(config: &FolioConfig) -> Self {
        Self {
            tile_size: config.tile_size,
            tiling_threshold: config.tiling_threshold,
            output_quality: config.output_quality,
            preview_quality: config.preview_quality,
            preview_max_side: config.preview_max_side,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnhancementEngine {
    settings: EnhanceSettings,
}

impl EnhancementEngine {
    pub fn new(settings: EnhanceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EnhanceSettings {
        &self.settings
    }

    /// Pick full-frame or tiled for an image of `pixels` pixels.
    pub fn strategy_for(&self, pixels: u64) -> FilterStrategy {
        if pixels < self.settings.tiling_threshold {
            FilterStrategy::FullFrame
        } else {
            FilterStrategy::Tiled {
                tile_size: self.settings.tile_size,
            }
        }
    }

    /// Enhance one encoded image.
    ///
    /// Decodes, downscales to `budget.max_pixel_count`, filters, and
    /// re-encodes (PNG when the source has alpha, JPEG otherwise). Level 0
    /// returns `Unchanged` without touching the bytes.
    #[instrument(skip(self, data, budget), fields(data_len = data.len(), level = ?level, mode = ?mode))]
    pub fn enhance(
        &self,
        data: &[u8],
        level: EnhancementLevel,
        mode: EnhancementMode,
        budget: &ResourceBudget,
    ) -> Result<EnhanceOutcome> {
        if level.is_off() {
            return Ok(EnhanceOutcome::Unchanged);
        }

        let processor = ImageProcessor::from_bytes(data)?;
        let keep_alpha = processor.has_alpha();
        let processor = processor.downscale_to_pixel_budget(budget.max_pixel_count);
        let (width, height) = (processor.width(), processor.height());

        let filtered = self.enhance_pixels(processor.into_rgba8(), level, mode)?;

        let quality = match mode {
            EnhancementMode::Full => self.settings.output_quality,
            EnhancementMode::Lightweight => budget.adjusted_quality(self.settings.output_quality),
        };
        let bytes = ImageProcessor::from_rgba(filtered).encode(keep_alpha, quality)?;
        debug!(width, height, out_len = bytes.len(), quality, "image enhanced");
        Ok(EnhanceOutcome::Enhanced(bytes))
    }

    /// Enhance an item's payload in place.
    ///
    /// On error the item is left exactly as it was. Returns whether the
    /// payload was replaced.
    pub fn enhance_item(
        &self,
        item: &mut ImageItem,
        level: EnhancementLevel,
        mode: EnhancementMode,
        budget: &ResourceBudget,
    ) -> Result<bool> {
        match self.enhance(item.payload(), level, mode, budget)? {
            EnhanceOutcome::Unchanged => Ok(false),
            EnhanceOutcome::Enhanced(bytes) => {
                item.replace_payload(bytes, level);
                Ok(true)
            }
        }
    }

    /// Run the filter chain on decoded pixels.
    pub fn enhance_pixels(
        &self,
        pixels: RgbaImage,
        level: EnhancementLevel,
        mode: EnhancementMode,
    ) -> Result<RgbaImage> {
        if level.is_off() {
            return Ok(pixels);
        }
        match mode {
            EnhancementMode::Lightweight => {
                kernel::convolve_plus(&pixels, level.lightweight_strength())
            }
            EnhancementMode::Full => {
                let strength = level.strength();
                let sharpen = Kernel3::sharpen(strength);
                let pixel_count = pixels.width() as u64 * pixels.height() as u64;
                let mut out = match self.strategy_for(pixel_count) {
                    FilterStrategy::FullFrame => kernel::convolve_full(&pixels, &sharpen)?,
                    FilterStrategy::Tiled { tile_size } => {
                        debug!(pixel_count, tile_size, "using tiled convolution");
                        kernel::convolve_tiled(&pixels, &sharpen, tile_size)?
                    }
                };
                drop(pixels);
                if strength > CONTRAST_THRESHOLD {
                    let factor = (strength - CONTRAST_THRESHOLD) * 0.5;
                    kernel::apply_contrast_tiled(&mut out, factor, self.settings.tile_size);
                }
                Ok(out)
            }
        }
    }

    /// Disposable preview: shrunk to the preview size, gently unsharpened,
    /// JPEG-encoded at the budget-adjusted preview quality.
    ///
    /// Never touches any stored item.
    #[instrument(skip(self, data, budget), fields(data_len = data.len(), level = ?level))]
    pub fn preview(
        &self,
        data: &[u8],
        level: EnhancementLevel,
        budget: &ResourceBudget,
    ) -> Result<Vec<u8>> {
        let processor = ImageProcessor::from_bytes(data)?
            .fit_longest_side(self.settings.preview_max_side);
        let pixels = processor.into_rgba8();
        let pixels = if level.is_off() {
            pixels
        } else {
            kernel::convolve_full(&pixels, &Kernel3::unsharp(0.7 * level.strength()))?
        };
        let quality = budget.adjusted_quality(self.settings.preview_quality);
        ImageProcessor::from_rgba(pixels).encode(false, quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::error::FolioError;
    use folio_core::types::ImageFormat as FolioFormat;
    use image::{GenericImageView, ImageFormat, Rgba};

    fn budget(max_pixel_count: u64) -> ResourceBudget {
        ResourceBudget {
            max_pixel_count,
            max_batch_size: 1,
            inter_batch_delay_ms: 0,
            recommended_level: EnhancementLevel::Medium,
            quality_reduction: 0.1,
            notices: Vec::new(),
        }
    }

    fn pattern(width: u32, height: u32, alpha: bool) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = ((x * 37 + y * 91) % 256) as u8;
            let a = if alpha { ((x * 13 + y * 7) % 256) as u8 } else { 255 };
            Rgba([v, v.wrapping_mul(3), 255 - v, a])
        })
    }

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        ImageProcessor::from_rgba(img.clone())
            .to_png_bytes()
            .expect("encode png")
    }

    fn jpeg_bytes(img: &RgbaImage) -> Vec<u8> {
        ImageProcessor::from_rgba(img.clone())
            .to_jpeg_bytes(90)
            .expect("encode jpeg")
    }

    #[test]
    fn level_zero_is_a_no_op() {
        let engine = EnhancementEngine::default();
        let outcome = engine
            .enhance(b"not even an image", EnhancementLevel::Off, EnhancementMode::Full, &budget(1_000_000))
            .expect("level 0 never decodes");
        assert_eq!(outcome, EnhanceOutcome::Unchanged);

        let bytes = jpeg_bytes(&pattern(32, 32, false));
        let mut item = ImageItem::new("a.jpg", FolioFormat::Jpeg, 32, 32, bytes.clone(), None);
        let replaced = engine
            .enhance_item(&mut item, EnhancementLevel::Off, EnhancementMode::Full, &budget(1_000_000))
            .expect("enhance");
        assert!(!replaced);
        assert_eq!(item.payload(), bytes.as_slice());
        assert!(!item.is_enhanced());
    }

    #[test]
    fn opaque_input_comes_back_as_jpeg() {
        let engine = EnhancementEngine::default();
        let bytes = jpeg_bytes(&pattern(64, 48, false));
        let EnhanceOutcome::Enhanced(out) = engine
            .enhance(&bytes, EnhancementLevel::Medium, EnhancementMode::Full, &budget(1_000_000))
            .expect("enhance")
        else {
            panic!("expected enhanced output");
        };
        assert_eq!(image::guess_format(&out).expect("guess"), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).expect("decode");
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn alpha_survives_enhancement() {
        let engine = EnhancementEngine::default();
        let src = pattern(40, 30, true);
        for mode in [EnhancementMode::Full, EnhancementMode::Lightweight] {
            let EnhanceOutcome::Enhanced(out) = engine
                .enhance(&png_bytes(&src), EnhancementLevel::Strong, mode, &budget(1_000_000))
                .expect("enhance")
            else {
                panic!("expected enhanced output");
            };
            assert_eq!(image::guess_format(&out).expect("guess"), ImageFormat::Png);
            let decoded = image::load_from_memory(&out).expect("decode").into_rgba8();
            for (a, b) in decoded.pixels().zip(src.pixels()) {
                assert_eq!(a[3], b[3]);
            }
        }
    }

    #[test]
    fn oversized_images_are_downscaled_but_item_keeps_dimensions() {
        let engine = EnhancementEngine::default();
        let bytes = png_bytes(&pattern(200, 100, false));
        let mut item = ImageItem::new("big.png", FolioFormat::Png, 200, 100, bytes, None);

        let replaced = engine
            .enhance_item(&mut item, EnhancementLevel::Light, EnhancementMode::Full, &budget(5_000))
            .expect("enhance");
        assert!(replaced);
        assert!(item.is_enhanced());
        assert_eq!(item.enhancement_level(), EnhancementLevel::Light);
        assert_eq!(item.dimensions(), (200, 100));

        let decoded = image::load_from_memory(item.payload()).expect("decode");
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn tiling_starts_at_the_threshold() {
        let engine = EnhancementEngine::default();
        let threshold = engine.settings().tiling_threshold;
        let tile_size = engine.settings().tile_size;
        assert_eq!(threshold, 1_048_576);

        assert_eq!(engine.strategy_for(threshold - 1), FilterStrategy::FullFrame);
        assert_eq!(engine.strategy_for(threshold), FilterStrategy::Tiled { tile_size });
        assert_eq!(engine.strategy_for(threshold + 1), FilterStrategy::Tiled { tile_size });
    }

    #[test]
    fn tiled_strategy_matches_full_frame() {
        let src = pattern(70, 45, true);
        let full = EnhancementEngine::new(EnhanceSettings {
            tiling_threshold: u64::MAX,
            ..Default::default()
        });
        let tiled = EnhancementEngine::new(EnhanceSettings {
            tiling_threshold: 0,
            tile_size: 16,
            ..Default::default()
        });
        assert_eq!(full.strategy_for(70 * 45), FilterStrategy::FullFrame);
        assert_eq!(tiled.strategy_for(70 * 45), FilterStrategy::Tiled { tile_size: 16 });

        // Tile larger than the image as well as a small tile.
        let big_tile = EnhancementEngine::new(EnhanceSettings {
            tiling_threshold: 0,
            tile_size: 512,
            ..Default::default()
        });

        for level in [EnhancementLevel::Light, EnhancementLevel::Strong] {
            let a = full
                .enhance_pixels(src.clone(), level, EnhancementMode::Full)
                .expect("full");
            let b = tiled
                .enhance_pixels(src.clone(), level, EnhancementMode::Full)
                .expect("tiled");
            let c = big_tile
                .enhance_pixels(src.clone(), level, EnhancementMode::Full)
                .expect("big tile");
            for ((pa, pb), pc) in a.as_raw().iter().zip(b.as_raw()).zip(c.as_raw()) {
                assert!(pa.abs_diff(*pb) <= 1);
                assert!(pa.abs_diff(*pc) <= 1);
            }
        }
    }

    #[test]
    fn enhancement_is_not_idempotent() {
        let engine = EnhancementEngine::default();
        let src = pattern(32, 32, false);
        let once = engine
            .enhance_pixels(src, EnhancementLevel::Light, EnhancementMode::Full)
            .expect("once");
        let twice = engine
            .enhance_pixels(once.clone(), EnhancementLevel::Light, EnhancementMode::Full)
            .expect("twice");
        assert_ne!(once, twice);
    }

    #[test]
    fn decode_failure_leaves_item_untouched() {
        let engine = EnhancementEngine::default();
        let mut item = ImageItem::new("bad.jpg", FolioFormat::Jpeg, 10, 10, b"broken".to_vec(), None);
        let err = engine
            .enhance_item(&mut item, EnhancementLevel::Medium, EnhancementMode::Full, &budget(1_000_000))
            .expect_err("garbage must not decode");
        assert!(matches!(err, FolioError::Decode(_)));
        assert_eq!(item.payload(), b"broken");
        assert!(!item.is_enhanced());
    }

    #[test]
    fn preview_is_small_and_disposable() {
        let engine = EnhancementEngine::default();
        let bytes = jpeg_bytes(&pattern(900, 600, false));
        let preview = engine
            .preview(&bytes, EnhancementLevel::Medium, &budget(1_000_000))
            .expect("preview");
        let decoded = image::load_from_memory(&preview).expect("decode");
        assert_eq!(decoded.dimensions(), (300, 200));
    }

    #[test]
    fn mode_follows_profile() {
        let mut profile = CapabilityProfile {
            tier: CapabilityTier::High,
            memory_gb: 16.0,
            cores: 8,
            is_mobile: false,
            network: None,
            battery: None,
            hardware_tier: CapabilityTier::High,
        };
        assert_eq!(EnhancementMode::for_profile(&profile), EnhancementMode::Full);
        profile.is_mobile = true;
        assert_eq!(EnhancementMode::for_profile(&profile), EnhancementMode::Lightweight);
        profile.is_mobile = false;
        profile.tier = CapabilityTier::Low;
        assert_eq!(EnhancementMode::for_profile(&profile), EnhancementMode::Lightweight);
    }
}
