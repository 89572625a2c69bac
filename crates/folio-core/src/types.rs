// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Folio.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an image in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepted input encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Infer the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// User-selected sharpening strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnhancementLevel {
    Off,
    Light,
    Medium,
    Strong,
}

/// Static description of one enhancement level.
#[derive(Debug, Clone, Copy)]
pub struct LevelSpec {
    pub level: EnhancementLevel,
    /// Kernel coefficient for the full algorithm.
    pub strength: f32,
    /// Kernel coefficient for the constrained-device path.
    pub lightweight_strength: f32,
    pub description: &'static str,
}

/// The level table, indexed by `EnhancementLevel::index()`.
pub const ENHANCEMENT_LEVELS: [LevelSpec; 4] = [
    LevelSpec {
        level: EnhancementLevel::Off,
        strength: 0.0,
        lightweight_strength: 0.0,
        description: "Original image, no processing",
    },
    LevelSpec {
        level: EnhancementLevel::Light,
        strength: 0.3,
        lightweight_strength: 0.2,
        description: "Subtle sharpening for photos that are almost crisp",
    },
    LevelSpec {
        level: EnhancementLevel::Medium,
        strength: 0.6,
        lightweight_strength: 0.4,
        description: "Balanced sharpening for scans and phone pictures",
    },
    LevelSpec {
        level: EnhancementLevel::Strong,
        strength: 1.0,
        lightweight_strength: 0.6,
        description: "Aggressive sharpening plus a contrast boost for faded text",
    },
];

impl EnhancementLevel {
    /// Numeric level 0-3.
    pub fn index(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Light => 1,
            Self::Medium => 2,
            Self::Strong => 3,
        }
    }

    /// Parse a numeric level. Returns `None` outside 0-3.
    pub fn from_index(index: u8) -> Option<Self> {
        ENHANCEMENT_LEVELS.get(index as usize).map(|spec| spec.level)
    }

    pub fn spec(self) -> &'static LevelSpec {
        &ENHANCEMENT_LEVELS[self.index() as usize]
    }

    pub fn strength(self) -> f32 {
        self.spec().strength
    }

    pub fn lightweight_strength(self) -> f32 {
        self.spec().lightweight_strength
    }

    pub fn description(self) -> &'static str {
        self.spec().description
    }

    pub fn is_off(self) -> bool {
        self == Self::Off
    }
}

impl Default for EnhancementLevel {
    fn default() -> Self {
        Self::Medium
    }
}

/// Ordinal device-capability classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Network effective-type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkClass {
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
}

impl NetworkClass {
    /// Parse an effective-type keyword ("slow-2g", "2g", "3g", "4g").
    pub fn from_effective_type(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => Some(Self::Slow2g),
            "2g" => Some(Self::TwoG),
            "3g" => Some(Self::ThreeG),
            "4g" => Some(Self::FourG),
            _ => None,
        }
    }

    /// 2G or slower.
    pub fn is_degraded(self) -> bool {
        matches!(self, Self::Slow2g | Self::TwoG)
    }
}

/// Battery snapshot. `level` is in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    pub level: f32,
    pub charging: bool,
}

/// An image in the working set.
///
/// Dimensions, original byte size, and format are fixed at ingestion. The
/// payload may be replaced by enhancement, but page layout keeps using the
/// ingested dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageItem {
    id: ImageId,
    name: String,
    byte_size: u64,
    width: u32,
    height: u32,
    format: ImageFormat,
    modified_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    payload: Vec<u8>,
    enhanced: bool,
    enhancement_level: EnhancementLevel,
}

impl ImageItem {
    pub fn new(
        name: impl Into<String>,
        format: ImageFormat,
        width: u32,
        height: u32,
        payload: Vec<u8>,
        modified_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: ImageId::new(),
            name: name.into(),
            byte_size: payload.len() as u64,
            width,
            height,
            format,
            modified_at,
            payload,
            enhanced: false,
            enhancement_level: EnhancementLevel::Off,
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the file as ingested.
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_at
    }

    /// Current encoded bytes (original or enhanced).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn is_enhanced(&self) -> bool {
        self.enhanced
    }

    pub fn enhancement_level(&self) -> EnhancementLevel {
        self.enhancement_level
    }

    /// Swap in an enhanced payload. Dimensions are left untouched.
    pub fn replace_payload(&mut self, payload: Vec<u8>, level: EnhancementLevel) {
        self.payload = payload;
        self.enhanced = !level.is_off();
        self.enhancement_level = level;
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height), portrait.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Parse a paper name as typed on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(Self::A4),
            "a3" => Some(Self::A3),
            "a5" => Some(Self::A5),
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            "tabloid" => Some(Self::Tabloid),
            _ => None,
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_table_matches_indices() {
        for (idx, spec) in ENHANCEMENT_LEVELS.iter().enumerate() {
            assert_eq!(spec.level.index() as usize, idx);
            assert_eq!(EnhancementLevel::from_index(idx as u8), Some(spec.level));
        }
        assert_eq!(EnhancementLevel::from_index(4), None);
    }

    #[test]
    fn level_strengths() {
        assert_eq!(EnhancementLevel::Off.strength(), 0.0);
        assert_eq!(EnhancementLevel::Light.strength(), 0.3);
        assert_eq!(EnhancementLevel::Medium.strength(), 0.6);
        assert_eq!(EnhancementLevel::Strong.strength(), 1.0);
        assert_eq!(EnhancementLevel::Strong.lightweight_strength(), 0.6);
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(CapabilityTier::Low < CapabilityTier::Medium);
        assert!(CapabilityTier::Medium < CapabilityTier::High);
    }

    #[test]
    fn network_classes() {
        assert_eq!(NetworkClass::from_effective_type("slow-2g"), Some(NetworkClass::Slow2g));
        assert_eq!(NetworkClass::from_effective_type("4G"), Some(NetworkClass::FourG));
        assert_eq!(NetworkClass::from_effective_type("wifi"), None);
        assert!(NetworkClass::TwoG.is_degraded());
        assert!(!NetworkClass::ThreeG.is_degraded());
    }

    #[test]
    fn replacing_payload_keeps_dimensions() {
        let mut item = ImageItem::new("page.png", ImageFormat::Png, 640, 480, vec![1, 2, 3], None);
        item.replace_payload(vec![9; 10], EnhancementLevel::Light);

        assert_eq!(item.dimensions(), (640, 480));
        assert_eq!(item.byte_size(), 3);
        assert_eq!(item.payload().len(), 10);
        assert!(item.is_enhanced());
        assert_eq!(item.enhancement_level(), EnhancementLevel::Light);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("webp"), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::from_extension("tiff"), None);
    }
}
