// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout — aspect-fit an image inside the page margins and centre it.

use folio_core::config::FolioConfig;
use folio_core::types::{Orientation, PaperSize};
use serde::{Deserialize, Serialize};

/// Paper, orientation, and margin for every page of a document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub paper: PaperSize,
    pub orientation: Orientation,
    pub margin_mm: f32,
}

impl PageGeometry {
    pub fn new(paper: PaperSize, orientation: Orientation, margin_mm: f32) -> Self {
        Self {
            paper,
            orientation,
            margin_mm,
        }
    }

    /// Page size in millimetres after applying the orientation.
    pub fn page_size_mm(&self) -> (f32, f32) {
        let (w, h) = self.paper.dimensions_mm();
        let (w, h) = (w as f32, h as f32);
        match self.orientation {
            Orientation::Portrait => (w.min(h), w.max(h)),
            Orientation::Landscape => (w.max(h), w.min(h)),
        }
    }

    /// Printable area inside the margins. Never negative.
    pub fn content_size_mm(&self) -> (f32, f32) {
        let (w, h) = self.page_size_mm();
        let margin = self.margin_mm.max(0.0);
        ((w - 2.0 * margin).max(0.0), (h - 2.0 * margin).max(0.0))
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::from(&FolioConfig::default())
    }
}

impl From<&FolioConfig> for PageGeometry {
    fn from(config: &FolioConfig) -> Self {
        Self::new(config.paper_size, config.orientation, config.margin_mm)
    }
}

/// Where an image lands on its page.
///
/// Coordinates are millimetres from the bottom-left corner of the page, the
/// PDF convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
    /// Millimetres per source pixel.
    pub scale: f32,
}

/// Fit a `width` x `height` image inside the margins, keeping its aspect
/// ratio, and centre it.
///
/// Pass the dimensions recorded at ingestion, not those of an enhanced
/// payload, so that a downscaled payload still fills the same box.
pub fn place(width: u32, height: u32, geometry: &PageGeometry) -> Placement {
    let (page_w, page_h) = geometry.page_size_mm();
    let (avail_w, avail_h) = geometry.content_size_mm();

    if width == 0 || height == 0 {
        return Placement {
            x_mm: page_w / 2.0,
            y_mm: page_h / 2.0,
            width_mm: 0.0,
            height_mm: 0.0,
            scale: 0.0,
        };
    }

    let scale = (avail_w / width as f32).min(avail_h / height as f32);
    let width_mm = width as f32 * scale;
    let height_mm = height as f32 * scale;

    Placement {
        x_mm: (page_w - width_mm) / 2.0,
        y_mm: (page_h - height_mm) / 2.0,
        width_mm,
        height_mm,
        scale,
    }
}
