// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — one page per image using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use folio_core::config::FolioConfig;
use folio_core::error::{FolioError, Result};
use folio_core::types::ImageItem;
use image::{Rgb, RgbImage};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::layout::{PageGeometry, Placement, place};

/// At 72 dpi one image pixel is one point before scaling.
const PLACEMENT_DPI: f32 = 72.0;

/// Assembles a list of images into a PDF, one image per page.
pub struct PdfWriter {
    geometry: PageGeometry,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            title: "Folio Document".to_string(),
        }
    }

    pub fn from_config(config: &FolioConfig) -> Self {
        let mut writer = Self::new(PageGeometry::from(config));
        writer.set_title(config.document_title.clone());
        writer
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Placement of every item, computed from its ingested dimensions.
    pub fn layout_items(&self, items: &[ImageItem]) -> Vec<Placement> {
        items
            .iter()
            .map(|item| place(item.width(), item.height(), &self.geometry))
            .collect()
    }

    /// Build the document in memory.
    ///
    /// Each payload, enhanced or not, is stretched into the box computed from
    /// the item's original dimensions. Transparent areas are flattened onto
    /// white.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub fn create_from_items(&self, items: &[ImageItem]) -> Result<Vec<u8>> {
        if items.is_empty() {
            return Err(FolioError::Pdf("no images to write".into()));
        }

        let (page_w, page_h) = self.geometry.page_size_mm();
        info!(
            paper = ?self.geometry.paper,
            orientation = ?self.geometry.orientation,
            title = %self.title,
            "Creating image PDF"
        );

        let mut doc = PdfDocument::new(&self.title);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(items.len());

        for (item, placement) in items.iter().zip(self.layout_items(items)) {
            let decoded = ::image::load_from_memory(item.payload()).map_err(|err| {
                FolioError::Decode(format!("{}: failed to decode for PDF: {}", item.name(), err))
            })?;
            let rgb = flatten_on_white(&decoded.into_rgba8());
            let (px_w, px_h) = rgb.dimensions();

            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: px_w as usize,
                height: px_h as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let box_w_pt = Mm(placement.width_mm).into_pt().0;
            let box_h_pt = Mm(placement.height_mm).into_pt().0;
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(Mm(placement.x_mm).into_pt().0)),
                    translate_y: Some(Pt(Mm(placement.y_mm).into_pt().0)),
                    scale_x: Some(box_w_pt / px_w.max(1) as f32),
                    scale_y: Some(box_h_pt / px_h.max(1) as f32),
                    dpi: Some(PLACEMENT_DPI),
                    rotate: None,
                },
            }];
            debug!(
                name = item.name(),
                px_w,
                px_h,
                box_w_pt,
                box_h_pt,
                "Image placed on page"
            );
            pages.push(PdfPage::new(Mm(page_w), Mm(page_h), ops));
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings");
        }
        Ok(output)
    }

    /// Build the document and write it to `path`.
    pub fn write_items_to_file(&self, items: &[ImageItem], path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.create_from_items(items)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote PDF to {}", path.as_ref().display());
        Ok(())
    }
}

/// Composite RGBA over a white page.
fn flatten_on_white(rgba: &image::RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
