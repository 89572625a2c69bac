// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document — Image handling and document assembly for Folio.
//
// Provides ingestion (format sniffing, size limits), the image processor
// (decode, budget downscaling, re-encode), the enhancement engine (full,
// tiled, lightweight, and preview sharpening), order inference from file
// names, page layout, and the PDF writer.

pub mod enhance;
pub mod image;
pub mod ingest;
pub mod layout;
pub mod order;
pub mod pdf;

// Re-export the primary types so callers can use `folio_document::PdfWriter` etc.
pub use crate::enhance::{EnhanceOutcome, EnhanceSettings, EnhancementEngine, EnhancementMode};
pub use crate::image::processor::ImageProcessor;
pub use crate::ingest::{DEFAULT_MAX_FILE_BYTES, ingest_bytes, ingest_path};
pub use crate::layout::{PageGeometry, Placement, place};
pub use crate::order::{OrderingAnalysis, OrderingMethod, infer, lexicographic_order};
pub use crate::pdf::writer::PdfWriter;
