// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ingestion — turn files or byte buffers into `ImageItem`s.
//
// Only the header is parsed here; full decoding waits for enhancement or
// PDF assembly.

use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, Utc};
use folio_core::error::{FolioError, Result};
use folio_core::types::{ImageFormat, ImageItem};
use image::ImageReader;
use tracing::{debug, instrument};

/// Default per-file ceiling: 100 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Map a sniffed encoding onto the accepted set.
fn accepted_format(format: image::ImageFormat) -> Option<ImageFormat> {
    match format {
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        image::ImageFormat::Png => Some(ImageFormat::Png),
        image::ImageFormat::Gif => Some(ImageFormat::Gif),
        image::ImageFormat::WebP => Some(ImageFormat::Webp),
        _ => None,
    }
}

fn check_size(name: &str, size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(FolioError::FileTooLarge {
            name: name.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Build an `ImageItem` from an in-memory file.
///
/// The encoding is sniffed from the bytes, not the name. Anything other than
/// JPEG, PNG, GIF, or WEBP is `UnsupportedFormat`; files above `max_bytes`
/// are `FileTooLarge`.
#[instrument(skip(bytes), fields(name = %name, len = bytes.len()))]
pub fn ingest_bytes(
    name: &str,
    bytes: Vec<u8>,
    modified_at: Option<DateTime<Utc>>,
    max_bytes: u64,
) -> Result<ImageItem> {
    check_size(name, bytes.len() as u64, max_bytes)?;

    let sniffed = image::guess_format(&bytes)
        .map_err(|_| FolioError::UnsupportedFormat(name.to_string()))?;
    let format = accepted_format(sniffed)
        .ok_or_else(|| FolioError::UnsupportedFormat(format!("{name} ({sniffed:?})")))?;

    let reader = ImageReader::with_format(Cursor::new(&bytes), sniffed);
    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| FolioError::Decode(format!("{name}: {err}")))?;

    debug!(?format, width, height, "image ingested");
    Ok(ImageItem::new(
        name,
        format,
        width,
        height,
        bytes,
        modified_at,
    ))
}

/// Read a file from disk and ingest it.
///
/// The size limit is checked against the file metadata before reading.
pub fn ingest_path(path: impl AsRef<Path>, max_bytes: u64) -> Result<ImageItem> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let metadata = std::fs::metadata(path)?;
    check_size(&name, metadata.len(), max_bytes)?;
    let modified_at = metadata.modified().ok().map(DateTime::<Utc>::from);

    let bytes = std::fs::read(path)?;
    ingest_bytes(&name, bytes, modified_at, max_bytes)
}
