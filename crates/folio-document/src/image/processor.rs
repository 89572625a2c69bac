// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, downscale, and re-encode a single in-memory image
// using the `image` crate.

use image::{DynamicImage, ImageFormat, RgbaImage};
use folio_core::error::FolioError;
use tracing::{debug, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations consume `self` and return a new `ImageProcessor` wrapping
/// the transformed image, enabling method chaining.
///
/// ```ignore
/// let jpeg = ImageProcessor::from_bytes(&bytes)?
///     .downscale_to_pixel_budget(1_048_576)
///     .to_jpeg_bytes(92)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, GIF, WEBP).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, FolioError> {
        let img = image::load_from_memory(data)
            .map_err(|err| FolioError::Decode(err.to_string()))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an RGBA pixel buffer.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Whether the decoded image carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    /// Consume the processor and return an RGBA buffer.
    pub fn into_rgba8(self) -> RgbaImage {
        self.image.into_rgba8()
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Shrink uniformly so the pixel count is at most `max_pixels`.
    ///
    /// The scale factor is `sqrt(max_pixels / pixel_count)`; images already
    /// within budget are returned untouched.
    pub fn downscale_to_pixel_budget(self, max_pixels: u64) -> Self {
        let pixels = self.pixel_count();
        if max_pixels == 0 || pixels <= max_pixels {
            return self;
        }
        let (width, height) = budget_dimensions(self.width(), self.height(), max_pixels);
        debug!(pixels, max_pixels, width, height, "Downscaling to pixel budget");
        let resized =
            self.image
                .resize_exact(width, height, image::imageops::FilterType::Triangle);
        Self { image: resized }
    }

    /// Shrink so the longest side is at most `max_side`. Never upscales.
    pub fn fit_longest_side(self, max_side: u32) -> Self {
        if self.width().max(self.height()) <= max_side {
            return self;
        }
        let resized = self
            .image
            .thumbnail(max_side, max_side);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, FolioError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, FolioError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder).map_err(|err| {
            FolioError::Enhancement(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }

    /// Encode for storage in the working set.
    ///
    /// Images with transparency go out as PNG so the alpha channel survives;
    /// everything else is JPEG at `quality` (0-1).
    pub fn encode(&self, keep_alpha: bool, quality: f32) -> Result<Vec<u8>, FolioError> {
        if keep_alpha {
            self.to_png_bytes()
        } else {
            self.to_jpeg_bytes(quality_percent(quality))
        }
    }
}

/// Largest dimensions with the same aspect ratio and at most `max_pixels` pixels.
pub fn budget_dimensions(width: u32, height: u32, max_pixels: u64) -> (u32, u32) {
    let pixels = width as f64 * height as f64;
    if pixels <= max_pixels as f64 {
        return (width, height);
    }
    let scale = (max_pixels as f64 / pixels).sqrt();
    let w = ((width as f64 * scale).floor() as u32).max(1);
    let h = ((height as f64 * scale).floor() as u32).max(1);
    (w, h)
}

/// Map a 0-1 quality to the encoder's 1-100 scale.
pub fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, FolioError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        FolioError::Enhancement(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}
