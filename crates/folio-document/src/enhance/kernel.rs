// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Convolution kernels and the pixel loops that apply them.
//
// Boundary policy: only interior pixels are written; the one-pixel border and
// every alpha byte are copied straight from the source. The tiled variant
// reads a one-pixel halo around each tile so its interior output matches the
// full-frame pass exactly.

use folio_core::error::{FolioError, Result};
use image::RgbaImage;

const CHANNELS: usize = 4;

/// A 3x3 kernel, row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel3 {
    pub weights: [f32; 9],
}

impl Kernel3 {
    /// Laplacian sharpen: centre `1 + 4s`, orthogonal neighbours `-s`, corners 0.
    pub fn sharpen(strength: f32) -> Self {
        let s = strength;
        Self {
            weights: [0.0, -s, 0.0, -s, 1.0 + 4.0 * s, -s, 0.0, -s, 0.0],
        }
    }

    /// Gentle unsharp mask: centre `1 + s`, all eight neighbours `-s / 8`.
    pub fn unsharp(strength: f32) -> Self {
        let n = -strength / 8.0;
        Self {
            weights: [n, n, n, n, 1.0 + strength, n, n, n, n],
        }
    }

    /// Sum of all weights; 1.0 for every kernel here, so flat areas stay flat.
    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

#[inline]
fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn check_buffers(src: &[u8], dst: &[u8], width: usize, height: usize) -> Result<()> {
    let expected = width * height * CHANNELS;
    if src.len() != expected || dst.len() != expected {
        return Err(FolioError::Enhancement(format!(
            "buffer size mismatch: expected {expected} bytes for {width}x{height}, got src={} dst={}",
            src.len(),
            dst.len()
        )));
    }
    Ok(())
}

/// Full 9-tap pass over the interior of an RGBA buffer.
///
/// `dst` must already hold a copy of `src`; border pixels and alpha are left
/// as they are.
pub fn convolve_buffer(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    kernel: &Kernel3,
) -> Result<()> {
    check_buffers(src, dst, width, height)?;
    if width < 3 || height < 3 {
        return Ok(());
    }
    let stride = width * CHANNELS;
    let k = &kernel.weights;

    for y in 1..height - 1 {
        let above = (y - 1) * stride;
        let row = y * stride;
        let below = (y + 1) * stride;
        for x in 1..width - 1 {
            let left = (x - 1) * CHANNELS;
            let mid = x * CHANNELS;
            let right = (x + 1) * CHANNELS;
            for c in 0..3 {
                let acc = k[0] * src[above + left + c] as f32
                    + k[1] * src[above + mid + c] as f32
                    + k[2] * src[above + right + c] as f32
                    + k[3] * src[row + left + c] as f32
                    + k[4] * src[row + mid + c] as f32
                    + k[5] * src[row + right + c] as f32
                    + k[6] * src[below + left + c] as f32
                    + k[7] * src[below + mid + c] as f32
                    + k[8] * src[below + right + c] as f32;
                dst[row + mid + c] = to_u8(acc);
            }
        }
    }
    Ok(())
}

/// Five-tap (plus-shaped) sharpen for constrained devices.
///
/// Reads only the centre and its four orthogonal neighbours.
pub fn convolve_plus_buffer(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    strength: f32,
) -> Result<()> {
    check_buffers(src, dst, width, height)?;
    if width < 3 || height < 3 {
        return Ok(());
    }
    let stride = width * CHANNELS;
    let centre = 1.0 + 4.0 * strength;

    for y in 1..height - 1 {
        let row = y * stride;
        for x in 1..width - 1 {
            let i = row + x * CHANNELS;
            for c in 0..3 {
                let neighbours = src[i - stride + c] as f32
                    + src[i + stride + c] as f32
                    + src[i - CHANNELS + c] as f32
                    + src[i + CHANNELS + c] as f32;
                dst[i + c] = to_u8(centre * src[i + c] as f32 - strength * neighbours);
            }
        }
    }
    Ok(())
}

/// Single full-frame pass.
pub fn convolve_full(src: &RgbaImage, kernel: &Kernel3) -> Result<RgbaImage> {
    let (width, height) = src.dimensions();
    let mut out = src.clone();
    convolve_buffer(src.as_raw(), &mut out, width as usize, height as usize, kernel)?;
    Ok(out)
}

/// Plus-shaped single pass.
pub fn convolve_plus(src: &RgbaImage, strength: f32) -> Result<RgbaImage> {
    let (width, height) = src.dimensions();
    let mut out = src.clone();
    convolve_plus_buffer(src.as_raw(), &mut out, width as usize, height as usize, strength)?;
    Ok(out)
}

/// Block-wise pass with square tiles of `tile_size` and a one-pixel halo.
///
/// Working memory per tile is `(tile_size + 2)^2` pixels twice, whatever the
/// image size. Only each tile's core (non-halo) region is written back.
pub fn convolve_tiled(src: &RgbaImage, kernel: &Kernel3, tile_size: u32) -> Result<RgbaImage> {
    if tile_size == 0 {
        return Err(FolioError::Enhancement("tile size must be positive".into()));
    }
    let (width, height) = src.dimensions();
    let (w, h, tile) = (width as usize, height as usize, tile_size as usize);
    let stride = w * CHANNELS;
    let raw: &[u8] = src.as_raw();
    let mut out = src.clone();

    let mut tile_src: Vec<u8> = Vec::with_capacity((tile + 2) * (tile + 2) * CHANNELS);
    let mut tile_dst: Vec<u8> = Vec::with_capacity(tile_src.capacity());

    for core_y0 in (0..h).step_by(tile) {
        let core_y1 = (core_y0 + tile).min(h);
        let halo_y0 = core_y0.saturating_sub(1);
        let halo_y1 = (core_y1 + 1).min(h);

        for core_x0 in (0..w).step_by(tile) {
            let core_x1 = (core_x0 + tile).min(w);
            let halo_x0 = core_x0.saturating_sub(1);
            let halo_x1 = (core_x1 + 1).min(w);

            let tile_w = halo_x1 - halo_x0;
            let tile_h = halo_y1 - halo_y0;
            let tile_stride = tile_w * CHANNELS;

            tile_src.clear();
            for y in halo_y0..halo_y1 {
                let start = y * stride + halo_x0 * CHANNELS;
                tile_src.extend_from_slice(&raw[start..start + tile_stride]);
            }
            tile_dst.clear();
            tile_dst.extend_from_slice(&tile_src);

            convolve_buffer(&tile_src, &mut tile_dst, tile_w, tile_h, kernel)?;

            // Global border pixels sit on the tile's own border, so the
            // copied core region already holds the source values there.
            let core_len = (core_x1 - core_x0) * CHANNELS;
            let out_buf: &mut [u8] = &mut out;
            for y in core_y0..core_y1 {
                let local = (y - halo_y0) * tile_stride + (core_x0 - halo_x0) * CHANNELS;
                let global = y * stride + core_x0 * CHANNELS;
                out_buf[global..global + core_len]
                    .copy_from_slice(&tile_dst[local..local + core_len]);
            }
        }
    }
    Ok(out)
}

/// Contrast multiplier for a given factor: `(f+1)^2 / (f(f+1) + 1)`.
pub fn contrast_coefficient(factor: f32) -> f32 {
    (factor + 1.0).powi(2) / (factor * (factor + 1.0) + 1.0)
}

/// Lookup table for `((v/255 - 0.5) * c + 0.5) * 255`, clamped.
fn contrast_table(factor: f32) -> [u8; 256] {
    let c = contrast_coefficient(factor);
    let mut table = [0u8; 256];
    for (v, slot) in table.iter_mut().enumerate() {
        let normalised = v as f32 / 255.0;
        *slot = to_u8(((normalised - 0.5) * c + 0.5) * 255.0);
    }
    table
}

/// Global contrast stretch applied in place, one tile at a time.
///
/// Colour channels only; alpha is untouched.
pub fn apply_contrast_tiled(image: &mut RgbaImage, factor: f32, tile_size: u32) {
    let table = contrast_table(factor);
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let tile = tile_size.max(1) as usize;
    let stride = w * CHANNELS;
    let buf: &mut [u8] = image;

    for y0 in (0..h).step_by(tile) {
        let y1 = (y0 + tile).min(h);
        for x0 in (0..w).step_by(tile) {
            let x1 = (x0 + tile).min(w);
            for y in y0..y1 {
                let row = &mut buf[y * stride + x0 * CHANNELS..y * stride + x1 * CHANNELS];
                for px in row.chunks_exact_mut(CHANNELS) {
                    px[0] = table[px[0] as usize];
                    px[1] = table[px[1] as usize];
                    px[2] = table[px[2] as usize];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Deterministic pseudo-random test pattern with varying alpha.
    pub(crate) fn noise_image(width: u32, height: u32) -> RgbaImage {
        let mut state: u32 = 0x1234_5678;
        RgbaImage::from_fn(width, height, |_, _| {
            let mut next = || {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xff) as u8
            };
            Rgba([next(), next(), next(), next()])
        })
    }

    #[test]
    fn kernels_preserve_flat_regions() {
        for strength in [0.2, 0.3, 0.6, 1.0] {
            assert!((Kernel3::sharpen(strength).sum() - 1.0).abs() < 1e-6);
            assert!((Kernel3::unsharp(strength).sum() - 1.0).abs() < 1e-6);
        }
        let flat = RgbaImage::from_pixel(16, 16, Rgba([90, 120, 200, 255]));
        let out = convolve_full(&flat, &Kernel3::sharpen(1.0)).expect("convolve");
        assert_eq!(out, flat);
    }

    #[test]
    fn sharpen_kernel_layout() {
        let k = Kernel3::sharpen(0.3);
        assert_eq!(k.weights[0], 0.0);
        assert_eq!(k.weights[1], -0.3);
        assert!((k.weights[4] - 2.2).abs() < 1e-6);
    }

    #[test]
    fn border_and_alpha_are_untouched() {
        let src = noise_image(20, 12);
        let out = convolve_full(&src, &Kernel3::sharpen(1.0)).expect("convolve");
        for (x, y, px) in out.enumerate_pixels() {
            let orig = src.get_pixel(x, y);
            assert_eq!(px[3], orig[3], "alpha changed at ({x}, {y})");
            if x == 0 || y == 0 || x == 19 || y == 11 {
                assert_eq!(px, orig, "border changed at ({x}, {y})");
            }
        }
        assert_ne!(out, src, "interior should be sharpened");
    }

    #[test]
    fn tiled_matches_full_frame() {
        let src = noise_image(37, 29);
        let kernel = Kernel3::sharpen(0.6);
        let full = convolve_full(&src, &kernel).expect("full");
        for tile in [1, 2, 5, 8, 16, 64] {
            let tiled = convolve_tiled(&src, &kernel, tile).expect("tiled");
            assert_eq!(tiled, full, "tile size {tile} diverged");
        }
    }

    #[test]
    fn plus_kernel_equals_sharpen_kernel() {
        let src = noise_image(24, 18);
        let plus = convolve_plus(&src, 0.4).expect("plus");
        let full = convolve_full(&src, &Kernel3::sharpen(0.4)).expect("full");
        for (a, b) in plus.as_raw().iter().zip(full.as_raw()) {
            assert!(a.abs_diff(*b) <= 1);
        }
    }

    #[test]
    fn tiny_images_pass_through() {
        let src = noise_image(2, 5);
        let out = convolve_full(&src, &Kernel3::sharpen(1.0)).expect("convolve");
        assert_eq!(out, src);
    }

    #[test]
    fn mismatched_buffers_are_enhancement_errors() {
        let src = vec![0u8; 10];
        let mut dst = vec![0u8; 10];
        let err = convolve_buffer(&src, &mut dst, 4, 4, &Kernel3::sharpen(0.3))
            .expect_err("size mismatch");
        assert!(matches!(err, FolioError::Enhancement(_)));
    }

    #[test]
    fn contrast_stretches_around_midpoint() {
        let c = contrast_coefficient(0.2);
        assert!((c - 1.44 / 1.24).abs() < 1e-5);

        let mut img = RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => Rgba([40, 40, 40, 10]),
            1 => Rgba([128, 128, 128, 20]),
            _ => Rgba([220, 220, 220, 30]),
        });
        apply_contrast_tiled(&mut img, 0.2, 2);
        assert!(img.get_pixel(0, 0)[0] < 40);
        assert!(img.get_pixel(1, 0)[0].abs_diff(128) <= 1);
        assert!(img.get_pixel(2, 0)[0] > 220);
        assert_eq!(img.get_pixel(0, 0)[3], 10);
        assert_eq!(img.get_pixel(2, 0)[3], 30);
    }
}
