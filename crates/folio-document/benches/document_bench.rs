// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the enhancement kernels: full-frame against tiled
// sharpening on the same synthetic image, plus the lightweight 5-tap pass.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use folio_document::enhance::kernel::{self, Kernel3};

/// 1280x960 gradient with a few hard edges, just over the tiling threshold.
fn synthetic(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let edge = if (x / 64 + y / 64) % 2 == 0 { 40 } else { 0 };
        let v = ((x + y) % 200) as u8 + edge;
        Rgba([v, v / 2, 255 - v, 255])
    })
}

fn bench_sharpen(c: &mut Criterion) {
    let img = synthetic(1280, 960);
    let sharpen = Kernel3::sharpen(0.6);
    let mut group = c.benchmark_group("sharpen 1280x960");

    group.bench_function("full_frame", |b| {
        b.iter(|| black_box(kernel::convolve_full(black_box(&img), &sharpen)))
    });
    for tile in [128u32, 512] {
        group.bench_with_input(BenchmarkId::new("tiled", tile), &tile, |b, &tile| {
            b.iter(|| black_box(kernel::convolve_tiled(black_box(&img), &sharpen, tile)))
        });
    }
    group.bench_function("lightweight", |b| {
        b.iter(|| black_box(kernel::convolve_plus(black_box(&img), 0.4)))
    });
    group.finish();
}

criterion_group!(benches, bench_sharpen);
criterion_main!(benches);
