// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the scanning pipeline in the rectify-document crate.
// Both benchmarks run on a synthetic 1200x1600 photo of a tilted page, large
// enough that detection includes the downscale step.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;

use rectify_core::AreaThreshold;
use rectify_document::{PerspectiveRectifier, RectangleDetector};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// White background with a gray tilted page.
fn synthetic_photo() -> DynamicImage {
    let mut img = RgbImage::from_pixel(1200, 1600, Rgb([245, 245, 245]));
    let outline = [
        PixelPoint::new(200, 320),
        PixelPoint::new(1000, 280),
        PixelPoint::new(1010, 1230),
        PixelPoint::new(190, 1260),
    ];
    draw_polygon_mut(&mut img, &outline, Rgb([110, 110, 110]));
    DynamicImage::ImageRgb8(img)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Full detection: downscale, median blur, one binarisation per plane and level, contour
/// search and selection.
fn bench_find_rectangle(c: &mut Criterion) {
    let photo = synthetic_photo();
    let detector = RectangleDetector::default();

    c.bench_function("find_rectangle (1200x1600)", |b| {
        b.iter(|| {
            let found = detector
                .find_rectangle(black_box(&photo), AreaThreshold::default())
                .ok()
                .flatten();
            black_box(found);
        });
    });
}

/// Perspective warp of the whole photo given an already-detected outline.
fn bench_rectify(c: &mut Criterion) {
    let photo = synthetic_photo();
    let Ok(Some(quad)) = RectangleDetector::default().find_rectangle(&photo, AreaThreshold::default())
    else {
        return;
    };
    let rectifier = PerspectiveRectifier::default();

    c.bench_function("rectify (1200x1600)", |b| {
        b.iter(|| {
            let flat = rectifier.rectify(black_box(&photo), black_box(&quad)).ok();
            black_box(flat);
        });
    });
}

criterion_group!(benches, bench_find_rectangle, bench_rectify);
criterion_main!(benches);
