// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic pages shared by the scanning tests.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const BORDER: Rgb<u8> = Rgb([0, 0, 0]);
pub const FILL: Rgb<u8> = Rgb([128, 128, 128]);
pub const INK: Rgb<u8> = Rgb([40, 40, 40]);

pub const PAGE_WIDTH: u32 = 600;
pub const PAGE_HEIGHT: u32 = 800;

/// Outer edge of the page drawn by `bordered_page`; about 40% of the canvas.
pub const PAGE_OUTLINE: [(f64, f64); 4] = [(100.0, 160.0), (500.0, 140.0), (505.0, 615.0), (95.0, 630.0)];

fn to_pixels(corners: [(f64, f64); 4]) -> Vec<PixelPoint<i32>> {
    corners
        .iter()
        .map(|&(x, y)| PixelPoint::new(x.round() as i32, y.round() as i32))
        .collect()
}

/// White 600x800 canvas with a gray quadrilateral framed by a black border.
pub fn bordered_page() -> DynamicImage {
    let mut canvas = RgbImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, BACKGROUND);
    draw_polygon_mut(&mut canvas, &to_pixels(PAGE_OUTLINE), BORDER);

    let (cx, cy) = PAGE_OUTLINE
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x / 4.0, sy + y / 4.0));
    let inner = PAGE_OUTLINE.map(|(x, y)| (cx + (x - cx) * 0.95, cy + (y - cy) * 0.95));
    draw_polygon_mut(&mut canvas, &to_pixels(inner), FILL);

    DynamicImage::ImageRgb8(canvas)
}

/// White canvas with a single dark filled quadrilateral.
pub fn solid_quad_page(width: u32, height: u32, corners: [(f64, f64); 4]) -> DynamicImage {
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
    draw_polygon_mut(&mut canvas, &to_pixels(corners), INK);
    DynamicImage::ImageRgb8(canvas)
}

/// White canvas with an unframed page at `PAGE_OUTLINE` whose fill brightens
/// left to right from 200 to 230.
pub fn shaded_page() -> DynamicImage {
    let mut mask = GrayImage::new(PAGE_WIDTH, PAGE_HEIGHT);
    draw_polygon_mut(&mut mask, &to_pixels(PAGE_OUTLINE), Luma([255]));

    let canvas = RgbImage::from_fn(PAGE_WIDTH, PAGE_HEIGHT, |x, y| {
        if mask.get_pixel(x, y).0[0] == 0 {
            return BACKGROUND;
        }
        let shade = 200 + (30 * x / PAGE_WIDTH) as u8;
        Rgb([shade, shade, shade])
    });
    DynamicImage::ImageRgb8(canvas)
}
