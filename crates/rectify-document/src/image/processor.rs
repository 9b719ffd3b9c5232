// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — load/save, preview shrinking, region masking and
// candidate outline overlays around the scanning pipeline. Operates on
// in-memory images using the `image` and `imageproc` crates.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use rectify_core::error::{RectifyError, Result};
use rectify_core::types::Quadrilateral;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A rectangle expressed as ratios of the image size, all in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for MaskRegion {
    /// The upper-left block covered by the "mask" action of the scanner app.
    fn default() -> Self {
        Self {
            x: 0.03,
            y: 0.02,
            width: 0.45,
            height: 0.32,
        }
    }
}

impl MaskRegion {
    /// Resolve to pixel bounds `(x, y, width, height)` clamped to the image.
    /// Returns `None` when the clamped rectangle is empty.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let ratio = |value: f64| if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };

        let (w, h) = (image_width as f64, image_height as f64);
        let x0 = (ratio(self.x) * w).round() as u32;
        let y0 = (ratio(self.y) * h).round() as u32;
        let x1 = (ratio(self.x + self.width) * w).round() as u32;
        let y1 = (ratio(self.y + self.height) * h).round() as u32;

        let (x0, y0) = (x0.min(image_width), y0.min(image_height));
        let (x1, y1) = (x1.min(image_width), y1.min(image_height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transforming method consumes `self` and returns a new
/// `ImageProcessor`, enabling method chaining.
///
/// ```ignore
/// let preview = ImageProcessor::open("photo.jpg")?
///     .fit_within(2048)
///     .mask_region(MaskRegion::default())
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            RectifyError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            RectifyError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Shrink the image so neither side exceeds `limit`, preserving aspect
    /// ratio. Images already within the limit, and a zero limit, are left as is.
    #[instrument(skip(self), fields(limit))]
    pub fn fit_within(self, limit: u32) -> Self {
        let (w, h) = (self.image.width(), self.image.height());
        if limit == 0 || (w <= limit && h <= limit) {
            return self;
        }
        info!(from_w = w, from_h = h, limit, "Shrinking image");
        let resized = self
            .image
            .resize(limit, limit, image::imageops::FilterType::Lanczos3);
        debug!(
            new_w = resized.width(),
            new_h = resized.height(),
            "Shrink complete"
        );
        Self { image: resized }
    }

    /// Paint `region` opaque black. Images without alpha come back as RGB8.
    #[instrument(skip(self))]
    pub fn mask_region(self, region: MaskRegion) -> Self {
        let Some((x, y, w, h)) = region.to_pixels(self.image.width(), self.image.height()) else {
            debug!("Mask region is empty after clamping");
            return self;
        };
        info!(x, y, w, h, "Masking region");
        let image = paint_rgba(self.image, |canvas| {
            draw_filled_rect_mut(
                canvas,
                Rect::at(x as i32, y as i32).of_size(w, h),
                Rgba([0, 0, 0, 255]),
            );
        });
        Self { image }
    }

    /// Draw each quadrilateral's closed outline in `color`, `thickness`
    /// pixels wide. Vertices may lie partly outside the image.
    #[instrument(skip(self, quads, color), fields(count = quads.len()))]
    pub fn draw_outlines(self, quads: &[Quadrilateral], color: Rgba<u8>, thickness: u32) -> Self {
        let thickness = thickness.max(1) as i32;
        let offsets: Vec<f32> = (0..thickness)
            .map(|i| (i - (thickness - 1) / 2) as f32)
            .collect();

        let image = paint_rgba(self.image, |canvas| {
            for quad in quads {
                let vertices = quad.vertices();
                for (i, start) in vertices.iter().enumerate() {
                    let (sx, sy) = start.to_f32_pair();
                    let (ex, ey) = vertices[(i + 1) % vertices.len()].to_f32_pair();
                    for &dx in &offsets {
                        for &dy in &offsets {
                            draw_line_segment_mut(canvas, (sx + dx, sy + dy), (ex + dx, ey + dy), color);
                        }
                    }
                }
            }
        });
        Self { image }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder).map_err(|err| {
            RectifyError::ImageError(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            RectifyError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// Draw on an RGBA8 copy, then return RGB8 unless the source carried alpha.
fn paint_rgba(image: DynamicImage, paint: impl FnOnce(&mut RgbaImage)) -> DynamicImage {
    let has_alpha = image.color().has_alpha();
    let mut canvas = image.into_rgba8();
    paint(&mut canvas);
    let painted = DynamicImage::ImageRgba8(canvas);
    if has_alpha {
        painted
    } else {
        DynamicImage::ImageRgb8(painted.into_rgb8())
    }
}

fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        RectifyError::ImageError(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}
