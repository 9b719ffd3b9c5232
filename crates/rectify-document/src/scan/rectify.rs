// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — label the corners of a detected quadrilateral
// and warp it onto the full output canvas.

use image::{DynamicImage, Luma, LumaA, Rgb, Rgba};
use imageproc::geometric_transformations::{Interpolation, Projection, warp};
use rectify_core::error::{RectifyError, Result};
use rectify_core::{CornerOrdering, OrderedQuadrilateral, Point, Quadrilateral, RectifierConfig};
use tracing::{debug, info, instrument, warn};

/// Quadrilaterals at or below this area (px²) cannot define a projection.
const MIN_SOURCE_AREA: f64 = 1e-6;

/// Flattens a quadrilateral region of an image into a front-on view.
///
/// The output has the same dimensions and pixel layout as the source; the
/// quadrilateral is stretched to fill it and pixels mapping outside the
/// source are zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerspectiveRectifier {
    config: RectifierConfig,
}

impl PerspectiveRectifier {
    pub fn new(config: RectifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RectifierConfig {
        &self.config
    }

    /// Label the corners with the configured strategy.
    pub fn order_corners(&self, quad: &Quadrilateral) -> Result<OrderedQuadrilateral> {
        order_corners(quad, self.config.corner_ordering)
    }

    /// The projection taking `quad` onto a `width` x `height` canvas.
    pub fn projection(&self, quad: &Quadrilateral, width: u32, height: u32) -> Result<Projection> {
        let ordered = self.order_corners(quad)?;
        perspective_transform(&ordered, &OrderedQuadrilateral::canvas(width, height))
    }

    /// Warp `image` so that `quad` fills the whole output canvas.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn rectify(&self, image: &DynamicImage, quad: &Quadrilateral) -> Result<DynamicImage> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            warn!(width, height, "Rejecting image with a zero dimension");
            return Err(RectifyError::InvalidImage(format!(
                "image must have non-zero dimensions, got {}x{}",
                width, height
            )));
        }

        let projection = self.projection(quad, width, height)?;
        let output = warp_dynamic(image, &projection, self.config.interpolation.into());

        info!(
            interpolation = ?self.config.interpolation,
            "Perspective rectification applied"
        );
        Ok(output)
    }
}

/// Label four unordered vertices as top-left, top-right, bottom-right,
/// bottom-left.
pub fn order_corners(quad: &Quadrilateral, strategy: CornerOrdering) -> Result<OrderedQuadrilateral> {
    let ordered = match strategy {
        CornerOrdering::CentroidSplit => order_by_centroid_split(quad)?,
        CornerOrdering::AngularSort => order_by_angle(quad),
    };
    debug!(?strategy, ?ordered, "Corners ordered");
    Ok(ordered)
}

fn order_by_centroid_split(quad: &Quadrilateral) -> Result<OrderedQuadrilateral> {
    let center = quad.centroid();
    let (top, bottom): (Vec<Point>, Vec<Point>) =
        quad.vertices().iter().partition(|p| p.y < center.y);

    let (Ok(top), Ok(bottom)) = (<[Point; 2]>::try_from(top), <[Point; 2]>::try_from(bottom)) else {
        return Err(RectifyError::InvalidQuadrilateral(format!(
            "centroid split needs two vertices above y = {:.2} and two below; \
             use angular_sort for quadrilaterals rotated near 45 degrees",
            center.y
        )));
    };

    let (top_left, top_right) = left_right(top);
    let (bottom_left, bottom_right) = left_right(bottom);
    Ok(OrderedQuadrilateral {
        top_left,
        top_right,
        bottom_right,
        bottom_left,
    })
}

/// Smaller x is left; the first vertex wins a tie.
fn left_right([a, b]: [Point; 2]) -> (Point, Point) {
    if a.x > b.x { (b, a) } else { (a, b) }
}

fn order_by_angle(quad: &Quadrilateral) -> OrderedQuadrilateral {
    let center = quad.centroid();
    let mut corners = *quad.vertices();
    // With y pointing down, increasing angle runs clockwise on screen.
    corners.sort_by(|a, b| {
        let angle_a = (a.y - center.y).atan2(a.x - center.x);
        let angle_b = (b.y - center.y).atan2(b.x - center.x);
        angle_a.total_cmp(&angle_b)
    });

    let start = corners
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.x + a.y).total_cmp(&(b.x + b.y)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    corners.rotate_left(start);

    let [top_left, top_right, bottom_right, bottom_left] = corners;
    OrderedQuadrilateral {
        top_left,
        top_right,
        bottom_right,
        bottom_left,
    }
}

/// Solve the 8-parameter homography mapping `from` onto `to`, corner for corner.
pub fn perspective_transform(from: &OrderedQuadrilateral, to: &OrderedQuadrilateral) -> Result<Projection> {
    for (name, outline) in [("source", from), ("destination", to)] {
        let area = Quadrilateral::from(*outline).area();
        if area <= MIN_SOURCE_AREA {
            return Err(RectifyError::InvalidQuadrilateral(format!(
                "{} quadrilateral is degenerate (area {:.3e})",
                name, area
            )));
        }
    }

    Projection::from_control_points(from.to_control_points(), to.to_control_points()).ok_or_else(|| {
        RectifyError::Projection(format!(
            "no projective transform maps {:?} onto {:?}",
            from.to_array(),
            to.to_array()
        ))
    })
}

/// Warp into a same-sized buffer of the same layout, zero-filled outside the
/// source. Layouts other than 8-bit L, LA, RGB and RGBA are warped as RGBA8.
fn warp_dynamic(image: &DynamicImage, projection: &Projection, interpolation: Interpolation) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(buf) => {
            DynamicImage::ImageLuma8(warp(buf, projection, interpolation, Luma([0])))
        }
        DynamicImage::ImageLumaA8(buf) => {
            DynamicImage::ImageLumaA8(warp(buf, projection, interpolation, LumaA([0, 0])))
        }
        DynamicImage::ImageRgb8(buf) => {
            DynamicImage::ImageRgb8(warp(buf, projection, interpolation, Rgb([0, 0, 0])))
        }
        DynamicImage::ImageRgba8(buf) => {
            DynamicImage::ImageRgba8(warp(buf, projection, interpolation, Rgba([0, 0, 0, 0])))
        }
        other => {
            debug!(color = ?other.color(), "Converting to RGBA8 before warping");
            let rgba = other.to_rgba8();
            DynamicImage::ImageRgba8(warp(&rgba, projection, interpolation, Rgba([0, 0, 0, 0])))
        }
    }
}

// -- Tests --------------------------------------------------------------------
