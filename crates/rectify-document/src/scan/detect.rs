// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectangle detection — locate the largest document-like quadrilateral in a
// photographed scene.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::median_filter;
use imageproc::morphology::dilate;
use rayon::prelude::*;
use rectify_core::error::{RectifyError, Result};
use rectify_core::{AreaThreshold, Contour, DetectorConfig, Point, Quadrilateral};
use tracing::{debug, info, instrument, warn};

/// Finds the outline of a document in a photo.
///
/// The search runs on a downscaled, median-blurred copy of the image. Every
/// color plane is binarised several ways (Canny plus a ladder of fixed
/// thresholds), every contour of every binarisation is simplified to a
/// polygon, and the largest polygon that looks like a rectangle wins. The
/// winner is mapped back to the coordinates of the original image.
///
/// ```ignore
/// let detector = RectangleDetector::default();
/// if let Some(quad) = detector.find_rectangle(&photo, AreaThreshold::new(0.2, 0.98)?)? {
///     let page = PerspectiveRectifier::default().rectify(&photo, &quad)?;
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RectangleDetector {
    config: DetectorConfig,
}

/// An accepted polygon in working-image coordinates.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    quad: Quadrilateral,
    area: f64,
}

/// The blurred color planes the search runs over.
struct WorkingImage {
    planes: Vec<GrayImage>,
    /// Working size divided by original size.
    ratio: f64,
    total_area: f64,
}

impl RectangleDetector {
    // -- Construction ---------------------------------------------------------

    /// Create a detector, rejecting inconsistent tunables.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    // -- Detection ------------------------------------------------------------

    /// Return the largest rectangle candidate in original image coordinates,
    /// or `None` when nothing passes classification.
    ///
    /// Fails with `InvalidImage` for an image with a zero dimension and with
    /// `InvalidConfig` for inconsistent area bounds.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn find_rectangle(
        &self,
        image: &DynamicImage,
        area: AreaThreshold,
    ) -> Result<Option<Quadrilateral>> {
        info!("Searching for document outline");
        area.validate()?;

        let working = self.prepare(image)?;
        let candidates = self.search(&working, area);

        let Some(best) = largest(candidates) else {
            info!("No document outline found");
            return Ok(None);
        };

        let quad = best.quad.scale(1.0 / working.ratio);
        info!(
            area = quad.area(),
            vertices = ?quad.vertices(),
            "Document outline found"
        );
        Ok(Some(quad))
    }

    /// `find_rectangle` with the area bounds from the detector config.
    pub fn find_rectangle_with_defaults(&self, image: &DynamicImage) -> Result<Option<Quadrilateral>> {
        self.find_rectangle(image, self.config.area)
    }

    /// Every accepted candidate, in original image coordinates and discovery
    /// order. Duplicates across passes are kept.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn find_candidates(
        &self,
        image: &DynamicImage,
        area: AreaThreshold,
    ) -> Result<Vec<Quadrilateral>> {
        area.validate()?;
        let working = self.prepare(image)?;
        let scale = 1.0 / working.ratio;
        Ok(self
            .search(&working, area)
            .into_iter()
            .map(|c| c.quad.scale(scale))
            .collect())
    }

    // -- Pipeline stages ------------------------------------------------------

    /// Downscale, split into planes and blur.
    fn prepare(&self, image: &DynamicImage) -> Result<WorkingImage> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            warn!(width, height, "Rejecting image with a zero dimension");
            return Err(RectifyError::InvalidImage(format!(
                "image must have non-zero dimensions, got {}x{}",
                width, height
            )));
        }

        let ratio = self.config.target_max_dimension as f64 / width.max(height) as f64;
        let work_w = ((width as f64 * ratio).round() as u32).max(1);
        let work_h = ((height as f64 * ratio).round() as u32).max(1);
        debug!(ratio, work_w, work_h, "Downscaling for detection");

        let resized = image.resize_exact(work_w, work_h, self.config.resample_filter.into());

        let radius = self.config.median_radius();
        let planes: Vec<GrayImage> = channel_planes(&resized)
            .par_iter()
            .map(|plane| median_filter(plane, radius, radius))
            .collect();
        debug!(planes = planes.len(), radius, "Median blur applied");

        Ok(WorkingImage {
            planes,
            ratio,
            total_area: work_w as f64 * work_h as f64,
        })
    }

    /// Run every (plane, level) pass and merge the candidates in pass order.
    fn search(&self, working: &WorkingImage, area: AreaThreshold) -> Vec<Candidate> {
        let levels = self.config.threshold_levels;
        let passes: Vec<(usize, u32)> = (0..working.planes.len())
            .flat_map(|plane| (0..levels).map(move |level| (plane, level)))
            .collect();

        let candidates: Vec<Candidate> = passes
            .par_iter()
            .map(|&(plane, level)| self.run_pass(&working.planes[plane], level, working.total_area, area))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        debug!(
            passes = passes.len(),
            candidates = candidates.len(),
            "Candidate search complete"
        );
        candidates
    }

    /// Binarise one plane at one level and collect its rectangle candidates.
    fn run_pass(
        &self,
        plane: &GrayImage,
        level: u32,
        total_area: f64,
        area: AreaThreshold,
    ) -> Vec<Candidate> {
        let binary = if level == 0 {
            // Canny catches outlines under gradient shading that no global
            // threshold separates.
            let edges = canny(plane, self.config.canny_low_threshold(), self.config.canny_high);
            dilate(&edges, Norm::LInf, self.config.dilation_radius())
        } else {
            binary_threshold(plane, level_threshold(level, self.config.threshold_levels))
        };

        find_contours::<i32>(&binary)
            .iter()
            .filter(|raw| raw.points.len() >= 4)
            .filter_map(|raw| {
                let contour = Contour::from(raw);
                let epsilon = contour.perimeter() * self.config.approx_epsilon_ratio;
                let polygon = contour.approximate(epsilon);
                if is_rectangle(polygon.points(), total_area, area, self.config.max_cosine) {
                    let quad = Quadrilateral::try_from(polygon).ok()?;
                    Some(Candidate {
                        area: quad.area(),
                        quad,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Decide whether a simplified polygon is a plausible document outline.
///
/// Accepts exactly four vertices whose absolute area lies within `area` of
/// `total_area` (inclusive), forming a strictly convex polygon whose interior
/// angles all have `|cos| < max_cosine`.
pub fn is_rectangle(polygon: &[Point], total_area: f64, area: AreaThreshold, max_cosine: f64) -> bool {
    if polygon.len() != 4 {
        return false;
    }
    let polygon_area = rectify_core::geometry::polygon_area(polygon);
    if !area.contains(polygon_area, total_area) {
        return false;
    }
    if !rectify_core::geometry::is_convex(polygon) {
        return false;
    }
    rectify_core::geometry::max_abs_cosine(polygon) < max_cosine
}

/// Threshold for binarisation level `level` out of `levels`.
fn level_threshold(level: u32, levels: u32) -> u8 {
    ((level + 1) * 255 / levels).min(255) as u8
}

/// 255 where the pixel is strictly brighter than `threshold`, else 0.
fn binary_threshold(plane: &GrayImage, threshold: u8) -> GrayImage {
    let mut output = plane.clone();
    for pixel in output.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > threshold { 255 } else { 0 };
    }
    output
}

/// Split into 8-bit planes: R, G and B for color images (alpha ignored), a
/// single luma plane otherwise.
fn channel_planes(image: &DynamicImage) -> Vec<GrayImage> {
    if !image.color().has_color() {
        return vec![image.to_luma8()];
    }
    let rgb = image.to_rgb8();
    (0..3)
        .map(|c| GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| Luma([rgb.get_pixel(x, y).0[c]])))
        .collect()
}

/// Largest candidate by area; the first discovered wins ties.
fn largest(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(current) if current.area >= candidate.area => Some(current),
        _ => Some(candidate),
    })
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::fixtures::{self, BACKGROUND};
    use image::{Rgb, RgbImage};

    fn quad(coords: [(f64, f64); 4]) -> Vec<Point> {
        coords.iter().copied().map(Point::from).collect()
    }

    fn default_area() -> AreaThreshold {
        AreaThreshold::new(0.2, 0.98).unwrap()
    }

    // -- Classification -------------------------------------------------------

    #[test]
    fn rejects_wrong_vertex_count() {
        let triangle = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(0.0, 100.0)];
        assert!(!is_rectangle(&triangle, 10_000.0, default_area(), 0.3));
    }

    #[test]
    fn area_bounds_are_inclusive() {
        let total = 10_000.0;
        let area = AreaThreshold::new(0.25, 0.75).unwrap();
        let at_lower = quad([(0.0, 0.0), (50.0, 0.0), (50.0, 50.0), (0.0, 50.0)]);
        let at_upper = quad([(0.0, 0.0), (75.0, 0.0), (75.0, 100.0), (0.0, 100.0)]);
        assert!(is_rectangle(&at_lower, total, area, 0.3));
        assert!(is_rectangle(&at_upper, total, area, 0.3));

        let below = quad([(0.0, 0.0), (49.0, 0.0), (49.0, 50.0), (0.0, 50.0)]);
        let above = quad([(0.0, 0.0), (76.0, 0.0), (76.0, 100.0), (0.0, 100.0)]);
        assert!(!is_rectangle(&below, total, area, 0.3));
        assert!(!is_rectangle(&above, total, area, 0.3));
    }

    #[test]
    fn area_sweep_matches_threshold() {
        let total = 10_000.0;
        let area = default_area();
        for side in (10..=100).step_by(3) {
            let s = side as f64;
            let square = quad([(0.0, 0.0), (s, 0.0), (s, s), (0.0, s)]);
            let expected = area.contains(s * s, total);
            assert_eq!(is_rectangle(&square, total, area, 0.3), expected, "side {side}");
        }
    }

    #[test]
    fn rejects_reflex_quadrilateral() {
        let dart = quad([(0.0, 0.0), (50.0, 30.0), (100.0, 0.0), (50.0, 100.0)]);
        assert!(!is_rectangle(&dart, 10_000.0, AreaThreshold::new(0.0, 1.0).unwrap(), 0.3));
    }

    #[test]
    fn angle_gate_separates_near_rectangles_from_skewed_ones() {
        let total = 10_000.0;
        let area = AreaThreshold::new(0.0, 1.0).unwrap();

        let near_rect = quad([(2.0, 0.0), (90.0, 4.0), (88.0, 80.0), (0.0, 76.0)]);
        assert!(is_rectangle(&near_rect, total, area, 0.3));

        // 60 degree corners: |cos| = 0.5.
        let h = 40.0 * 3f64.sqrt();
        let rhombus = quad([(0.0, 0.0), (80.0, 0.0), (120.0, h), (40.0, h)]);
        assert!(!is_rectangle(&rhombus, total, area, 0.3));
    }

    #[test]
    fn level_thresholds_follow_the_ladder() {
        assert_eq!(level_threshold(1, 5), 102);
        assert_eq!(level_threshold(2, 5), 153);
        assert_eq!(level_threshold(4, 5), 255);
        assert_eq!(level_threshold(10, 11), 255);
        assert_eq!(level_threshold(254, rectify_core::MAX_THRESHOLD_LEVELS), 255);
        assert_eq!(level_threshold(1, rectify_core::MAX_THRESHOLD_LEVELS), 2);
    }

    #[test]
    fn binary_threshold_is_strict() {
        let plane = GrayImage::from_fn(3, 1, |x, _| Luma([[101u8, 102, 103][x as usize]]));
        let binary = binary_threshold(&plane, 102);
        assert_eq!(binary.as_raw(), &vec![0, 0, 255]);
    }

    #[test]
    fn planes_follow_color_model() {
        let gray = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        assert_eq!(channel_planes(&gray).len(), 1);

        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
        let planes = channel_planes(&rgb);
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[2].get_pixel(0, 0).0[0], 3);
    }

    #[test]
    fn largest_prefers_first_on_ties() {
        let a = Quadrilateral::new([Point::new(0.0, 0.0); 4]);
        let b = Quadrilateral::new([Point::new(1.0, 1.0); 4]);
        let winner = largest(vec![
            Candidate { quad: a, area: 5.0 },
            Candidate { quad: b, area: 5.0 },
        ])
        .unwrap();
        assert_eq!(winner.quad, a);
        assert!(largest(Vec::new()).is_none());
    }

    // -- Full pipeline --------------------------------------------------------

    #[test]
    fn zero_sized_image_fails_fast() {
        let detector = RectangleDetector::default();
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 10));
        let err = detector.find_rectangle(&empty, default_area()).unwrap_err();
        assert!(matches!(err, RectifyError::InvalidImage(_)));
    }

    #[test]
    fn inverted_area_bounds_fail_fast() {
        let detector = RectangleDetector::default();
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, BACKGROUND));
        let bad = AreaThreshold { lower: 0.9, upper: 0.1 };
        assert!(matches!(
            detector.find_rectangle(&page, bad),
            Err(RectifyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn blank_canvas_has_no_rectangle() {
        let detector = RectangleDetector::default();
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(600, 800, BACKGROUND));
        assert_eq!(detector.find_rectangle(&blank, default_area()).unwrap(), None);
    }

    #[test]
    fn finds_bordered_page_within_five_percent() {
        let detector = RectangleDetector::default();
        let page = fixtures::bordered_page();
        let expected = rectify_core::geometry::polygon_area(&fixtures::PAGE_OUTLINE.map(Point::from));

        let found = detector
            .find_rectangle(&page, default_area())
            .unwrap()
            .expect("page outline should be detected");

        let relative = (found.area() - expected).abs() / expected;
        assert!(
            relative < 0.05,
            "area {} vs expected {} ({:.1}% off)",
            found.area(),
            expected,
            relative * 100.0
        );
    }

    #[test]
    fn detection_is_deterministic() {
        let detector = RectangleDetector::default();
        let page = fixtures::bordered_page();
        let first = detector.find_rectangle(&page, default_area()).unwrap();
        let second = detector.find_rectangle(&page, default_area()).unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn rescale_restores_original_corners() {
        // 1200 px long side => working ratio 0.5.
        let corners = [(200.0, 150.0), (1000.0, 150.0), (1000.0, 750.0), (200.0, 750.0)];
        let page = fixtures::solid_quad_page(1200, 900, corners);
        let detector = RectangleDetector::default();

        let found = detector
            .find_rectangle(&page, default_area())
            .unwrap()
            .expect("rectangle should be detected");

        let ratio = 600.0 / 1200.0;
        let tolerance = 5.0 / ratio;
        for expected in corners.map(Point::from) {
            let nearest = found
                .vertices()
                .iter()
                .map(|v| v.distance(expected))
                .fold(f64::INFINITY, f64::min);
            assert!(
                nearest <= tolerance,
                "corner {expected:?} is {nearest:.2}px from {:?}",
                found.vertices()
            );
        }
    }

    #[test]
    fn candidates_respect_area_bounds_in_original_space() {
        let detector = RectangleDetector::default();
        let page = fixtures::bordered_page();
        let total = (page.width() * page.height()) as f64;
        let candidates = detector.find_candidates(&page, default_area()).unwrap();

        assert!(!candidates.is_empty());
        for candidate in &candidates {
            let ratio = candidate.area() / total;
            // Working-space bounds survive rescaling up to rounding of the
            // working size.
            assert!((0.19..=0.99).contains(&ratio), "ratio {ratio}");
            assert!(candidate.is_convex());
            assert!(candidate.max_abs_cosine() < 0.3);
        }
    }

    #[test]
    fn edge_pass_alone_finds_shaded_page() {
        let config = DetectorConfig {
            threshold_levels: 1,
            ..DetectorConfig::default()
        };
        let detector = RectangleDetector::new(config).unwrap();
        let page = fixtures::shaded_page();
        let expected = rectify_core::geometry::polygon_area(&fixtures::PAGE_OUTLINE.map(Point::from));

        let found = detector
            .find_rectangle(&page, default_area())
            .unwrap()
            .expect("edge pass should recover the shaded outline");

        let relative = (found.area() - expected).abs() / expected;
        assert!(relative < 0.06, "area {} vs expected {}", found.area(), expected);
        for corner in fixtures::PAGE_OUTLINE.map(Point::from) {
            let nearest = found
                .vertices()
                .iter()
                .map(|v| v.distance(corner))
                .fold(f64::INFINITY, f64::min);
            assert!(nearest <= 12.0, "corner {corner:?} is {nearest:.2}px away");
        }
    }

    #[test]
    fn grayscale_input_uses_single_plane() {
        let page = fixtures::bordered_page().grayscale();
        let found = RectangleDetector::default()
            .find_rectangle(&page, default_area())
            .unwrap();
        assert!(found.is_some());
    }
}
