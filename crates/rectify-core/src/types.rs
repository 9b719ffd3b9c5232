// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: points, contours and quadrilaterals in image space.

use serde::{Deserialize, Serialize};

use crate::error::{RectifyError, Result};
use crate::geometry;

/// A point in image space. `x` grows to the right, `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Multiply both coordinates by `factor`.
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Control-point form expected by `imageproc` projections.
    pub fn to_f32_pair(self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }
}

impl From<imageproc::point::Point<i32>> for Point {
    fn from(p: imageproc::point::Point<i32>) -> Self {
        Self::new(p.x as f64, p.y as f64)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// A closed polygon boundary as produced by contour extraction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Absolute enclosed area.
    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.points)
    }

    /// Closed perimeter, including the edge from the last vertex back to the first.
    pub fn perimeter(&self) -> f64 {
        geometry::arc_length(&self.points, true)
    }

    /// Simplify with closed-curve Douglas-Peucker at `epsilon` pixels.
    pub fn approximate(&self, epsilon: f64) -> Contour {
        Contour::new(geometry::approximate_closed_polygon(&self.points, epsilon))
    }
}

impl From<&imageproc::contours::Contour<i32>> for Contour {
    fn from(contour: &imageproc::contours::Contour<i32>) -> Self {
        Self::new(contour.points.iter().copied().map(Point::from).collect())
    }
}

/// Four vertices with no implied ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    vertices: [Point; 4],
}

impl Quadrilateral {
    pub fn new(vertices: [Point; 4]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point; 4] {
        &self.vertices
    }

    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.vertices)
    }

    /// Arithmetic mean of the vertices.
    pub fn centroid(&self) -> Point {
        geometry::centroid(&self.vertices)
    }

    pub fn is_convex(&self) -> bool {
        geometry::is_convex(&self.vertices)
    }

    /// Largest absolute interior-angle cosine over all four vertices.
    pub fn max_abs_cosine(&self) -> f64 {
        geometry::max_abs_cosine(&self.vertices)
    }

    /// Multiply every vertex by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.vertices.map(|p| p.scale(factor)))
    }
}

impl TryFrom<&[Point]> for Quadrilateral {
    type Error = RectifyError;

    fn try_from(points: &[Point]) -> Result<Self> {
        let vertices: [Point; 4] = points.try_into().map_err(|_| {
            RectifyError::InvalidQuadrilateral(format!(
                "expected 4 vertices, got {}",
                points.len()
            ))
        })?;
        Ok(Self::new(vertices))
    }
}

impl TryFrom<Contour> for Quadrilateral {
    type Error = RectifyError;

    fn try_from(contour: Contour) -> Result<Self> {
        Self::try_from(contour.points())
    }
}

/// A quadrilateral with labelled corners, in cyclic order
/// top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderedQuadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl OrderedQuadrilateral {
    /// Corners in cyclic order starting at top-left.
    pub fn to_array(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// The axis-aligned outline of a `width` x `height` canvas.
    pub fn canvas(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(w, 0.0),
            bottom_right: Point::new(w, h),
            bottom_left: Point::new(0.0, h),
        }
    }

    pub fn to_control_points(&self) -> [(f32, f32); 4] {
        self.to_array().map(Point::to_f32_pair)
    }
}

impl From<OrderedQuadrilateral> for Quadrilateral {
    fn from(ordered: OrderedQuadrilateral) -> Self {
        Self::new(ordered.to_array())
    }
}

/// Accepted range for a candidate's area, as ratios of the total image area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaThreshold {
    pub lower: f64,
    pub upper: f64,
}

impl AreaThreshold {
    /// Build a threshold, rejecting non-finite, negative or inverted bounds.
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        let threshold = Self { lower, upper };
        threshold.validate()?;
        Ok(threshold)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(RectifyError::InvalidConfig(format!(
                "area ratios must be finite, got {}..{}",
                self.lower, self.upper
            )));
        }
        if self.lower < 0.0 || self.lower > self.upper {
            return Err(RectifyError::InvalidConfig(format!(
                "area ratios must satisfy 0 <= lower <= upper, got {}..{}",
                self.lower, self.upper
            )));
        }
        Ok(())
    }

    /// Inclusive on both ends.
    pub fn contains(&self, area: f64, total_area: f64) -> bool {
        area >= total_area * self.lower && area <= total_area * self.upper
    }
}

impl Default for AreaThreshold {
    fn default() -> Self {
        Self {
            lower: 0.2,
            upper: 0.98,
        }
    }
}
