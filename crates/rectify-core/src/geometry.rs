// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygon helpers — area, perimeter, convexity, corner angles and
// closed-curve Douglas-Peucker simplification.

use crate::types::Point;

/// Added under the square root of the cosine denominator so that zero-length
/// edges yield a cosine of 0 instead of NaN.
pub const COSINE_EPSILON: f64 = 1e-10;

/// Rounds of "farthest point from the previous anchor" used to choose the two
/// anchor vertices of a closed curve.
const ANCHOR_ROUNDS: usize = 3;

/// Signed shoelace area. Positive for clockwise winding in image space
/// (y pointing down).
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice_area / 2.0
}

/// Absolute shoelace area of a simple polygon.
pub fn polygon_area(points: &[Point]) -> f64 {
    signed_area(points).abs()
}

/// Total length of the polyline; `closed` adds the edge back to the start.
pub fn arc_length(points: &[Point], closed: bool) -> f64 {
    let open: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    match (closed, points.first(), points.last()) {
        (true, Some(first), Some(last)) if points.len() > 1 => open + last.distance(*first),
        _ => open,
    }
}

pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

/// Cosine of the angle at `p0` between the rays towards `p1` and `p2`.
pub fn angle_cosine(p1: Point, p2: Point, p0: Point) -> f64 {
    let (dx1, dy1) = (p1.x - p0.x, p1.y - p0.y);
    let (dx2, dy2) = (p2.x - p0.x, p2.y - p0.y);
    (dx1 * dx2 + dy1 * dy2)
        / ((dx1 * dx1 + dy1 * dy1) * (dx2 * dx2 + dy2 * dy2) + COSINE_EPSILON).sqrt()
}

/// Largest `|cos|` over the interior angles at every vertex of a closed polygon.
pub fn max_abs_cosine(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 1.0;
    }
    (0..n)
        .map(|i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            angle_cosine(next, prev, points[i]).abs()
        })
        .fold(0.0, f64::max)
}

/// Strict convexity: every turn has the same, non-zero orientation.
pub fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut orientation = 0.0f64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross == 0.0 {
            return false;
        }
        if orientation == 0.0 {
            orientation = cross.signum();
        } else if cross.signum() != orientation {
            return false;
        }
    }
    true
}

/// Perpendicular distance from `point` to the infinite line through `a` and `b`.
/// Falls back to the point distance when `a == b`.
fn distance_to_line(point: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length = dx.hypot(dy);
    if length == 0.0 {
        return point.distance(a);
    }
    ((point.x - a.x) * dy - (point.y - a.y) * dx).abs() / length
}

fn farthest_from(points: &[Point], anchor: usize) -> usize {
    let origin = points[anchor];
    let mut best = anchor;
    let mut best_distance = 0.0;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance(origin);
        if d > best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

/// Mark the vertices Douglas-Peucker keeps on the chain running forward
/// (with wrap-around) from `start` to `end`.
fn simplify_chain(points: &[Point], start: usize, end: usize, epsilon: f64, keep: &mut [bool]) {
    let n = points.len();
    let chain_len = (end + n - start) % n;
    let at = |offset: usize| (start + offset) % n;

    let mut stack = vec![(0usize, chain_len)];
    while let Some((lo, hi)) = stack.pop() {
        if hi - lo < 2 {
            continue;
        }
        let (a, b) = (points[at(lo)], points[at(hi)]);
        let mut max_distance = 0.0;
        let mut split = lo;
        for offset in lo + 1..hi {
            let d = distance_to_line(points[at(offset)], a, b);
            if d > max_distance {
                max_distance = d;
                split = offset;
            }
        }
        if max_distance > epsilon {
            keep[at(split)] = true;
            stack.push((lo, split));
            stack.push((split, hi));
        }
    }
}

/// Simplify a closed curve to a polygon whose edges stay within `epsilon` of
/// the original points.
///
/// The curve is split at two mutually distant anchor vertices, each half is
/// reduced with Douglas-Peucker, and a final sweep drops vertices that sit
/// within `epsilon` of the chord between their neighbours. The result starts
/// at the first anchor and keeps the input's winding.
pub fn approximate_closed_polygon(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n <= 3 {
        return points.to_vec();
    }

    let mut a = 0;
    let mut b = farthest_from(points, a);
    for _ in 1..ANCHOR_ROUNDS {
        let next = farthest_from(points, b);
        if next == a {
            break;
        }
        a = b;
        b = next;
    }
    if a == b {
        return vec![points[a]];
    }

    let mut keep = vec![false; n];
    keep[a] = true;
    keep[b] = true;
    simplify_chain(points, a, b, epsilon, &mut keep);
    simplify_chain(points, b, a, epsilon, &mut keep);

    let mut polygon: Vec<Point> = (0..n)
        .map(|offset| (a + offset) % n)
        .filter(|&i| keep[i])
        .map(|i| points[i])
        .collect();

    // Collinear clean-up.
    let mut changed = true;
    while changed && polygon.len() > 3 {
        changed = false;
        let len = polygon.len();
        for i in 0..len {
            let prev = polygon[(i + len - 1) % len];
            let next = polygon[(i + 1) % len];
            if distance_to_line(polygon[i], prev, next) <= epsilon {
                polygon.remove(i);
                changed = true;
                break;
            }
        }
    }

    polygon
}
