// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — document outline detection and perspective
// rectification.

pub mod detect;
pub mod rectify;

#[cfg(test)]
pub(crate) mod fixtures;

pub use detect::{RectangleDetector, is_rectangle};
pub use rectify::{PerspectiveRectifier, order_corners, perspective_transform};
