// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rectify-document — Document scanning for Rectify.
//
// Provides the scanning pipeline (find the largest document-like quadrilateral
// in a photo, then flatten it with a perspective warp) and an image processor
// for loading, masking, annotating, shrinking and encoding images around it.

pub mod image;
pub mod scan;

// Re-export the primary structs so callers can use `rectify_document::RectangleDetector` etc.
pub use image::processor::{ImageProcessor, MaskRegion};
pub use scan::detect::RectangleDetector;
pub use scan::rectify::PerspectiveRectifier;
