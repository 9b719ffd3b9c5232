// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectify — Core geometry types, configuration and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod types;

pub use config::{
    CornerOrdering, DetectorConfig, InterpolationKind, MAX_THRESHOLD_LEVELS, RectifierConfig, ResampleFilter,
    ScanConfig,
};
pub use error::{RectifyError, Result};
pub use types::*;
