// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detector and rectifier configuration.

use std::path::Path;

use image::imageops::FilterType;
use imageproc::geometric_transformations::Interpolation;
use serde::{Deserialize, Serialize};

use crate::error::{RectifyError, Result};
use crate::types::AreaThreshold;

/// Resampling filter used when downscaling for detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Pixel interpolation used by the perspective warp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationKind {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
}

impl From<InterpolationKind> for Interpolation {
    fn from(kind: InterpolationKind) -> Self {
        match kind {
            InterpolationKind::Nearest => Interpolation::Nearest,
            InterpolationKind::Bilinear => Interpolation::Bilinear,
            InterpolationKind::Bicubic => Interpolation::Bicubic,
        }
    }
}

/// How four unordered vertices are labelled top-left .. bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerOrdering {
    /// Split at the centroid's y into a top and a bottom pair, then order each
    /// pair by x. Only defined while each half holds exactly two vertices,
    /// which holds for documents rotated less than about 45 degrees.
    #[default]
    CentroidSplit,
    /// Sort by angle around the centroid and start at the vertex with the
    /// smallest `x + y`. Works for any rotation of a convex quadrilateral.
    AngularSort,
}

/// One level per distinct 8-bit threshold.
pub const MAX_THRESHOLD_LEVELS: u32 = 255;

/// Tunables for the rectangle search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Longest side of the working image, in pixels.
    pub target_max_dimension: u32,
    pub resample_filter: ResampleFilter,
    /// Median blur window side; must be odd.
    pub median_kernel_size: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Side of the square structuring element applied after Canny; must be odd.
    pub dilation_kernel_size: u32,
    /// Number of threshold levels per channel. Level 0 is the Canny pass.
    pub threshold_levels: u32,
    /// Douglas-Peucker epsilon as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// Candidates whose largest `|cos|` interior angle reaches this are rejected.
    pub max_cosine: f64,
    /// Area bounds used by `find_rectangle_with_defaults`.
    pub area: AreaThreshold,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            target_max_dimension: 600,
            resample_filter: ResampleFilter::Triangle,
            median_kernel_size: 9,
            canny_low: 0.0,
            canny_high: 50.0,
            dilation_kernel_size: 3,
            threshold_levels: 5,
            approx_epsilon_ratio: 0.02,
            max_cosine: 0.3,
            area: AreaThreshold::default(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_max_dimension == 0 {
            return Err(invalid("target_max_dimension must be positive"));
        }
        if self.median_kernel_size == 0 || self.median_kernel_size % 2 == 0 {
            return Err(invalid(format!(
                "median_kernel_size must be odd, got {}",
                self.median_kernel_size
            )));
        }
        // The morphology radius is a u8 in imageproc.
        if self.dilation_kernel_size % 2 == 0 || self.dilation_kernel_size > 511 {
            return Err(invalid(format!(
                "dilation_kernel_size must be odd and at most 511, got {}",
                self.dilation_kernel_size
            )));
        }
        if self.threshold_levels == 0 || self.threshold_levels > MAX_THRESHOLD_LEVELS {
            return Err(invalid(format!(
                "threshold_levels must lie in 1..={}, got {}",
                MAX_THRESHOLD_LEVELS, self.threshold_levels
            )));
        }
        if !(self.canny_low >= 0.0 && self.canny_high > 0.0 && self.canny_high.is_finite())
            || self.canny_low > self.canny_high
        {
            return Err(invalid(format!(
                "canny thresholds must satisfy 0 <= low <= high and high > 0, got {}..{}",
                self.canny_low, self.canny_high
            )));
        }
        if !(self.approx_epsilon_ratio > 0.0 && self.approx_epsilon_ratio.is_finite()) {
            return Err(invalid(format!(
                "approx_epsilon_ratio must be positive, got {}",
                self.approx_epsilon_ratio
            )));
        }
        if !(self.max_cosine > 0.0 && self.max_cosine <= 1.0) {
            return Err(invalid(format!(
                "max_cosine must lie in (0, 1], got {}",
                self.max_cosine
            )));
        }
        self.area.validate()
    }

    /// Lower hysteresis bound handed to Canny. Weak edges must be strictly
    /// above `canny_low`, so a zero bound becomes the smallest positive value
    /// and flat regions never join an edge.
    pub fn canny_low_threshold(&self) -> f32 {
        self.canny_low.max(f32::MIN_POSITIVE)
    }

    /// Median filter radius derived from the kernel size.
    pub fn median_radius(&self) -> u32 {
        self.median_kernel_size / 2
    }

    /// Chebyshev dilation radius derived from the kernel size.
    pub fn dilation_radius(&self) -> u8 {
        (self.dilation_kernel_size / 2) as u8
    }
}

/// Tunables for corner ordering and the perspective warp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifierConfig {
    pub corner_ordering: CornerOrdering,
    pub interpolation: InterpolationKind,
}

/// Complete pipeline settings, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detector: DetectorConfig,
    pub rectifier: RectifierConfig,
}

impl ScanConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.detector.validate()
    }
}

fn invalid(msg: impl Into<String>) -> RectifyError {
    RectifyError::InvalidConfig(msg.into())
}
