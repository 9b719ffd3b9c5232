// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Rectify.
//
// "No document found" is deliberately absent: the detector reports it as
// `Ok(None)`, so every variant here is a genuine failure.

use thiserror::Error;

/// Top-level error type for all Rectify operations.
#[derive(Debug, Error)]
pub enum RectifyError {
    // -- Input errors --
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("invalid quadrilateral: {0}")]
    InvalidQuadrilateral(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Geometry --
    #[error("projective transform could not be solved: {0}")]
    Projection(String),

    // -- Codec / persistence --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RectifyError>;
