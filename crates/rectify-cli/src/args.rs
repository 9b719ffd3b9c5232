// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Find a document in a photo and flatten it.
#[derive(Parser, Debug)]
#[command(name = "rectify", author, version, about, long_about = None)]
pub struct Args {
    /// JSON scan configuration; missing fields take their defaults.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Minimum accepted outline area, as a ratio of the image area.
    #[arg(long, global = true, value_name = "RATIO")]
    pub area_lower: Option<f64>,

    /// Maximum accepted outline area, as a ratio of the image area.
    #[arg(long, global = true, value_name = "RATIO")]
    pub area_upper: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the detected document corners as JSON (`null` when none is found).
    Detect {
        /// Input photo.
        input: PathBuf,

        /// Write the input with candidate outlines drawn over it.
        #[arg(long, value_name = "PNG")]
        overlay: Option<PathBuf>,

        /// Print every accepted candidate instead of only the largest.
        #[arg(long)]
        all: bool,
    },

    /// Detect the document and save the rectified page.
    Scan {
        /// Input photo.
        input: PathBuf,

        /// Output image; the format follows the extension.
        output: PathBuf,

        /// Black out the upper-left region of the result.
        #[arg(long)]
        mask: bool,

        /// Shrink the result so neither side exceeds this many pixels.
        #[arg(long, value_name = "PIXELS")]
        max_dimension: Option<u32>,
    },

    /// Print the effective configuration as JSON.
    Config,
}
