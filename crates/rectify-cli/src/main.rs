// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectify — command-line document scanner.
//
// Entry point. Initialises logging, resolves the scan configuration and runs
// the requested subcommand.

mod args;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use image::Rgba;
use rectify_core::{AreaThreshold, OrderedQuadrilateral, Point, Quadrilateral, ScanConfig};
use rectify_document::{ImageProcessor, MaskRegion, PerspectiveRectifier, RectangleDetector};
use serde::Serialize;

use args::{Args, Command};

/// Exit status when no document outline is found.
const EXIT_NOT_FOUND: u8 = 2;

const OVERLAY_COLOR: Rgba<u8> = Rgba([0, 200, 0, 255]);
const OVERLAY_THICKNESS: u32 = 3;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "rectify failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = resolve_config(&args)?;

    match args.command {
        Command::Detect {
            input,
            overlay,
            all,
        } => detect(&config, &input, overlay.as_deref(), all),
        Command::Scan {
            input,
            output,
            mask,
            max_dimension,
        } => scan(&config, &input, &output, mask, max_dimension),
        Command::Config => {
            println!("{}", config.to_json_pretty()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load the config file (or defaults), then apply command-line area overrides.
fn resolve_config(args: &Args) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ScanConfig::default(),
    };

    if let Some(lower) = args.area_lower {
        config.detector.area.lower = lower;
    }
    if let Some(upper) = args.area_upper {
        config.detector.area.upper = upper;
    }
    config.validate().context("invalid scan configuration")?;
    Ok(config)
}

/// JSON shape printed by `rectify detect`.
#[derive(Debug, Serialize)]
struct DetectedOutline {
    area: f64,
    vertices: [Point; 4],
    /// `None` when the corners cannot be labelled with the configured strategy.
    corners: Option<OrderedQuadrilateral>,
}

impl DetectedOutline {
    fn new(quad: &Quadrilateral, rectifier: &PerspectiveRectifier) -> Self {
        Self {
            area: quad.area(),
            vertices: *quad.vertices(),
            corners: rectifier.order_corners(quad).ok(),
        }
    }
}

fn detect(config: &ScanConfig, input: &Path, overlay: Option<&Path>, all: bool) -> Result<ExitCode> {
    let detector = RectangleDetector::new(config.detector.clone())?;
    let rectifier = PerspectiveRectifier::new(config.rectifier);
    let area: AreaThreshold = config.detector.area;
    let processor = ImageProcessor::open(input)?;

    let (found, candidates) = if all || overlay.is_some() {
        let candidates = detector.find_candidates(processor.as_dynamic(), area)?;
        (largest_outline(&candidates), candidates)
    } else {
        (detector.find_rectangle(processor.as_dynamic(), area)?, Vec::new())
    };

    let json = if all {
        let outlines: Vec<DetectedOutline> = candidates
            .iter()
            .map(|quad| DetectedOutline::new(quad, &rectifier))
            .collect();
        serde_json::to_string_pretty(&outlines)?
    } else {
        let outline = found.as_ref().map(|quad| DetectedOutline::new(quad, &rectifier));
        serde_json::to_string_pretty(&outline)?
    };
    println!("{json}");

    if let Some(path) = overlay {
        processor
            .draw_outlines(&candidates, OVERLAY_COLOR, OVERLAY_THICKNESS)
            .save(path)
            .with_context(|| format!("failed to write overlay to {}", path.display()))?;
        tracing::info!(path = %path.display(), count = candidates.len(), "Overlay written");
    }

    Ok(if found.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_NOT_FOUND)
    })
}

/// Largest candidate by area; the first wins ties, matching `find_rectangle`.
fn largest_outline(candidates: &[Quadrilateral]) -> Option<Quadrilateral> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(current) if current.area() >= candidate.area() => Some(current),
        _ => Some(*candidate),
    })
}

fn scan(
    config: &ScanConfig,
    input: &Path,
    output: &Path,
    mask: bool,
    max_dimension: Option<u32>,
) -> Result<ExitCode> {
    let detector = RectangleDetector::new(config.detector.clone())?;
    let rectifier = PerspectiveRectifier::new(config.rectifier);
    let photo = ImageProcessor::open(input)?.into_dynamic();

    let Some(quad) = detector.find_rectangle(&photo, config.detector.area)? else {
        eprintln!("no document found in {}", input.display());
        return Ok(ExitCode::from(EXIT_NOT_FOUND));
    };

    let flat = rectifier
        .rectify(&photo, &quad)
        .with_context(|| format!("failed to rectify {}", input.display()))?;

    let mut page = ImageProcessor::from_dynamic(flat);
    if mask {
        page = page.mask_region(MaskRegion::default());
    }
    if let Some(limit) = max_dimension {
        page = page.fit_within(limit);
    }
    page.save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(
        output = %output.display(),
        width = page.width(),
        height = page.height(),
        "Rectified page saved"
    );
    Ok(ExitCode::SUCCESS)
}
