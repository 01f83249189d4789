//! # rasterwrap
//!
//! Wraps grayscale images around a cylinder as 3D printer extrusion
//! toolpaths. The stock job is a flow-rate test tower: one cylinder segment
//! per volumetric flow rate, each embossed with its own rate.
//!
//! ## Architecture
//!
//! rasterwrap is organized as a workspace with multiple crates:
//!
//! 1. **rasterwrap-core** - Geometry, parameter errors, flow/feed conversions
//! 2. **rasterwrap-toolpath** - Cylinder tracer, extrusion accounting, G-code output,
//!    labels and the flow tower driver
//! 3. **rasterwrap-settings** - Job configuration files
//! 4. **rasterwrap** - Command line binary that ties them together

pub use rasterwrap_core::{ParameterError, Point2, VolumetricFlow};
pub use rasterwrap_settings::{SettingsError, TowerConfig};
pub use rasterwrap_toolpath::{
    CylinderTracer, FlowTowerGenerator, ProcessParameters, SegmentSource, ToolpathError,
    TraceSummary, TracerSettings,
};

use anyhow::Context;
use rasterwrap_toolpath::{
    load_grid, write_gcode_file, BlockLabelRasterizer, FontLabelRasterizer, PrintHead,
};
use std::path::Path;
use tracing::{debug, info};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging on stderr with:
/// - RUST_LOG environment variable support
/// - INFO by default, DEBUG when `verbose`
/// - Pretty or JSON formatting
pub fn init_logging(verbose: bool, json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Load a config file, or the stock configuration when `path` is `None`
pub fn load_config(path: Option<&Path>) -> anyhow::Result<TowerConfig> {
    match path {
        Some(path) => TowerConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            debug!("No config file given, using defaults");
            Ok(TowerConfig::default())
        }
    }
}

/// What the tower's segments carry: the configured image, block labels or
/// text labels in the configured font
pub fn segment_source(config: &TowerConfig) -> anyhow::Result<SegmentSource> {
    let tower = &config.tower;
    if let Some(image) = &tower.image {
        let rows = tower
            .to_parameters()
            .rows_per_segment(config.process.layer_height);
        let grid = load_grid(image, &tower.grid_transformations(rows))
            .with_context(|| format!("Failed to load image file {}", image.display()))?;
        info!(
            "Tracing {} ({}x{}) on every segment",
            image.display(),
            grid.width(),
            grid.height()
        );
        return Ok(SegmentSource::Image(grid));
    }

    if tower.block_labels {
        debug!("Drawing labels as blocks");
        return Ok(SegmentSource::labels(BlockLabelRasterizer::default()));
    }

    let source = tower.font_source();
    let rasterizer = FontLabelRasterizer::from_source(&source)
        .with_context(|| format!("Failed to load label font {:?}", source))?;
    Ok(SegmentSource::labels(rasterizer))
}

/// Generate the tower described by `config` into `config.output.path`
pub fn generate(config: &TowerConfig) -> anyhow::Result<TraceSummary> {
    config.validate()?;
    generate_with(config, segment_source(config)?)
}

/// Generate with an explicit segment source
pub fn generate_with(config: &TowerConfig, source: SegmentSource) -> anyhow::Result<TraceSummary> {
    let process = config.process_parameters()?;
    let generator = FlowTowerGenerator::new(
        process,
        config.tracer,
        config.tower.to_parameters(),
        source,
    )?;

    let output = &config.output;
    let summary = write_gcode_file(&output.path, |writer| {
        writer.set_precision(output.coordinate_precision, output.extrusion_precision);
        let mut head = PrintHead::new(process, writer)?;
        generator.generate_with_progress(&mut head, |progress| {
            debug!("Progress: {:.0}%", progress * 100.0)
        })
    })
    .with_context(|| format!("Failed to write {}", output.path.display()))?;

    info!(
        "Wrote {}: {} layers, {} moves, final E {:.3}",
        output.path.display(),
        summary.layers,
        summary.points,
        summary.extrusion
    );
    Ok(summary)
}
