//! Cylindrical raster tracing
//!
//! Wraps an intensity grid around a cylinder wall. Each layer walks the
//! circumference at a fixed arc-length step of one layer height; inside the
//! image band the wall is pushed inwards in proportion to pixel intensity.
//! Samples with the same radius are merged into one extrusion move, bounded
//! by a maximum unemitted arc length, and every radius change gets a point on
//! both sides of the edge.

use crate::emitter::{MotionEmitter, PrintHead, RapidMove};
use crate::error::ToolpathResult;
use crate::extrusion::ProcessParameters;
use crate::intensity_grid::IntensityGrid;
use rasterwrap_core::{ParameterError, ParameterResult, Point2};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::ops::AddAssign;
use tracing::debug;

/// Tunable geometry of the cylinder and the image band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerSettings {
    /// Unperturbed cylinder radius (mm)
    pub base_radius: f64,
    /// Band centre as a fraction of the circumference (0.75 = 270°)
    pub band_center: f64,
    /// Longest arc length (mm) traversed without emitting a point
    pub max_gap: f64,
    /// Full-intensity relief depth in multiples of the nozzle width
    pub relief_factor: f64,
    /// Segments in the closing rim circle
    pub rim_segments: u32,
    /// Cylinder axis position on the bed
    pub center: Point2,
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            base_radius: 30.0,
            band_center: 0.75,
            max_gap: 2.0,
            relief_factor: 2.0,
            rim_segments: 100,
            center: Point2 { x: 111.5, y: 111.5 },
        }
    }
}

impl TracerSettings {
    /// Validate the settings on their own
    pub fn validate(&self) -> ParameterResult<()> {
        ParameterError::check_positive("base_radius", self.base_radius)?;
        ParameterError::check_range("band_center", self.band_center, 0.0, 1.0)?;
        ParameterError::check_positive("max_gap", self.max_gap)?;
        ParameterError::check_range("relief_factor", self.relief_factor, 0.0, f64::MAX)?;
        if !(self.center.x.is_finite() && self.center.y.is_finite()) {
            return Err(ParameterError::Incompatible(format!(
                "cylinder center must be finite, got {}",
                self.center
            )));
        }
        if self.rim_segments < 3 {
            return Err(ParameterError::OutOfRange {
                name: "rim_segments".to_string(),
                value: self.rim_segments as f64,
                min: 3.0,
                max: u32::MAX as f64,
            });
        }
        Ok(())
    }
}

/// Arc-length range where the image is sampled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// First arc-length position inside the band
    pub min_pos: f64,
    /// First arc-length position past the band
    pub max_pos: f64,
}

impl Band {
    /// True if `pos` lies in `[min_pos, max_pos)`
    pub fn contains(&self, pos: f64) -> bool {
        pos >= self.min_pos && pos < self.max_pos
    }
}

/// Counters for traced layers
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TraceSummary {
    /// Layers traced (rim passes included)
    pub layers: u32,
    /// Extrusion moves emitted
    pub points: usize,
    /// Cumulative extrusion at the end of the pass
    pub extrusion: f64,
}

impl AddAssign for TraceSummary {
    fn add_assign(&mut self, other: Self) {
        self.layers += other.layers;
        self.points += other.points;
        self.extrusion = other.extrusion;
    }
}

/// Traces intensity grids around a cylinder, one layer at a time.
///
/// Layer indices start at 1 and increase for every traced layer, including
/// rim passes, for the life of the tracer.
pub struct CylinderTracer {
    params: ProcessParameters,
    settings: TracerSettings,
    next_layer: u32,
}

impl CylinderTracer {
    /// Create a tracer for one job
    pub fn new(params: ProcessParameters, settings: TracerSettings) -> ParameterResult<Self> {
        params.validate()?;
        settings.validate()?;
        let depth = params.nozzle_width * settings.relief_factor;
        if depth >= settings.base_radius {
            return Err(ParameterError::Incompatible(format!(
                "relief depth {:.3} mm must be smaller than base radius {:.3} mm",
                depth, settings.base_radius
            )));
        }
        Ok(Self {
            params,
            settings,
            next_layer: 1,
        })
    }

    /// Tracer settings
    pub fn settings(&self) -> &TracerSettings {
        &self.settings
    }

    /// Index the next traced layer will get
    pub fn next_layer(&self) -> u32 {
        self.next_layer
    }

    /// Z height of a layer
    pub fn layer_z(&self, layer: u32) -> f64 {
        self.params.layer_height * layer as f64
    }

    /// Circumference of the unperturbed cylinder
    pub fn circumference(&self) -> f64 {
        TAU * self.settings.base_radius
    }

    /// Image band for a grid `width` columns wide
    pub fn band(&self, width: u32) -> Band {
        let length = self.params.layer_height * width as f64;
        let min_pos = self.circumference() * self.settings.band_center - length / 2.0;
        Band {
            min_pos,
            max_pos: min_pos + length,
        }
    }

    /// Wall radius for a pixel intensity
    pub fn radius_for(&self, intensity: u8) -> f64 {
        self.settings.base_radius
            - intensity as f64 / 255.0 * self.params.nozzle_width * self.settings.relief_factor
    }

    /// Check that `layers` layers of `grid` can be traced
    pub fn check_grid<G: IntensityGrid>(&self, grid: &G, layers: u32) -> ParameterResult<()> {
        if grid.width() == 0 || grid.height() == 0 {
            return Err(ParameterError::GridMismatch {
                reason: format!("grid is empty ({}x{})", grid.width(), grid.height()),
            });
        }
        if layers > grid.height() {
            return Err(ParameterError::GridMismatch {
                reason: format!(
                    "{} layers requested but grid has {} rows",
                    layers,
                    grid.height()
                ),
            });
        }
        let band = self.band(grid.width());
        let circumference = self.circumference();
        if band.min_pos < 0.0 || band.max_pos > circumference {
            return Err(ParameterError::GridMismatch {
                reason: format!(
                    "band of {} columns spans {:.3}..{:.3} mm, outside one revolution of {:.3} mm",
                    grid.width(),
                    band.min_pos,
                    band.max_pos,
                    circumference
                ),
            });
        }
        Ok(())
    }

    /// Points emitted for one layer sampling grid row `row`.
    ///
    /// The walk starts at angle 0 on the base radius and the last point is
    /// always at exactly 2π, closing the loop.
    pub fn plan_layer<G: IntensityGrid>(&self, grid: &G, row: u32) -> Vec<Point2> {
        let step = self.params.layer_height;
        let base = self.settings.base_radius;
        let circumference = self.circumference();
        let width = grid.width();
        let band = self.band(width);

        let mut points = Vec::new();
        let mut pos = 0.0;
        let mut prev_radius = base;
        let mut last_emit_pos = 0.0;

        while pos < circumference {
            let (radius, next_radius) = if width > 0 && band.contains(pos) {
                let column = (((pos - band.min_pos) / step) as u32).min(width - 1);
                let radius = self.radius_for(grid.get(column, row));
                // past the last column the wall returns to the base radius
                let next_radius = if column + 1 < width {
                    self.radius_for(grid.get(column + 1, row))
                } else {
                    base
                };
                (radius, next_radius)
            } else {
                (base, base)
            };

            pos += step;

            if radius != prev_radius
                || pos - last_emit_pos > self.settings.max_gap
                || pos >= circumference
                || next_radius != radius
            {
                let angle = (pos / circumference).min(1.0) * TAU;
                points.push(Point2::on_circle(self.settings.center, radius, angle));
                last_emit_pos = pos;
            }

            prev_radius = radius;
        }

        points
    }

    /// Points of the closing rim: `rim_segments + 1` points, first and last
    /// coincide, half a nozzle width inside the base radius.
    pub fn rim_points(&self) -> Vec<Point2> {
        let radius = self.settings.base_radius - self.params.nozzle_width / 2.0;
        let segments = self.settings.rim_segments;
        (0..=segments)
            .map(|k| {
                let angle = TAU / segments as f64 * k as f64;
                Point2::on_circle(self.settings.center, radius, angle)
            })
            .collect()
    }

    /// Where each layer starts: angle 0 on the base radius
    pub fn start_point(&self) -> Point2 {
        Point2::on_circle(self.settings.center, self.settings.base_radius, 0.0)
    }

    /// Trace `layers` layers of `grid`, bottom row first.
    ///
    /// Layer `j` of this pass samples row `height - j - 1`.
    pub fn trace_grid<G, E>(
        &mut self,
        grid: &G,
        layers: u32,
        head: &mut PrintHead<E>,
    ) -> ToolpathResult<TraceSummary>
    where
        G: IntensityGrid,
        E: MotionEmitter,
    {
        self.check_grid(grid, layers)?;
        let mut summary = TraceSummary::default();

        for offset in 0..layers {
            let layer = self.next_layer;
            let row = grid.height() - offset - 1;

            head.comment(&format!("LAYER {}", layer))?;
            head.rapid(RapidMove::z(self.layer_z(layer)))?;

            let points = self.plan_layer(grid, row);
            for point in &points {
                head.extrude_to(*point)?;
            }
            debug!(layer, row, points = points.len(), "Traced layer");

            self.next_layer += 1;
            summary.layers += 1;
            summary.points += points.len();
        }

        summary.extrusion = head.state().cumulative_extrusion;
        Ok(summary)
    }

    /// Trace one full circle with no image, as a closing rim
    pub fn trace_rim<E: MotionEmitter>(
        &mut self,
        head: &mut PrintHead<E>,
    ) -> ToolpathResult<TraceSummary> {
        let layer = self.next_layer;
        head.rapid(RapidMove::z(self.layer_z(layer)))?;

        let points = self.rim_points();
        for point in &points {
            head.extrude_to(*point)?;
        }
        debug!(layer, points = points.len(), "Traced rim");

        self.next_layer += 1;
        Ok(TraceSummary {
            layers: 1,
            points: points.len(),
            extrusion: head.state().cumulative_extrusion,
        })
    }
}
