//! Flow-rate test tower
//!
//! Prints one cylinder segment per volumetric flow rate. Each segment is
//! labelled with its flow rate as relief on the wall, printed at the feed
//! rate that produces that flow, and closed with a plain rim layer.

use crate::cylinder_tracer::{CylinderTracer, TraceSummary, TracerSettings};
use crate::emitter::{MotionEmitter, PrintHead, RapidMove};
use crate::error::{ToolpathError, ToolpathResult};
use crate::extrusion::ProcessParameters;
use crate::gcode_writer::{write_gcode_file, GcodeWriter};
use crate::label::LabelRasterizer;
use image::GrayImage;
use rasterwrap_core::units::format_coordinate;
use rasterwrap_core::{ParameterError, ParameterResult, VolumetricFlow};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Tower layout and firmware header
#[derive(Debug, Clone, PartialEq)]
pub struct FlowTowerParameters {
    /// Flow rates, one segment each, bottom segment first
    pub flow_rates: Vec<VolumetricFlow>,
    /// Height of each segment in mm
    pub segment_height: f64,
    /// Part cooling fan speed set at the start of each segment
    pub fan_speed: u8,
    /// Value of the `;FLAVOR:` header line
    pub flavor: String,
}

impl Default for FlowTowerParameters {
    fn default() -> Self {
        Self {
            flow_rates: (7..=10).map(|f| VolumetricFlow(f as f64)).collect(),
            segment_height: 10.0,
            fan_speed: 255,
            flavor: "UltiGCode".to_string(),
        }
    }
}

impl FlowTowerParameters {
    pub fn validate(&self) -> ParameterResult<()> {
        if self.flow_rates.is_empty() {
            return Err(ParameterError::Incompatible(
                "at least one flow rate is required".to_string(),
            ));
        }
        for flow in &self.flow_rates {
            ParameterError::check_positive("flow_rate", flow.0)?;
        }
        ParameterError::check_positive("segment_height", self.segment_height)?;
        Ok(())
    }

    /// Label height in grid rows
    pub fn rows_per_segment(&self, layer_height: f64) -> u32 {
        (self.segment_height / layer_height).floor() as u32
    }

    /// Traced layers per segment, rim excluded
    pub fn layers_per_segment(&self, layer_height: f64) -> u32 {
        (self.segment_height / layer_height).ceil() as u32
    }
}

/// What each segment carries on its wall
pub enum SegmentSource {
    /// The segment's own flow rate, rendered as text
    Labels(Box<dyn LabelRasterizer>),
    /// One image traced on every segment
    Image(GrayImage),
}

impl SegmentSource {
    pub fn labels<R: LabelRasterizer + 'static>(rasterizer: R) -> Self {
        Self::Labels(Box::new(rasterizer))
    }
}

/// Generates a complete flow tower program
pub struct FlowTowerGenerator {
    process: ProcessParameters,
    tracer: TracerSettings,
    tower: FlowTowerParameters,
    source: SegmentSource,
}

impl FlowTowerGenerator {
    pub fn new(
        process: ProcessParameters,
        tracer: TracerSettings,
        tower: FlowTowerParameters,
        source: SegmentSource,
    ) -> ParameterResult<Self> {
        tower.validate()?;
        // checks the process/tracer combination
        CylinderTracer::new(process, tracer)?;
        Ok(Self {
            process,
            tracer,
            tower,
            source,
        })
    }

    /// Label height in grid rows
    pub fn rows_per_segment(&self) -> u32 {
        self.tower.rows_per_segment(self.process.layer_height)
    }

    /// Traced layers per segment, rim excluded
    pub fn layers_per_segment(&self) -> u32 {
        self.tower.layers_per_segment(self.process.layer_height)
    }

    /// Text printed on a segment
    pub fn segment_label(flow: VolumetricFlow) -> String {
        flow.to_string()
    }

    /// Grid traced for the segment at `flow`
    pub fn segment_grid(&self, flow: VolumetricFlow) -> ToolpathResult<Cow<'_, GrayImage>> {
        match &self.source {
            SegmentSource::Image(image) => Ok(Cow::Borrowed(image)),
            SegmentSource::Labels(rasterizer) => {
                let label = Self::segment_label(flow);
                let grid = rasterizer.rasterize(&label, self.rows_per_segment())?;
                Ok(Cow::Owned(grid))
            }
        }
    }

    fn write_header<E: MotionEmitter>(&self, head: &mut PrintHead<E>) -> ToolpathResult<()> {
        head.raw(&format!(";FLAVOR:{}", self.tower.flavor))?;
        head.raw(";TIME:0")?;
        head.raw(";MATERIAL:1")?;
        head.raw(";MATERIAL2:0")?;
        head.raw(&format!(
            ";NOZZLE_DIAMETER:{}",
            format_coordinate(self.process.nozzle_width, 4)
        ))?;
        head.comment("Flow rate test tower")?;
        head.comment(&format!(
            "Generated: {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ))?;
        let rates: Vec<String> = self
            .tower
            .flow_rates
            .iter()
            .map(|f| format_coordinate(f.0, 3))
            .collect();
        head.comment(&format!("Flow rates: {} mm^3/s", rates.join(", ")))?;
        Ok(())
    }

    /// Emit the whole tower through `head`, reporting progress from 0 to 1
    pub fn generate_with_progress<E, F>(
        &self,
        head: &mut PrintHead<E>,
        mut progress_callback: F,
    ) -> ToolpathResult<TraceSummary>
    where
        E: MotionEmitter,
        F: FnMut(f32),
    {
        let mut tracer = CylinderTracer::new(self.process, self.tracer)?;
        let mut summary = TraceSummary::default();
        let segments = self.tower.flow_rates.len();

        progress_callback(0.0);
        self.write_header(head)?;
        head.rapid(RapidMove::to(tracer.start_point()))?;

        for (index, flow) in self.tower.flow_rates.iter().copied().enumerate() {
            head.fan_speed(self.tower.fan_speed)?;
            head.comment(&format!("{} mm^3/s", format_coordinate(flow.0, 3)))?;
            let feed_rate = flow.feed_rate(self.process.layer_height, self.process.nozzle_width)?;
            head.rapid(RapidMove::feed(feed_rate))?;

            let grid = self.segment_grid(flow)?;
            let mut layers = self.layers_per_segment();
            if layers > grid.height() {
                warn!(
                    "Segment {} has {} rows for {} layers, tracing {} layers",
                    flow,
                    grid.height(),
                    layers,
                    grid.height()
                );
                layers = grid.height();
            }

            summary += tracer.trace_grid(&*grid, layers, head)?;
            summary += tracer.trace_rim(head)?;

            info!(
                "Segment {}/{} at {} ({:.0} mm/min): {} layers, E={:.3}",
                index + 1,
                segments,
                flow,
                feed_rate,
                layers + 1,
                summary.extrusion
            );
            progress_callback((index + 1) as f32 / segments as f32);
        }

        Ok(summary)
    }

    /// Emit the whole tower through any emitter
    pub fn generate_into<E: MotionEmitter>(&self, emitter: E) -> ToolpathResult<(E, TraceSummary)> {
        let mut head = PrintHead::new(self.process, emitter)?;
        let summary = self.generate_with_progress(&mut head, |_| {})?;
        Ok((head.into_emitter(), summary))
    }

    /// Generate the tower program as a string
    pub fn generate(&self) -> ToolpathResult<String> {
        let (writer, _) = self.generate_into(GcodeWriter::new(Vec::new()))?;
        String::from_utf8(writer.finish()?)
            .map_err(|e| ToolpathError::GenerationFailed(e.to_string()))
    }

    /// Generate the tower program into a sink
    pub fn generate_to_writer<W: Write>(&self, out: W) -> ToolpathResult<(W, TraceSummary)> {
        let (writer, summary) = self.generate_into(GcodeWriter::new(out))?;
        Ok((writer.finish()?, summary))
    }

    /// Generate the tower program into a file, closing it on every path
    pub fn generate_to_file<P: AsRef<Path>>(&self, path: P) -> ToolpathResult<TraceSummary> {
        write_gcode_file(path, |writer| {
            let mut head = PrintHead::new(self.process, writer)?;
            self.generate_with_progress(&mut head, |_| {})
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{Instruction, InstructionLog};
    use crate::extrusion::ExtrusionMode;
    use crate::label::BlockLabelRasterizer;

    fn generator_with(source: SegmentSource) -> FlowTowerGenerator {
        let process = ProcessParameters::new(0.4, 0.25, ExtrusionMode::Volumetric).unwrap();
        FlowTowerGenerator::new(
            process,
            TracerSettings::default(),
            FlowTowerParameters::default(),
            source,
        )
        .unwrap()
    }

    fn generator() -> FlowTowerGenerator {
        generator_with(SegmentSource::labels(BlockLabelRasterizer::default()))
    }

    #[test]
    fn test_segment_dimensions() {
        let g = generator();
        assert_eq!(g.rows_per_segment(), 40);
        assert_eq!(g.layers_per_segment(), 40);
        assert_eq!(
            FlowTowerGenerator::segment_label(VolumetricFlow(7.0)),
            "7 mm³/s"
        );
        let grid = g.segment_grid(VolumetricFlow(10.0)).unwrap();
        assert_eq!(grid.dimensions(), (8 * 4, 40));
    }

    #[test]
    fn test_layer_numbering_across_segments() {
        let g = generator();
        let (log, summary) = g.generate_into(InstructionLog::new()).unwrap();

        // 4 segments of 40 traced layers plus one rim each
        assert_eq!(summary.layers, 4 * 41);

        let layer_comments: Vec<&String> = log
            .instructions()
            .iter()
            .filter_map(|i| match i {
                Instruction::Comment(c) if c.starts_with("LAYER ") => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(layer_comments.len(), 160);
        assert_eq!(layer_comments[0], "LAYER 1");
        assert_eq!(layer_comments[39], "LAYER 40");
        // the rim takes layer 41
        assert_eq!(layer_comments[40], "LAYER 42");
    }

    #[test]
    fn test_segment_preamble() {
        let g = generator();
        let (log, _) = g.generate_into(InstructionLog::new()).unwrap();
        let instructions = log.instructions();

        let first_fan = instructions
            .iter()
            .position(|i| matches!(i, Instruction::FanSpeed(255)))
            .unwrap();
        assert_eq!(
            instructions[first_fan + 1],
            Instruction::Comment("7 mm^3/s".to_string())
        );
        assert_eq!(
            instructions[first_fan + 2],
            Instruction::Rapid(RapidMove::feed(4200.0))
        );
        assert_eq!(
            instructions[first_fan - 1],
            Instruction::Rapid(RapidMove::to(rasterwrap_core::Point2::new(141.5, 111.5)))
        );
    }

    #[test]
    fn test_image_source_clamps_layers() {
        let g = generator_with(SegmentSource::Image(GrayImage::new(20, 10)));
        let (_, summary) = g.generate_into(InstructionLog::new()).unwrap();
        assert_eq!(summary.layers, 4 * 11);
    }

    #[test]
    fn test_invalid_tower() {
        let process = ProcessParameters::new(0.4, 0.25, ExtrusionMode::Volumetric).unwrap();
        let tower = FlowTowerParameters {
            flow_rates: Vec::new(),
            ..Default::default()
        };
        assert!(FlowTowerGenerator::new(
            process,
            TracerSettings::default(),
            tower,
            SegmentSource::labels(BlockLabelRasterizer::default())
        )
        .is_err());
    }

    #[test]
    fn test_segment_rows_round_down_layers_round_up() {
        let tower = FlowTowerParameters {
            segment_height: 1.1,
            ..Default::default()
        };
        assert_eq!(tower.rows_per_segment(0.25), 4);
        assert_eq!(tower.layers_per_segment(0.25), 5);
    }

    #[test]
    fn test_image_source_ignores_labels() {
        let mut logo = GrayImage::new(12, 40);
        logo.put_pixel(0, 0, image::Luma([90]));
        let g = generator_with(SegmentSource::Image(logo.clone()));
        let grid = g.segment_grid(VolumetricFlow(7.0)).unwrap();
        assert!(matches!(grid, Cow::Borrowed(_)));
        assert_eq!(*grid, logo);
    }

    #[test]
    fn test_extrusion_grows_across_segments() {
        let g = generator();
        let (log, summary) = g.generate_into(InstructionLog::new()).unwrap();
        let mut last = 0.0;
        for p in log.extrusions() {
            assert!(p.extrusion >= last);
            last = p.extrusion;
        }
        assert_eq!(last, summary.extrusion);
        assert_eq!(summary.points, log.extrusion_count());
    }
}
