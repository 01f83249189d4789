//! # rasterwrap Toolpath
//!
//! Turns 2D intensity grids into extrusion toolpaths on the wall of a
//! cylinder, one layer per grid row, and writes them as G-code.
//!
//! ## Pipeline
//!
//! - **Intensity Grid**: image or generated raster sampled by column and row
//! - **Cylinder Tracer**: walks the circumference, maps intensity to radius
//!   and decides which samples become points
//! - **Extrusion Accounting**: running `E` total in volumetric or filament
//!   length units
//! - **Emitter / G-code Writer**: motion instruction sink and its G-code form
//!
//! ## Drivers
//!
//! - **Flow Tower**: one labelled segment per volumetric flow rate
//! - **Label**: text rendering into grids with TrueType fonts

pub mod cylinder_tracer;
pub mod emitter;
pub mod error;
pub mod extrusion;
pub mod flow_tower;
pub mod gcode_writer;
pub mod intensity_grid;
pub mod label;

// Re-export commonly used items
pub use cylinder_tracer::{Band, CylinderTracer, TraceSummary, TracerSettings};
pub use emitter::{Instruction, InstructionLog, MotionEmitter, PrintHead, RapidMove};
pub use error::{LabelError, LabelResult, ToolpathError, ToolpathResult};
pub use extrusion::{
    ExtrusionAccountant, ExtrusionMode, MotionPoint, ProcessParameters, ToolState,
};
pub use flow_tower::{FlowTowerGenerator, FlowTowerParameters, SegmentSource};
pub use gcode_writer::{write_gcode_file, GcodeWriter};
pub use intensity_grid::{
    grid_from_image, load_grid, GridTransformations, IntensityGrid, RasterGrid,
};
pub use label::{BlockLabelRasterizer, FontLabelRasterizer, FontSource, LabelRasterizer};
