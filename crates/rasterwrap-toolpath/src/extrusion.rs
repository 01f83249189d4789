//! Extrusion accounting
//!
//! Converts planar travel into an extrusion quantity and keeps the running
//! total that the firmware receives in the `E` word. The deposited bead is
//! approximated as a rectangular prism of `nozzle_width` x `layer_height`
//! times the travelled length.

use rasterwrap_core::{ParameterError, ParameterResult, Point2};
use std::f64::consts::PI;

/// How the `E` axis is interpreted by the receiving firmware
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtrusionMode {
    /// `E` is a volume in mm³
    Volumetric,
    /// `E` is a length of filament of the given diameter (mm)
    LinearLength {
        /// Filament diameter in mm
        filament_diameter: f64,
    },
}

impl ExtrusionMode {
    /// Cross-sectional area of the filament, if the mode has one
    pub fn filament_area(&self) -> Option<f64> {
        match self {
            ExtrusionMode::Volumetric => None,
            ExtrusionMode::LinearLength { filament_diameter } => {
                Some(PI * (filament_diameter / 2.0).powi(2))
            }
        }
    }

    /// Convert a deposited volume into the quantity written to `E`
    pub fn quantity_for_volume(&self, volume: f64) -> f64 {
        match self.filament_area() {
            None => volume,
            Some(area) => volume / area,
        }
    }
}

/// Fixed process parameters for one print
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessParameters {
    /// Nozzle (extrusion line) width in mm
    pub nozzle_width: f64,
    /// Layer height in mm
    pub layer_height: f64,
    /// Extrusion accounting mode
    pub mode: ExtrusionMode,
}

impl ProcessParameters {
    /// Create validated process parameters
    pub fn new(nozzle_width: f64, layer_height: f64, mode: ExtrusionMode) -> ParameterResult<Self> {
        let params = Self {
            nozzle_width,
            layer_height,
            mode,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check that every value is finite and strictly positive
    pub fn validate(&self) -> ParameterResult<()> {
        ParameterError::check_positive("nozzle_width", self.nozzle_width)?;
        ParameterError::check_positive("layer_height", self.layer_height)?;
        if let ExtrusionMode::LinearLength { filament_diameter } = self.mode {
            ParameterError::check_positive("filament_diameter", filament_diameter)?;
        }
        Ok(())
    }

    /// Volume deposited over `length` mm of travel
    pub fn volume_for_length(&self, length: f64) -> f64 {
        self.nozzle_width * self.layer_height * length
    }

    /// `E` increment for `length` mm of travel
    pub fn extrusion_for_length(&self, length: f64) -> f64 {
        self.mode.quantity_for_volume(self.volume_for_length(length))
    }
}

/// Mutable tool state for the life of one trace
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToolState {
    /// Current planar position
    pub position: Point2,
    /// Cumulative extrusion quantity
    pub cumulative_extrusion: f64,
}

/// An emitted extrusion target with the cumulative `E` needed to reach it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPoint {
    /// Target position
    pub position: Point2,
    /// Cumulative extrusion after the move
    pub extrusion: f64,
}

/// Keeps the running extrusion total as the tool moves
#[derive(Debug, Clone)]
pub struct ExtrusionAccountant {
    params: ProcessParameters,
    state: ToolState,
}

impl ExtrusionAccountant {
    /// Create an accountant at the origin with zero extrusion
    pub fn new(params: ProcessParameters) -> ParameterResult<Self> {
        Self::with_state(params, ToolState::default())
    }

    /// Create an accountant resuming from an existing tool state
    pub fn with_state(params: ProcessParameters, state: ToolState) -> ParameterResult<Self> {
        params.validate()?;
        Ok(Self { params, state })
    }

    /// Process parameters in use
    pub fn params(&self) -> &ProcessParameters {
        &self.params
    }

    /// Current tool state
    pub fn state(&self) -> ToolState {
        self.state
    }

    /// Reposition without extruding (rapid move)
    pub fn move_to(&mut self, to: Point2) {
        self.state.position = to;
    }

    /// Extrude from the current position to `to`.
    ///
    /// Returns the increment added to the cumulative total. A zero-length
    /// segment is valid and adds nothing.
    pub fn accumulate(&mut self, to: Point2) -> f64 {
        debug_assert!(
            to.x.is_finite() && to.y.is_finite(),
            "extrusion target must be finite: {to:?}"
        );
        let length = self.state.position.distance_to(&to);
        let increment = self.params.extrusion_for_length(length);

        self.state.position = to;
        self.state.cumulative_extrusion += increment;
        increment
    }

    /// Extrude to `to` and return the resulting motion point
    pub fn extrude_to(&mut self, to: Point2) -> MotionPoint {
        self.accumulate(to);
        MotionPoint {
            position: to,
            extrusion: self.state.cumulative_extrusion,
        }
    }
}
