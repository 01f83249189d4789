//! Motion emission
//!
//! The tracer never formats output itself. It drives a [`PrintHead`], which
//! pairs the [`ExtrusionAccountant`] with a [`MotionEmitter`] so that every
//! extrusion target is accounted for before it is written.

use crate::extrusion::{ExtrusionAccountant, MotionPoint, ProcessParameters, ToolState};
use rasterwrap_core::{ParameterResult, Point2};
use std::io;

/// A positioning move; only the supplied fields are emitted
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RapidMove {
    /// Target X
    pub x: Option<f64>,
    /// Target Y
    pub y: Option<f64>,
    /// Target Z
    pub z: Option<f64>,
    /// Feed rate in mm/min
    pub feed_rate: Option<f64>,
}

impl RapidMove {
    /// Move to a planar point
    pub fn to(point: Point2) -> Self {
        Self {
            x: Some(point.x),
            y: Some(point.y),
            ..Default::default()
        }
    }

    /// Change height only
    pub fn z(z: f64) -> Self {
        Self {
            z: Some(z),
            ..Default::default()
        }
    }

    /// Change feed rate only
    pub fn feed(feed_rate: f64) -> Self {
        Self {
            feed_rate: Some(feed_rate),
            ..Default::default()
        }
    }

    /// Add a feed rate to this move
    pub fn with_feed(mut self, feed_rate: f64) -> Self {
        self.feed_rate = Some(feed_rate);
        self
    }

    /// True if no field is set
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none() && self.feed_rate.is_none()
    }
}

/// Sink for motion instructions, written in strict call order
pub trait MotionEmitter {
    /// Emit a positioning move
    fn rapid(&mut self, mv: &RapidMove) -> io::Result<()>;

    /// Emit an extrusion move to `point`
    fn extrude(&mut self, point: &MotionPoint) -> io::Result<()>;

    /// Emit a comment line
    fn comment(&mut self, text: &str) -> io::Result<()>;

    /// Set the part cooling fan speed (0-255)
    fn fan_speed(&mut self, speed: u8) -> io::Result<()>;

    /// Emit a line verbatim
    fn raw(&mut self, line: &str) -> io::Result<()>;
}

impl<T: MotionEmitter + ?Sized> MotionEmitter for &mut T {
    fn rapid(&mut self, mv: &RapidMove) -> io::Result<()> {
        (**self).rapid(mv)
    }

    fn extrude(&mut self, point: &MotionPoint) -> io::Result<()> {
        (**self).extrude(point)
    }

    fn comment(&mut self, text: &str) -> io::Result<()> {
        (**self).comment(text)
    }

    fn fan_speed(&mut self, speed: u8) -> io::Result<()> {
        (**self).fan_speed(speed)
    }

    fn raw(&mut self, line: &str) -> io::Result<()> {
        (**self).raw(line)
    }
}

/// A recorded instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Positioning move
    Rapid(RapidMove),
    /// Extrusion move
    Extrude(MotionPoint),
    /// Comment
    Comment(String),
    /// Fan speed
    FanSpeed(u8),
    /// Verbatim line
    Raw(String),
}

/// In-memory emitter that keeps every instruction
#[derive(Debug, Clone, Default)]
pub struct InstructionLog {
    instructions: Vec<Instruction>,
}

impl InstructionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded instructions
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Recorded extrusion moves, in order
    pub fn extrusions(&self) -> impl Iterator<Item = &MotionPoint> {
        self.instructions.iter().filter_map(|i| match i {
            Instruction::Extrude(p) => Some(p),
            _ => None,
        })
    }

    /// Number of recorded extrusion moves
    pub fn extrusion_count(&self) -> usize {
        self.extrusions().count()
    }
}

impl MotionEmitter for InstructionLog {
    fn rapid(&mut self, mv: &RapidMove) -> io::Result<()> {
        self.instructions.push(Instruction::Rapid(*mv));
        Ok(())
    }

    fn extrude(&mut self, point: &MotionPoint) -> io::Result<()> {
        self.instructions.push(Instruction::Extrude(*point));
        Ok(())
    }

    fn comment(&mut self, text: &str) -> io::Result<()> {
        self.instructions.push(Instruction::Comment(text.to_string()));
        Ok(())
    }

    fn fan_speed(&mut self, speed: u8) -> io::Result<()> {
        self.instructions.push(Instruction::FanSpeed(speed));
        Ok(())
    }

    fn raw(&mut self, line: &str) -> io::Result<()> {
        self.instructions.push(Instruction::Raw(line.to_string()));
        Ok(())
    }
}

/// Extrusion accountant plus emitter, owned by one trace job
pub struct PrintHead<E: MotionEmitter> {
    accountant: ExtrusionAccountant,
    emitter: E,
    extrusion_moves: usize,
}

impl<E: MotionEmitter> PrintHead<E> {
    /// Create a print head at the origin with zero extrusion
    pub fn new(params: ProcessParameters, emitter: E) -> ParameterResult<Self> {
        Ok(Self {
            accountant: ExtrusionAccountant::new(params)?,
            emitter,
            extrusion_moves: 0,
        })
    }

    /// Process parameters in use
    pub fn params(&self) -> &ProcessParameters {
        self.accountant.params()
    }

    /// Current tool state
    pub fn state(&self) -> ToolState {
        self.accountant.state()
    }

    /// Number of extrusion moves emitted so far
    pub fn extrusion_moves(&self) -> usize {
        self.extrusion_moves
    }

    /// Borrow the emitter
    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Give back the emitter
    pub fn into_emitter(self) -> E {
        self.emitter
    }

    /// Emit a positioning move, tracking any planar change
    pub fn rapid(&mut self, mv: RapidMove) -> io::Result<()> {
        if mv.x.is_some() || mv.y.is_some() {
            let current = self.accountant.state().position;
            self.accountant.move_to(Point2::new(
                mv.x.unwrap_or(current.x),
                mv.y.unwrap_or(current.y),
            ));
        }
        self.emitter.rapid(&mv)
    }

    /// Account for and emit an extrusion move to `to`
    pub fn extrude_to(&mut self, to: Point2) -> io::Result<MotionPoint> {
        let point = self.accountant.extrude_to(to);
        self.emitter.extrude(&point)?;
        self.extrusion_moves += 1;
        Ok(point)
    }

    /// Emit a comment
    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        self.emitter.comment(text)
    }

    /// Set the fan speed
    pub fn fan_speed(&mut self, speed: u8) -> io::Result<()> {
        self.emitter.fan_speed(speed)
    }

    /// Emit a line verbatim
    pub fn raw(&mut self, line: &str) -> io::Result<()> {
        self.emitter.raw(line)
    }
}
