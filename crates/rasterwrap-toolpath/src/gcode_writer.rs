//! G-code output
//!
//! Formats motion instructions as `OPCODE K<value> ...` lines with fields in
//! call order. No line numbers, checksums or modal tracking: extrusion moves
//! always carry X, Y and E.

use crate::emitter::{MotionEmitter, RapidMove};
use crate::error::ToolpathResult;
use crate::extrusion::MotionPoint;
use rasterwrap_core::units::format_coordinate;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Decimal places used for X, Y, Z and F unless overridden
pub const DEFAULT_COORDINATE_PRECISION: usize = 4;
/// Decimal places used for E unless overridden
pub const DEFAULT_EXTRUSION_PRECISION: usize = 5;

/// G-code writer over any byte sink
pub struct GcodeWriter<W: Write> {
    out: W,
    coordinate_precision: usize,
    extrusion_precision: usize,
    lines_written: usize,
}

impl GcodeWriter<BufWriter<File>> {
    /// Open (create or truncate) a G-code file
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path.as_ref())?;
        debug!("Opened G-code output {}", path.as_ref().display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> GcodeWriter<W> {
    /// Wrap a sink with default precisions
    pub fn new(out: W) -> Self {
        Self {
            out,
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
            extrusion_precision: DEFAULT_EXTRUSION_PRECISION,
            lines_written: 0,
        }
    }

    /// Set the decimals written for X/Y/Z/F (`coordinate`) and E
    /// (`extrusion`). Applies to lines written after the call.
    pub fn set_precision(&mut self, coordinate: usize, extrusion: usize) {
        self.coordinate_precision = coordinate;
        self.extrusion_precision = extrusion;
    }

    /// Lines written so far
    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Write one line followed by a newline
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.lines_written += 1;
        Ok(())
    }

    /// Write an opcode with its already formatted fields
    pub fn write_code(&mut self, code: &str, fields: &[(char, String)]) -> io::Result<()> {
        let mut line = String::from(code);
        for (key, value) in fields {
            line.push(' ');
            line.push(*key);
            line.push_str(value);
        }
        self.write_line(&line)
    }

    /// Write a `; comment` line
    pub fn write_comment(&mut self, comment: &str) -> io::Result<()> {
        self.write_line(&format!("; {}", comment))
    }

    fn coord(&self, value: f64) -> String {
        format_coordinate(value, self.coordinate_precision)
    }

    /// Flush and hand back the sink
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> MotionEmitter for GcodeWriter<W> {
    fn rapid(&mut self, mv: &RapidMove) -> io::Result<()> {
        let mut fields = Vec::with_capacity(4);
        if let Some(x) = mv.x {
            fields.push(('X', self.coord(x)));
        }
        if let Some(y) = mv.y {
            fields.push(('Y', self.coord(y)));
        }
        if let Some(z) = mv.z {
            fields.push(('Z', self.coord(z)));
        }
        if let Some(f) = mv.feed_rate {
            fields.push(('F', self.coord(f)));
        }
        self.write_code("G0", &fields)
    }

    fn extrude(&mut self, point: &MotionPoint) -> io::Result<()> {
        let fields = [
            ('X', self.coord(point.position.x)),
            ('Y', self.coord(point.position.y)),
            (
                'E',
                format_coordinate(point.extrusion, self.extrusion_precision),
            ),
        ];
        self.write_code("G1", &fields)
    }

    fn comment(&mut self, text: &str) -> io::Result<()> {
        self.write_comment(text)
    }

    fn fan_speed(&mut self, speed: u8) -> io::Result<()> {
        self.write_code("M106", &[('S', speed.to_string())])
    }

    fn raw(&mut self, line: &str) -> io::Result<()> {
        self.write_line(line)
    }
}

/// Write a G-code file inside a scope.
///
/// The file is created before `body` runs and closed on every exit path.
/// On success the buffered output is flushed and flush errors are reported.
pub fn write_gcode_file<P, T, F>(path: P, body: F) -> ToolpathResult<T>
where
    P: AsRef<Path>,
    F: FnOnce(&mut GcodeWriter<BufWriter<File>>) -> ToolpathResult<T>,
{
    let mut writer = GcodeWriter::create(path.as_ref())?;
    let value = body(&mut writer)?;
    let lines = writer.lines_written();
    writer.finish()?;
    debug!("Closed G-code output after {} lines", lines);
    Ok(value)
}
