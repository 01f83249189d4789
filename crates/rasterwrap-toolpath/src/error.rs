//! Error types for the toolpath crate.
//!
//! This module provides structured error types for tracing, G-code output,
//! image loading and label rendering.

use rasterwrap_core::ParameterError;
use std::io;
use thiserror::Error;

/// Errors that can occur while producing a toolpath.
#[derive(Error, Debug)]
pub enum ToolpathError {
    /// A parameter or grid precondition was violated.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// The intensity image could not be loaded.
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// A label could not be rendered.
    #[error("Label error: {0}")]
    Label(#[from] LabelError),

    /// G-code generation failed.
    #[error("G-code generation failed: {0}")]
    GenerationFailed(String),

    /// I/O error while writing the output destination.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Errors related to rasterizing text labels.
#[derive(Error, Debug)]
pub enum LabelError {
    /// No font matched the requested family.
    #[error("Font not found: {0}")]
    FontNotFound(String),

    /// The font data could not be parsed.
    #[error("Invalid font data: {0}")]
    InvalidFont(String),

    /// The label text renders to nothing.
    #[error("Label '{0}' has no visible glyphs")]
    EmptyLabel(String),

    /// I/O error while reading a font file.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Result type alias for toolpath operations.
pub type ToolpathResult<T> = Result<T, ToolpathError>;

/// Result type alias for label rendering.
pub type LabelResult<T> = Result<T, LabelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolpath_error_display() {
        let err = ToolpathError::GenerationFailed("empty grid".to_string());
        assert_eq!(err.to_string(), "G-code generation failed: empty grid");

        let err: ToolpathError = ParameterError::Incompatible("x".to_string()).into();
        assert_eq!(err.to_string(), "Parameter error: Incompatible parameters: x");
    }

    #[test]
    fn test_label_error_display() {
        let err = LabelError::FontNotFound("Consolas".to_string());
        assert_eq!(err.to_string(), "Font not found: Consolas");

        let err = LabelError::EmptyLabel(" ".to_string());
        assert_eq!(err.to_string(), "Label ' ' has no visible glyphs");
    }

    #[test]
    fn test_error_conversion() {
        let label_err = LabelError::InvalidFont("truncated".to_string());
        let err: ToolpathError = label_err.into();
        assert!(matches!(err, ToolpathError::Label(_)));

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: ToolpathError = io_err.into();
        assert!(matches!(err, ToolpathError::IoError(_)));

        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing font");
        let err: LabelError = io_err.into();
        assert!(matches!(err, LabelError::IoError(_)));
    }
}
