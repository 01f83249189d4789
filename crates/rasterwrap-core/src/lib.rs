//! # rasterwrap Core
//!
//! Core types and utilities shared by the rasterwrap crates.
//! Provides planar geometry, parameter errors and flow conversions.

pub mod error;
pub mod geometry;
pub mod units;

pub use error::{ParameterError, ParameterResult};
pub use geometry::Point2;
pub use units::VolumetricFlow;
