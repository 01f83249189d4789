//! Unit conversion utilities
//!
//! Handles conversion between volumetric flow (mm³/s) and linear feed rate
//! for a given deposited bead cross-section.

use crate::error::{ParameterError, ParameterResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Volumetric flow rate in mm³/s
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumetricFlow(pub f64);

impl VolumetricFlow {
    /// Linear feed rate (mm/min) that deposits this flow through a
    /// rectangular bead of `layer_height` x `line_width`.
    pub fn feed_rate(self, layer_height: f64, line_width: f64) -> ParameterResult<f64> {
        ParameterError::check_positive("layer_height", layer_height)?;
        ParameterError::check_positive("line_width", line_width)?;
        Ok(self.0 / (layer_height * line_width) * 60.0)
    }
}

impl fmt::Display for VolumetricFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Whole numbers print without a fraction, like "7 mm³/s"
        if self.0.fract() == 0.0 {
            write!(f, "{:.0} mm³/s", self.0)
        } else {
            write!(f, "{} mm³/s", self.0)
        }
    }
}

/// Format a coordinate with at most `precision` decimals, trimming
/// trailing zeros ("12.500" becomes "12.5", "3.000" becomes "3").
pub fn format_coordinate(value: f64, precision: usize) -> String {
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flow_to_feed_rate() {
        // 7 mm³/s through 0.25 x 0.4 = 70 mm/s = 4200 mm/min
        let feed = VolumetricFlow(7.0).feed_rate(0.25, 0.4).unwrap();
        assert_relative_eq!(feed, 4200.0, epsilon = 1e-9);

        let feed = VolumetricFlow(10.0).feed_rate(0.25, 0.4).unwrap();
        assert_relative_eq!(feed, 6000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_flow_rejects_zero_bead() {
        assert!(VolumetricFlow(7.0).feed_rate(0.0, 0.4).is_err());
        assert!(VolumetricFlow(7.0).feed_rate(0.25, -0.4).is_err());
    }

    #[test]
    fn test_flow_display() {
        assert_eq!(VolumetricFlow(7.0).to_string(), "7 mm³/s");
        assert_eq!(VolumetricFlow(7.5).to_string(), "7.5 mm³/s");
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(format_coordinate(12.5, 3), "12.5");
        assert_eq!(format_coordinate(3.0, 3), "3");
        assert_eq!(format_coordinate(141.49999, 3), "141.5");
        assert_eq!(format_coordinate(0.123456, 5), "0.12346");
        assert_eq!(format_coordinate(-0.0001, 3), "0");
        assert_eq!(format_coordinate(4200.0, 0), "4200");
    }
}
