//! Tower configuration
//!
//! A single file describes a whole job. It is organized into sections:
//! - Process (nozzle, layer height, extrusion units)
//! - Tracer (cylinder geometry, band placement, point merging)
//! - Tower (flow rates, segment height, labels or image)
//! - Output (destination and number formatting)
//!
//! Every field has a default, so an empty file reproduces the stock
//! 7 to 10 mm³/s tower.

use crate::error::{ConfigError, SettingsError, SettingsResult};
use rasterwrap_core::{ParameterResult, VolumetricFlow};
use rasterwrap_toolpath::{
    CylinderTracer, ExtrusionMode, FlowTowerParameters, FontSource, GridTransformations,
    ProcessParameters, TracerSettings,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Largest number of decimals accepted for output fields
pub const MAX_PRECISION: usize = 10;

/// Extrusion process settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSettings {
    /// Nozzle (line) width in mm
    pub nozzle_width: f64,
    /// Layer height in mm
    pub layer_height: f64,
    /// Write `E` as volume (mm³) instead of filament length
    pub volumetric: bool,
    /// Filament diameter in mm, used when not volumetric
    pub filament_diameter: f64,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            nozzle_width: 0.4,
            layer_height: 0.25,
            volumetric: true,
            filament_diameter: 2.85,
        }
    }
}

impl ProcessSettings {
    pub fn extrusion_mode(&self) -> ExtrusionMode {
        if self.volumetric {
            ExtrusionMode::Volumetric
        } else {
            ExtrusionMode::LinearLength {
                filament_diameter: self.filament_diameter,
            }
        }
    }

    /// Validated process parameters
    pub fn to_parameters(&self) -> ParameterResult<ProcessParameters> {
        ProcessParameters::new(self.nozzle_width, self.layer_height, self.extrusion_mode())
    }
}

/// Flow tower layout and label settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerSettings {
    /// Flow rates in mm³/s, bottom segment first
    pub flow_rates: Vec<VolumetricFlow>,
    /// Segment height in mm
    pub segment_height: f64,
    /// Fan speed (0-255) set for every segment
    pub fan_speed: u8,
    /// `;FLAVOR:` header value
    pub flavor: String,
    /// System font family used for labels
    pub font_family: String,
    /// Font file used for labels, overrides `font_family`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_file: Option<PathBuf>,
    /// Image traced on every segment instead of the labels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    /// Invert image intensities
    pub invert_image: bool,
    /// Mirror the image horizontally
    pub mirror_image: bool,
    /// Draw labels as solid blocks instead of text, needs no font
    pub block_labels: bool,
}

impl Default for TowerSettings {
    fn default() -> Self {
        let tower = FlowTowerParameters::default();
        Self {
            flow_rates: tower.flow_rates,
            segment_height: tower.segment_height,
            fan_speed: tower.fan_speed,
            flavor: tower.flavor,
            font_family: "Monospace".to_string(),
            font_file: None,
            image: None,
            invert_image: false,
            mirror_image: false,
            block_labels: false,
        }
    }
}

impl TowerSettings {
    pub fn to_parameters(&self) -> FlowTowerParameters {
        FlowTowerParameters {
            flow_rates: self.flow_rates.clone(),
            segment_height: self.segment_height,
            fan_speed: self.fan_speed,
            flavor: self.flavor.clone(),
        }
    }

    /// True when labels are rendered from a font
    pub fn needs_font(&self) -> bool {
        self.image.is_none() && !self.block_labels
    }

    pub fn font_source(&self) -> FontSource {
        match &self.font_file {
            Some(path) => FontSource::File(path.clone()),
            None => FontSource::Family(self.font_family.clone()),
        }
    }

    /// Transformations for the segment image, resized to `rows` rows
    pub fn grid_transformations(&self, rows: u32) -> GridTransformations {
        GridTransformations {
            mirror_x: self.mirror_image,
            mirror_y: false,
            invert: self.invert_image,
            rows: Some(rows),
        }
    }
}

/// Output file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Destination G-code file
    pub path: PathBuf,
    /// Decimals written for X, Y, Z and F
    pub coordinate_precision: usize,
    /// Decimals written for E
    pub extrusion_precision: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("flow_tower.gcode"),
            coordinate_precision: 4,
            extrusion_precision: 5,
        }
    }
}

/// Complete job configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    pub process: ProcessSettings,
    pub tracer: TracerSettings,
    pub tower: TowerSettings,
    pub output: OutputSettings,
}

enum ConfigFormat {
    Json,
    Toml,
}

fn config_format(path: &Path) -> SettingsResult<ConfigFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("<none>").to_string()).into()),
    }
}

impl TowerConfig {
    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = config_format(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match config_format(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| SettingsError::SaveError(e.to_string()))?,
        };

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let process = self.process.to_parameters()?;
        CylinderTracer::new(process, self.tracer)?;
        self.tower.to_parameters().validate()?;

        if self.tower.needs_font()
            && self.tower.font_family.trim().is_empty()
            && self.tower.font_file.is_none()
        {
            return Err(SettingsError::InvalidSetting {
                key: "tower.font_family".to_string(),
                reason: "a font family or font file is required".to_string(),
            });
        }

        if self.output.path.as_os_str().is_empty() {
            return Err(SettingsError::InvalidSetting {
                key: "output.path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        for (key, value) in [
            ("output.coordinate_precision", self.output.coordinate_precision),
            ("output.extrusion_precision", self.output.extrusion_precision),
        ] {
            if value > MAX_PRECISION {
                return Err(ConfigError::ValueOutOfRange {
                    key: key.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Process parameters for the job
    pub fn process_parameters(&self) -> ParameterResult<ProcessParameters> {
        self.process.to_parameters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_tower() {
        let config = TowerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.process.nozzle_width, 0.4);
        assert_eq!(config.process.layer_height, 0.25);
        assert!(config.process.volumetric);
        assert_eq!(config.process.filament_diameter, 2.85);
        assert_eq!(config.tracer.base_radius, 30.0);
        assert_eq!(config.tower.flow_rates.len(), 4);
        assert_eq!(config.tower.flow_rates[0], VolumetricFlow(7.0));
        assert_eq!(config.tower.fan_speed, 255);
    }

    #[test]
    fn test_extrusion_mode() {
        let mut process = ProcessSettings::default();
        assert_eq!(process.extrusion_mode(), ExtrusionMode::Volumetric);
        process.volumetric = false;
        assert_eq!(
            process.extrusion_mode(),
            ExtrusionMode::LinearLength {
                filament_diameter: 2.85
            }
        );
    }

    #[test]
    fn test_font_source() {
        let mut tower = TowerSettings::default();
        assert_eq!(
            tower.font_source(),
            FontSource::Family("Monospace".to_string())
        );
        tower.font_file = Some(PathBuf::from("/fonts/mono.ttf"));
        assert_eq!(
            tower.font_source(),
            FontSource::File(PathBuf::from("/fonts/mono.ttf"))
        );
    }

    #[test]
    fn test_validation_errors() {
        let mut config = TowerConfig::default();
        config.process.layer_height = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Parameter(_))
        ));

        let mut config = TowerConfig::default();
        config.tower.flow_rates.clear();
        assert!(config.validate().is_err());

        let mut config = TowerConfig::default();
        config.output.extrusion_precision = 20;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
        ));

        let mut config = TowerConfig::default();
        config.tower.font_family = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_font_only_required_for_text_labels() {
        let mut config = TowerConfig::default();
        config.tower.font_family = String::new();
        assert!(config.tower.needs_font());
        assert!(config.validate().is_err());

        config.tower.block_labels = true;
        assert!(!config.tower.needs_font());
        assert!(config.validate().is_ok());

        config.tower.block_labels = false;
        config.tower.image = Some(PathBuf::from("logo.png"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TowerConfig = toml::from_str(
            r#"
            [process]
            volumetric = false

            [tower]
            flow_rates = [5.0, 6.5]
            "#,
        )
        .unwrap();
        assert!(!config.process.volumetric);
        assert_eq!(config.process.nozzle_width, 0.4);
        assert_eq!(
            config.tower.flow_rates,
            vec![VolumetricFlow(5.0), VolumetricFlow(6.5)]
        );
        assert_eq!(config.tracer, TracerSettings::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = TowerConfig::default().save_to_file(Path::new("tower.yaml"));
        assert!(matches!(
            result,
            Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
        ));
    }
}
