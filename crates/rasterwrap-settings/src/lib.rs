//! rasterwrap Settings Crate
//!
//! Loads, saves and validates tower job configuration files.

pub mod config;
pub mod error;

pub use config::{OutputSettings, ProcessSettings, TowerConfig, TowerSettings};
pub use error::{ConfigError, SettingsError, SettingsResult};
