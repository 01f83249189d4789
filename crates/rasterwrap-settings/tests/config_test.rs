use rasterwrap_core::VolumetricFlow;
use rasterwrap_settings::{SettingsError, TowerConfig};
use std::path::PathBuf;
use tempfile::TempDir;

fn custom_config() -> TowerConfig {
    let mut config = TowerConfig::default();
    config.process.volumetric = false;
    config.process.filament_diameter = 1.75;
    config.tracer.base_radius = 25.0;
    config.tower.flow_rates = vec![VolumetricFlow(4.0), VolumetricFlow(5.5)];
    config.tower.image = Some(PathBuf::from("logo.png"));
    config.output.path = PathBuf::from("out/custom.gcode");
    config
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tower.toml");

    let config = custom_config();
    config.save_to_file(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[process]"));
    assert!(content.contains("volumetric = false"));

    let loaded = TowerConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tower.json");

    let config = custom_config();
    config.save_to_file(&path).unwrap();
    let loaded = TowerConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_default_config_file_has_no_optional_paths() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("default.toml");
    TowerConfig::default().save_to_file(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(!content.contains("font_file"));
    assert!(!content.contains("\nimage ="));
    assert_eq!(TowerConfig::load_from_file(&path).unwrap(), TowerConfig::default());
}

#[test]
fn test_invalid_file_rejected() {
    let dir = TempDir::new().unwrap();

    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[process]\nlayer_height = -1.0\n").unwrap();
    assert!(matches!(
        TowerConfig::load_from_file(&path),
        Err(SettingsError::Parameter(_))
    ));

    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        TowerConfig::load_from_file(&path),
        Err(SettingsError::JsonError(_))
    ));

    let path = dir.path().join("missing.toml");
    assert!(matches!(
        TowerConfig::load_from_file(&path),
        Err(SettingsError::LoadError(_))
    ));
}
