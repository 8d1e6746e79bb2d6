use surfacekit_core::Anchor;
use surfacekit_settings::{Config, SettingsError};
use tempfile::TempDir;

#[test]
fn test_toml_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.transform.arc_steps = 36;
    config.output.centering_anchor = Anchor::TopRight;
    config.heightmap.x_length = Some(120.0);
    config.recorder.serial_port = "/dev/ttyUSB0".to_string();
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_json_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut config = Config::default();
    config.smoothing.enabled = false;
    config.line_pattern.line_count = 3;
    config.save_to_file(&path).unwrap();

    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[transform]\ninterpolation_steps = 4\n").unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.transform.interpolation_steps, 4);
    assert_eq!(loaded.transform.arc_steps, Config::default().transform.arc_steps);
    assert_eq!(loaded.recorder, Config::default().recorder);
}

#[test]
fn test_load_or_create_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let created = Config::load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(Config::load_or_create(&path).unwrap(), created);
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[transform]\narc_steps = 0\n").unwrap();

    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::Config(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        Config::load_from_file(&dir.path().join("absent.toml")),
        Err(SettingsError::Io { .. })
    ));
}
