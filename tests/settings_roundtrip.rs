use cordex::settings::{MapStyle, Settings};
use tempfile::tempdir;

#[test]
fn save_then_load_preserves_preferences() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let path = path.to_str().unwrap();

    let mut settings = Settings::default();
    settings.map_style = MapStyle::Satellite;
    settings.water_overlay = false;
    settings.gridlines = true;
    settings.ocr_interval_ms = 250;
    settings.save(path).unwrap();

    let loaded = Settings::load(path).unwrap();
    assert_eq!(loaded.map_style, MapStyle::Satellite);
    assert!(!loaded.water_overlay);
    assert!(loaded.gridlines);
    assert_eq!(loaded.ocr_interval_ms, 250);
}

#[test]
fn load_missing_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let loaded = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded.map_style, MapStyle::Light);
    assert!(loaded.water_overlay);
    assert!(loaded.location_labels);
}

#[test]
fn unknown_style_string_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"map_style":"sepia"}"#).unwrap();
    assert!(Settings::load(path.to_str().unwrap()).is_err());
}
