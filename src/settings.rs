use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    Light,
    Dark,
    Satellite,
}

impl Default for MapStyle {
    fn default() -> Self {
        MapStyle::Light
    }
}

impl std::fmt::Display for MapStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapStyle::Light => write!(f, "Light"),
            MapStyle::Dark => write!(f, "Dark"),
            MapStyle::Satellite => write!(f, "Satellite"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Base map rendering style.
    #[serde(default)]
    pub map_style: MapStyle,
    /// Water bodies overlay, shown by default.
    #[serde(default = "default_water_overlay")]
    pub water_overlay: bool,
    #[serde(default)]
    pub mud_overlay: bool,
    #[serde(default)]
    pub sanctuary_overlay: bool,
    #[serde(default)]
    pub structure_overlay: bool,
    #[serde(default)]
    pub migration_overlay: bool,
    /// Adaptive coordinate gridlines over the map.
    #[serde(default)]
    pub gridlines: bool,
    /// Named region labels.
    #[serde(default = "default_location_labels")]
    pub location_labels: bool,
    /// Milliseconds between live OCR samples.
    #[serde(default = "default_ocr_interval_ms")]
    pub ocr_interval_ms: u64,
    /// Samples collected before a filtered point is emitted.
    #[serde(default = "default_ocr_buffer_size")]
    pub ocr_buffer_size: usize,
    /// Exclusive plausible range for the longitude reading.
    #[serde(default = "default_ocr_long_range")]
    pub ocr_long_range: (f64, f64),
    /// Exclusive plausible range for the latitude reading.
    #[serde(default = "default_ocr_lat_range")]
    pub ocr_lat_range: (f64, f64),
    /// When enabled the application initialises the logger at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Directory holding the map image assets. If `None`, `assets/` under the
    /// working directory is used.
    pub assets_dir: Option<String>,
}

fn default_water_overlay() -> bool {
    true
}

fn default_location_labels() -> bool {
    true
}

fn default_ocr_interval_ms() -> u64 {
    500
}

fn default_ocr_buffer_size() -> usize {
    4
}

fn default_ocr_long_range() -> (f64, f64) {
    (-560.0, 674.0)
}

fn default_ocr_lat_range() -> (f64, f64) {
    (-674.0, 674.0)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            map_style: MapStyle::default(),
            water_overlay: true,
            mud_overlay: false,
            sanctuary_overlay: false,
            structure_overlay: false,
            migration_overlay: false,
            gridlines: false,
            location_labels: true,
            ocr_interval_ms: default_ocr_interval_ms(),
            ocr_buffer_size: default_ocr_buffer_size(),
            ocr_long_range: default_ocr_long_range(),
            ocr_lat_range: default_ocr_lat_range(),
            debug_logging: false,
            assets_dir: None,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn assets_dir(&self) -> std::path::PathBuf {
        match &self.assets_dir {
            Some(dir) => std::path::PathBuf::from(dir),
            None => std::path::PathBuf::from("assets"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Settings::load("nonexistent-settings.json").unwrap();
        assert_eq!(settings.map_style, MapStyle::Light);
        assert!(settings.water_overlay);
        assert!(!settings.gridlines);
        assert_eq!(settings.ocr_interval_ms, 500);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"map_style":"dark","gridlines":true}"#).unwrap();
        assert_eq!(settings.map_style, MapStyle::Dark);
        assert!(settings.gridlines);
        assert!(settings.water_overlay);
        assert_eq!(settings.ocr_buffer_size, 4);
    }
}
