use chrono::{DateTime, Utc};
use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

/// A coordinate pair in the game world's axes (not geographic).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub lat: f64,
    pub long: f64,
}

impl PathPoint {
    pub const fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }
}

/// An ordered sequence of plotted points. Draw order is sequence order; the
/// last point is rendered highlighted and pulsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPath {
    pub points: Vec<PathPoint>,
    pub enabled: bool,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TrackPath {
    pub fn new(points: Vec<PathPoint>) -> Self {
        let enabled = !points.is_empty();
        Self {
            points,
            enabled,
            color: None,
            name: None,
            created_at: None,
        }
    }

    pub fn color32(&self) -> Color32 {
        match self.color {
            Some([r, g, b]) => Color32::from_rgb(r, g, b),
            None => Color32::RED,
        }
    }
}

impl Default for TrackPath {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// A background or overlay image anchored and scaled in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    pub url: String,
    pub center_x: f64,
    pub center_y: f64,
    pub world_width: f64,
    pub world_height: f64,
}

impl ImageLayer {
    pub fn new(url: impl Into<String>, center_x: f64, center_y: f64, size: (f64, f64)) -> Self {
        Self {
            url: url.into(),
            center_x,
            center_y,
            world_width: size.0,
            world_height: size.1,
        }
    }
}

/// Static text annotation positioned in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub lat: f64,
    pub long: f64,
    pub size: f32,
}

impl TextLabel {
    pub fn new(text: &str, lat: f64, long: f64, size: f32) -> Self {
        Self {
            text: text.to_string(),
            lat,
            long,
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Ellipse,
    Rectangle,
}

/// World-sized geometric overlay, drawn filled at low opacity plus stroked.
#[derive(Debug, Clone, PartialEq)]
pub struct MapShape {
    pub kind: ShapeKind,
    pub center: PathPoint,
    pub world_width: f64,
    pub world_height: f64,
    pub rotation: f64,
    pub color: Color32,
}
