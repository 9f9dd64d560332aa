//! Static knowledge about the game world: base map styles, overlay layers,
//! region labels, and the clipboard coordinate formats players paste in.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::map::model::{ImageLayer, PathPoint, TextLabel};
use crate::settings::{MapStyle, Settings};

/// World-space footprint shared by every full-map layer.
const LAYER_SIZE: (f64, f64) = (1234.0, 1234.0);
const LAYER_CENTER: (f64, f64) = (57.0, 0.0);

/// Build the image layer stack for the current preferences: one base layer
/// for the style plus one overlay per enabled toggle. Order is draw order.
pub fn layer_stack(settings: &Settings) -> Vec<ImageLayer> {
    let mut layers = Vec::new();
    layers.push(match settings.map_style {
        MapStyle::Light => full_map_layer("map-light.png"),
        MapStyle::Dark => full_map_layer("map-dark.png"),
        MapStyle::Satellite => ImageLayer::new("realmap.png", 2.0, 2.0, LAYER_SIZE),
    });
    let overlays = [
        (settings.water_overlay, "water.png"),
        (settings.mud_overlay, "mudOverlay.png"),
        (settings.sanctuary_overlay, "sanctuaries.png"),
        (settings.structure_overlay, "structures.png"),
        (settings.migration_overlay, "migration.png"),
    ];
    for (enabled, url) in overlays {
        if enabled {
            layers.push(full_map_layer(url));
        }
    }
    layers
}

fn full_map_layer(url: &str) -> ImageLayer {
    ImageLayer::new(url, LAYER_CENTER.0, LAYER_CENTER.1, LAYER_SIZE)
}

/// Named regions of the island, shown when location labels are enabled.
pub fn location_labels() -> Vec<TextLabel> {
    [
        ("South Plains", 210.0, -215.0),
        ("West Rail", 30.0, -281.0),
        ("West Access", -112.0, -360.0),
        ("Highlands", -78.0, -80.0),
        ("Water Access", -219.0, 93.0),
        ("N.W. Ridge", -260.0, -140.0),
        ("Northern Jungle", -318.0, 160.0),
        ("North Lake", -370.0, 325.0),
        ("East Lake", -136.0, 445.0),
        ("East Coast", -92.0, 541.0),
        ("Swamps", 294.0, 54.0),
        ("Jungle I Sector", -31.0, 85.0),
    ]
    .iter()
    .map(|(text, lat, long)| TextLabel::new(text, *lat, *long, 13.0))
    .collect()
}

static GAME_READOUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\(Lat:\s*(-?[\d,]+(?:\.\d+)?)\s*Long:\s*(-?[\d,]+(?:\.\d+)?)(?:\s*Alt:.*)?\)")
        .expect("readout pattern")
});
static TRIPLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?[\d,]+(?:\.\d+)?)\s*,\s*(-?[\d,]+(?:\.\d+)?)\s*,\s*(-?[\d,]+(?:\.\d+)?)$")
        .expect("triple pattern")
});
static INT_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d+)\s*,\s*(-?\d+)$").expect("pair pattern"));

/// Parse a pasted location string into a world point.
///
/// Accepted formats, in order of preference:
/// - the game's own readout `(Lat: -12,345.67 Long: 98,765.43 Alt: ...)`,
///   scaled down by 1000;
/// - three comma-separated numbers (third ignored), scaled down by 1000;
/// - a plain integer pair, taken as direct world values.
pub fn parse_location(input: &str) -> Option<PathPoint> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let clean = |s: &str| s.replace(',', "").parse::<f64>().ok();

    if let Some(caps) = GAME_READOUT.captures(input) {
        let lat = clean(&caps[1])?;
        let long = clean(&caps[2])?;
        return Some(PathPoint::new(lat / 1000.0, long / 1000.0));
    }
    if let Some(caps) = TRIPLE.captures(input) {
        let lat = clean(&caps[1])?;
        let long = clean(&caps[2])?;
        return Some(PathPoint::new(lat / 1000.0, long / 1000.0));
    }
    if let Some(caps) = INT_PAIR.captures(input) {
        let lat: f64 = caps[1].parse().ok()?;
        let long: f64 = caps[2].parse().ok()?;
        return Some(PathPoint::new(lat, long));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_readout_format_is_scaled() {
        let point = parse_location("(Lat: -12,345.67 Long: 98,765.43 Alt: 1,234)").unwrap();
        assert!((point.lat - (-12.34567)).abs() < 1e-9);
        assert!((point.long - 98.76543).abs() < 1e-9);
    }

    #[test]
    fn triple_format_ignores_third_number() {
        let point = parse_location("-12345, 98765, 555").unwrap();
        assert!((point.lat - (-12.345)).abs() < 1e-9);
        assert!((point.long - 98.765).abs() < 1e-9);
    }

    #[test]
    fn integer_pair_is_direct() {
        let point = parse_location("-120,450").unwrap();
        assert_eq!((point.lat, point.long), (-120.0, 450.0));
    }

    #[test]
    fn junk_is_rejected() {
        assert!(parse_location("").is_none());
        assert!(parse_location("hello").is_none());
        assert!(parse_location("1.5,2.5").is_none());
    }

    #[test]
    fn layer_stack_follows_preferences() {
        let mut settings = Settings::default();
        settings.map_style = MapStyle::Dark;
        settings.water_overlay = true;
        settings.migration_overlay = true;
        let layers = layer_stack(&settings);
        let urls: Vec<&str> = layers.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, ["map-dark.png", "water.png", "migration.png"]);
    }
}
