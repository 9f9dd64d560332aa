pub mod compositor;
pub mod grid;
pub mod layers;
pub mod model;
pub mod pulse;
pub mod view;
pub mod viewport;

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2};

/// Stroke-then-fill text so labels stay readable on any background. egui has
/// no text stroking, so the outline is the text drawn at one-pixel offsets.
pub(crate) fn outlined_text(
    painter: &Painter,
    pos: Pos2,
    anchor: Align2,
    text: &str,
    font: FontId,
    fill: Color32,
    outline: Color32,
) {
    for offset in [(-1.0, 0.0), (1.0, 0.0), (0.0, -1.0), (0.0, 1.0)] {
        painter.text(
            pos + eframe::egui::vec2(offset.0, offset.1),
            anchor,
            text,
            font.clone(),
            outline,
        );
    }
    painter.text(pos, anchor, text, font, fill);
}
