//! Per-frame compositing of the map canvas.
//!
//! Draw order is fixed so later layers occlude earlier ones: background,
//! image layers, grid, shapes, text labels, paths.

use eframe::egui::{
    epaint::PathShape, Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke,
};

use crate::map::grid::draw_grid;
use crate::map::layers::{ImageCache, LayerStatus};
use crate::map::model::{ImageLayer, MapShape, ShapeKind, TextLabel, TrackPath};
use crate::map::outlined_text;
use crate::map::pulse::PulseScheduler;
use crate::map::viewport::Transform;

pub const POINT_RADIUS: f32 = 5.0;
const BACKGROUND: Color32 = Color32::from_rgb(0x26, 0x2b, 0x37);
const PLACEHOLDER_BG: Color32 = Color32::from_rgb(0xd3, 0xd3, 0xd3);
const MAX_LISTED_ERRORS: usize = 3;

/// Everything the compositor draws besides the viewport itself.
pub struct SceneContent<'a> {
    pub layers: &'a [ImageLayer],
    pub shapes: &'a [MapShape],
    pub texts: &'a [TextLabel],
    pub paths: &'a [TrackPath],
    pub draw_grid: bool,
}

pub fn composite(
    painter: &Painter,
    canvas: Rect,
    transform: &Transform,
    pan_center: (f64, f64),
    cache: &mut ImageCache,
    content: &SceneContent<'_>,
    pulse: &PulseScheduler,
) {
    painter.rect_filled(canvas, 0.0, BACKGROUND);

    draw_layers(painter, canvas, transform, cache, content.layers);
    if content.draw_grid {
        draw_grid(painter, canvas, transform, pan_center);
    }
    for shape in content.shapes {
        draw_shape(painter, canvas, transform, shape);
    }
    for text in content.texts {
        draw_label(painter, canvas, transform, text);
    }
    for path in content.paths {
        draw_path(painter, canvas, transform, path, pulse);
    }
}

fn draw_layers(
    painter: &Painter,
    canvas: Rect,
    transform: &Transform,
    cache: &mut ImageCache,
    layers: &[ImageLayer],
) {
    if layers.is_empty() {
        return;
    }

    let mut any_loading = false;
    let mut drawn = 0usize;
    let mut error_urls: Vec<&str> = Vec::new();

    for layer in layers {
        cache.request(&layer.url);
        let Some(entry) = cache.entry(&layer.url) else {
            any_loading = true;
            continue;
        };
        match entry.status {
            LayerStatus::Loaded => {
                let Some(texture) = &entry.texture else {
                    continue;
                };
                let (left, top) = transform.to_screen(
                    layer.center_x - layer.world_width / 2.0,
                    layer.center_y - layer.world_height / 2.0,
                );
                let (right, bottom) = transform.to_screen(
                    layer.center_x + layer.world_width / 2.0,
                    layer.center_y + layer.world_height / 2.0,
                );
                if right - left <= 0.0 || bottom - top <= 0.0 {
                    continue;
                }
                let rect = Rect::from_min_max(
                    canvas.min + eframe::egui::vec2(left as f32, top as f32),
                    canvas.min + eframe::egui::vec2(right as f32, bottom as f32),
                );
                painter.image(
                    texture.id(),
                    rect,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );
                drawn += 1;
            }
            LayerStatus::Pending | LayerStatus::Loading => any_loading = true,
            LayerStatus::Error => {
                if !error_urls.contains(&layer.url.as_str()) {
                    error_urls.push(&layer.url);
                }
            }
        }
    }

    if drawn > 0 {
        return;
    }
    if any_loading {
        placeholder(painter, canvas, "Loading images...".to_string());
    } else {
        let mut message = "No images to display.".to_string();
        if !error_urls.is_empty() {
            let listed: Vec<&str> = error_urls.iter().copied().take(MAX_LISTED_ERRORS).collect();
            let ellipsis = if error_urls.len() > MAX_LISTED_ERRORS {
                "..."
            } else {
                ""
            };
            message = format!("Failed to load: {}{}", listed.join(", "), ellipsis);
        }
        placeholder(painter, canvas, message);
    }
}

fn placeholder(painter: &Painter, canvas: Rect, message: String) {
    painter.rect_filled(canvas, 0.0, PLACEHOLDER_BG);
    painter.text(
        canvas.center(),
        Align2::CENTER_CENTER,
        message,
        FontId::proportional(14.0),
        Color32::BLACK,
    );
}

fn draw_shape(painter: &Painter, canvas: Rect, transform: &Transform, shape: &MapShape) {
    let world_w = transform.bounds.width();
    let world_h = transform.bounds.height();
    if world_w <= 0.0 || world_h <= 0.0 {
        return;
    }
    let (cx, cy) = transform.to_screen(shape.center.long, shape.center.lat);
    let center = canvas.min + eframe::egui::vec2(cx as f32, cy as f32);
    let half_w = (shape.world_width / 2.0) * (transform.viewport.0 / world_w);
    let half_h = (shape.world_height / 2.0) * (transform.viewport.1 / world_h);
    if half_w <= 0.0 || half_h <= 0.0 {
        return;
    }

    let (sin, cos) = shape.rotation.sin_cos();
    let rotate = |x: f64, y: f64| -> Pos2 {
        Pos2::new(
            center.x + (x * cos - y * sin) as f32,
            center.y + (x * sin + y * cos) as f32,
        )
    };

    let points: Vec<Pos2> = match shape.kind {
        ShapeKind::Ellipse => {
            const SEGMENTS: usize = 48;
            (0..SEGMENTS)
                .map(|i| {
                    let theta = std::f64::consts::TAU * i as f64 / SEGMENTS as f64;
                    rotate(half_w * theta.cos(), half_h * theta.sin())
                })
                .collect()
        }
        ShapeKind::Rectangle => vec![
            rotate(-half_w, -half_h),
            rotate(half_w, -half_h),
            rotate(half_w, half_h),
            rotate(-half_w, half_h),
        ],
    };

    let fill = shape.color.gamma_multiply(0.25);
    painter.add(Shape::Path(PathShape::convex_polygon(
        points,
        fill,
        Stroke::new(1.5, shape.color),
    )));
}

fn draw_label(painter: &Painter, canvas: Rect, transform: &Transform, label: &TextLabel) {
    let (x, y) = transform.to_screen(label.long, label.lat);
    let pos = canvas.min + eframe::egui::vec2(x as f32, y as f32);
    outlined_text(
        painter,
        pos,
        Align2::CENTER_CENTER,
        &label.text,
        FontId::proportional(label.size),
        Color32::WHITE,
        Color32::BLACK,
    );
}

fn draw_path(
    painter: &Painter,
    canvas: Rect,
    transform: &Transform,
    path: &TrackPath,
    pulse: &PulseScheduler,
) {
    if !path.enabled || path.points.is_empty() {
        return;
    }

    let screen: Vec<Pos2> = path
        .points
        .iter()
        .map(|p| {
            let (x, y) = transform.to_screen(p.long, p.lat);
            canvas.min + eframe::egui::vec2(x as f32, y as f32)
        })
        .collect();

    if screen.len() > 1 {
        painter.extend(Shape::dashed_line(
            &screen,
            Stroke::new(2.0, Color32::WHITE),
            5.0,
            3.0,
        ));
    }

    let last = screen.len() - 1;
    for (i, pos) in screen.iter().enumerate() {
        painter.circle_filled(*pos, POINT_RADIUS * 1.3, Color32::WHITE);
        let fill = if i == last {
            path.color32()
        } else {
            Color32::BLUE
        };
        painter.circle_filled(*pos, POINT_RADIUS, fill);

        if i == last && pulse.is_running() && pulse.radius() > 0.0 {
            let alpha = (pulse.opacity() * 255.0).clamp(0.0, 255.0) as u8;
            painter.circle_stroke(
                *pos,
                pulse.radius(),
                Stroke::new(2.0, Color32::from_white_alpha(alpha)),
            );
        }
    }
}
