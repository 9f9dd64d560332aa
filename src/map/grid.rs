//! Adaptive coordinate grid for the map canvas.
//!
//! Step selection scans a fixed multiplier ladder scaled by the decade of the
//! visible world span, so label density stays near the target line count at
//! any zoom level. Gridlines are anchored by flooring the pan center to a step
//! multiple, which keeps them locked to absolute world coordinates while the
//! view pans.

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke};

use crate::map::outlined_text;
use crate::map::viewport::Transform;

pub const GRID_TARGET_LINES_ON_SCREEN: f64 = 5.0;
const GRID_LINE_LOOP_COUNT: i64 = 25;
const STEP_MULTIPLIERS: [f64; 13] = [
    100.0, 50.0, 20.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.2, 0.1, 0.05, 0.02, 0.01,
];

/// Largest multiple of `mult` that is <= `val`.
pub fn super_floor(mult: f64, val: f64) -> f64 {
    mult * (val / mult).floor()
}

/// Number of decimal places needed to represent `a` exactly (capped).
pub fn decimal_precision(a: f64) -> usize {
    if !a.is_finite() {
        return 0;
    }
    let mut e = 1.0_f64;
    let mut p = 0;
    while (a * e).round() / e != a && p < 12 {
        e *= 10.0;
        p += 1;
    }
    p
}

/// Power of ten of the visible span.
pub fn span_decade(span: f64) -> f64 {
    10f64.powf(span.max(f64::EPSILON).log10().floor())
}

/// First ladder candidate below `span / target_lines`, falling back to the
/// finest step when the span is tiny.
pub fn gridline_step(span: f64, decade: f64, target_lines: f64) -> f64 {
    let limit = span / target_lines;
    for &mult in &STEP_MULTIPLIERS[..STEP_MULTIPLIERS.len() - 1] {
        let candidate = mult * decade;
        if candidate < limit && candidate > 0.0 {
            return candidate;
        }
    }
    (STEP_MULTIPLIERS[STEP_MULTIPLIERS.len() - 1] * decade).max(f64::EPSILON)
}

fn format_label(value: f64, step: f64) -> String {
    if decimal_precision(value) == 0 {
        return format!("{}", value.round() as i64);
    }
    let decimals = decimal_precision(step) + 1;
    let s = format!("{value:.decimals$}");
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

pub fn draw_grid(painter: &Painter, canvas: Rect, transform: &Transform, pan_center: (f64, f64)) {
    let world_w = transform.bounds.width();
    let world_h = transform.bounds.height();
    if world_w <= 0.0 || world_h <= 0.0 {
        return;
    }

    let x_step = gridline_step(world_w, span_decade(world_w), GRID_TARGET_LINES_ON_SCREEN);
    let y_step = gridline_step(world_h, span_decade(world_h), GRID_TARGET_LINES_ON_SCREEN);
    if x_step <= 0.0 || y_step <= 0.0 {
        return;
    }

    let font = FontId::proportional(13.0);
    let label_fill = Color32::from_black_alpha(242);
    let label_outline = Color32::from_white_alpha(204);
    let (w, h) = (canvas.width(), canvas.height());
    let origin = screen_of(transform, canvas, 0.0, 0.0);

    // Major vertical lines and x-axis labels.
    for i in -GRID_LINE_LOOP_COUNT..=GRID_LINE_LOOP_COUNT {
        let world_x = x_step * i as f64 + super_floor(x_step, pan_center.0);
        if world_x < transform.bounds.min_x - x_step || world_x > transform.bounds.max_x + x_step {
            continue;
        }
        let pos = screen_of(transform, canvas, world_x, 0.0);
        let is_origin = world_x.abs() < x_step * 0.001;
        let stroke = if is_origin {
            Stroke::new(1.2, Color32::from_black_alpha(128))
        } else {
            Stroke::new(0.5, Color32::from_black_alpha(64))
        };
        painter.line_segment(
            [Pos2::new(pos.x, canvas.top()), Pos2::new(pos.x, canvas.bottom())],
            stroke,
        );

        if (pos.x - origin.x).abs() > 5.0 || !is_origin {
            let text = format_label(world_x, x_step);
            if world_x.abs() < x_step / 10_000.0 && world_x != 0.0 {
                continue;
            }
            let label_y = (origin.y + 15.0).clamp(canvas.top() + 15.0, canvas.bottom() - 7.0);
            if pos.x > canvas.left() + 15.0 && pos.x < canvas.right() - 15.0 {
                outlined_text(
                    painter,
                    Pos2::new(pos.x, label_y),
                    Align2::CENTER_CENTER,
                    &text,
                    font.clone(),
                    label_fill,
                    label_outline,
                );
            }
        }
    }

    // Major horizontal lines and y-axis labels.
    for i in -GRID_LINE_LOOP_COUNT..=GRID_LINE_LOOP_COUNT {
        let world_y = y_step * i as f64 + super_floor(y_step, pan_center.1);
        if world_y < transform.bounds.min_y - y_step || world_y > transform.bounds.max_y + y_step {
            continue;
        }
        let pos = screen_of(transform, canvas, 0.0, world_y);
        let is_origin = world_y.abs() < y_step * 0.001;
        let stroke = if is_origin {
            Stroke::new(1.2, Color32::from_black_alpha(128))
        } else {
            Stroke::new(0.5, Color32::from_black_alpha(64))
        };
        painter.line_segment(
            [Pos2::new(canvas.left(), pos.y), Pos2::new(canvas.right(), pos.y)],
            stroke,
        );

        if (pos.y - origin.y).abs() > 5.0 || !is_origin {
            if world_y.abs() < y_step / 10_000.0 && world_y != 0.0 {
                continue;
            }
            let text = format_label(world_y, y_step);
            // Hug the origin axis; fall back to the canvas edge when the axis
            // is off screen.
            let (align, label_x) = if origin.x < canvas.left() + 35.0 {
                (Align2::LEFT_CENTER, canvas.left() + 5.0)
            } else if origin.x > canvas.right() - 35.0 {
                (Align2::RIGHT_CENTER, canvas.right() - 5.0)
            } else {
                (Align2::RIGHT_CENTER, origin.x - 7.0)
            };
            if pos.y > canvas.top() + 10.0 && pos.y < canvas.bottom() - 5.0 {
                outlined_text(
                    painter,
                    Pos2::new(label_x, pos.y),
                    align,
                    &text,
                    font.clone(),
                    label_fill,
                    label_outline,
                );
            }
        }
    }

    // Emphasized origin axes.
    let axis_color = Color32::from_black_alpha(230);
    if origin.x >= canvas.left() && origin.x <= canvas.right() {
        painter.rect_filled(
            Rect::from_min_size(
                Pos2::new(origin.x - 0.75, canvas.top()),
                eframe::egui::vec2(1.5, h),
            ),
            0.0,
            axis_color,
        );
    }
    if origin.y >= canvas.top() && origin.y <= canvas.bottom() {
        painter.rect_filled(
            Rect::from_min_size(
                Pos2::new(canvas.left(), origin.y - 0.75),
                eframe::egui::vec2(w, 1.5),
            ),
            0.0,
            axis_color,
        );
    }

    // Minor gridlines at a fifth of the major step, skipping majors.
    let minor_stroke = Stroke::new(0.2, Color32::from_black_alpha(102));
    let minor_x = x_step / 5.0;
    if minor_x > f64::EPSILON * 100.0 {
        for i in -GRID_LINE_LOOP_COUNT * 5..=GRID_LINE_LOOP_COUNT * 5 {
            let world_x = minor_x * i as f64 + super_floor(minor_x, pan_center.0);
            if (world_x % x_step).abs() < minor_x * 0.01 {
                continue;
            }
            if world_x < transform.bounds.min_x - minor_x
                || world_x > transform.bounds.max_x + minor_x
            {
                continue;
            }
            let pos = screen_of(transform, canvas, world_x, 0.0);
            painter.line_segment(
                [Pos2::new(pos.x, canvas.top()), Pos2::new(pos.x, canvas.bottom())],
                minor_stroke,
            );
        }
    }
    let minor_y = y_step / 5.0;
    if minor_y > f64::EPSILON * 100.0 {
        for i in -GRID_LINE_LOOP_COUNT * 5..=GRID_LINE_LOOP_COUNT * 5 {
            let world_y = minor_y * i as f64 + super_floor(minor_y, pan_center.1);
            if (world_y % y_step).abs() < minor_y * 0.01 {
                continue;
            }
            if world_y < transform.bounds.min_y - minor_y
                || world_y > transform.bounds.max_y + minor_y
            {
                continue;
            }
            let pos = screen_of(transform, canvas, 0.0, world_y);
            painter.line_segment(
                [Pos2::new(canvas.left(), pos.y), Pos2::new(canvas.right(), pos.y)],
                minor_stroke,
            );
        }
    }
}

fn screen_of(transform: &Transform, canvas: Rect, wx: f64, wy: f64) -> Pos2 {
    let (x, y) = transform.to_screen(wx, wy);
    Pos2::new(canvas.left() + x as f32, canvas.top() + y as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_floor_snaps_toward_negative_infinity() {
        assert_eq!(super_floor(5.0, 13.0), 10.0);
        assert_eq!(super_floor(5.0, -13.0), -15.0);
        assert_eq!(super_floor(0.5, 1.3), 1.0);
    }

    #[test]
    fn step_selection_tracks_span_decade() {
        // A span of 20 world units has decade 10; first candidate under 4.
        let step = gridline_step(20.0, span_decade(20.0), 5.0);
        assert_eq!(step, 2.0);

        let step = gridline_step(0.02, span_decade(0.02), 5.0);
        assert!((step - 0.002).abs() < 1e-12);

        let step = gridline_step(700.0, span_decade(700.0), 5.0);
        assert_eq!(step, 100.0);
    }

    #[test]
    fn step_selection_falls_back_to_finest_multiplier() {
        let decade = span_decade(1.0);
        let step = gridline_step(0.0, decade, 5.0);
        assert!(step > 0.0);
    }

    #[test]
    fn precision_counts_decimal_places() {
        assert_eq!(decimal_precision(10.0), 0);
        assert_eq!(decimal_precision(0.5), 1);
        assert_eq!(decimal_precision(0.02), 2);
        assert_eq!(decimal_precision(f64::INFINITY), 0);
    }

    #[test]
    fn labels_round_by_step_precision() {
        assert_eq!(format_label(4.0, 2.0), "4");
        assert_eq!(format_label(0.5, 0.5), "0.5");
        assert_eq!(format_label(-12.0, 2.0), "-12");
        assert_eq!(format_label(0.25, 0.05), "0.25");
    }
}
