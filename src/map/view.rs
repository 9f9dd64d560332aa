//! The map canvas widget: translates egui input into gesture events, drives
//! the image cache and pulse scheduler, and hands the frame to the compositor.

use std::collections::BTreeMap;
use std::sync::Arc;

use eframe::egui::{self, CursorIcon, Event, Sense, TouchPhase, Ui};

use crate::map::compositor::{composite, SceneContent};
use crate::map::layers::{ImageCache, ImageLoader};
use crate::map::pulse::PulseScheduler;
use crate::map::viewport::{GestureEvent, Transform, ViewportController};

pub struct MapView {
    pub controller: ViewportController,
    cache: ImageCache,
    pulse: PulseScheduler,
    active_touches: BTreeMap<u64, (f64, f64)>,
}

impl MapView {
    pub fn new(loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            controller: ViewportController::default(),
            cache: ImageCache::new(loader),
            pulse: PulseScheduler::default(),
            active_touches: BTreeMap::new(),
        }
    }

    pub fn ui(&mut self, ui: &mut Ui, content: &SceneContent<'_>) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let canvas = response.rect;
        let viewport = (canvas.width() as f64, canvas.height() as f64);

        self.handle_touches(ui, canvas, viewport);

        // Touch input also synthesizes pointer events; only translate the
        // pointer while no fingers are down.
        if self.active_touches.is_empty() {
            if response.drag_started() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.controller.handle(
                        GestureEvent::PointerDown {
                            pos: local(pos, canvas),
                        },
                        viewport,
                    );
                }
            }
            if response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.controller.handle(
                        GestureEvent::PointerMove {
                            pos: local(pos, canvas),
                        },
                        viewport,
                    );
                }
            }
            if response.drag_stopped() {
                self.controller.handle(GestureEvent::PointerUp, viewport);
            }
        }

        if let Some(hover) = response.hover_pos() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                self.controller.handle(
                    GestureEvent::Wheel {
                        pos: local(hover, canvas),
                        delta_y: -scroll as f64,
                    },
                    viewport,
                );
            }
        }

        if self.controller.is_panning() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if response.hovered() {
            ui.ctx().set_cursor_icon(CursorIcon::Grab);
        }

        self.cache.poll(ui.ctx());

        let has_points = content
            .paths
            .iter()
            .any(|p| p.enabled && !p.points.is_empty());
        self.pulse.sync(has_points);
        self.pulse.tick();
        if self.pulse.is_running() {
            ui.ctx().request_repaint();
        }

        let transform = Transform::new(&self.controller.state, viewport.0, viewport.1);
        composite(
            &painter,
            canvas,
            &transform,
            self.controller.state.pan_center,
            &mut self.cache,
            content,
            &self.pulse,
        );
    }

    fn handle_touches(&mut self, ui: &Ui, canvas: egui::Rect, viewport: (f64, f64)) {
        let events = ui.input(|i| i.events.clone());
        for event in events {
            let Event::Touch { id, phase, pos, .. } = event else {
                continue;
            };
            let gesture =
                translate_touch(&mut self.active_touches, id.0, phase, local(pos, canvas));
            if let Some(gesture) = gesture {
                self.controller.handle(gesture, viewport);
            }
        }
    }
}

/// Map one raw touch event onto a gesture, updating the set of down fingers.
/// One finger pans via the pointer events; two or more pinch-zoom.
fn translate_touch(
    active_touches: &mut BTreeMap<u64, (f64, f64)>,
    id: u64,
    phase: TouchPhase,
    pos: (f64, f64),
) -> Option<GestureEvent> {
    match phase {
        TouchPhase::Start => {
            active_touches.insert(id, pos);
            Some(GestureEvent::TouchesChanged {
                touches: touch_positions(active_touches),
            })
        }
        TouchPhase::Move => {
            active_touches.insert(id, pos);
            match active_touches.len() {
                0 => None,
                1 => Some(GestureEvent::PointerMove { pos }),
                _ => Some(GestureEvent::TouchMove {
                    touches: touch_positions(active_touches),
                }),
            }
        }
        TouchPhase::End | TouchPhase::Cancel => {
            active_touches.remove(&id);
            Some(GestureEvent::TouchesChanged {
                touches: touch_positions(active_touches),
            })
        }
    }
}

fn touch_positions(active_touches: &BTreeMap<u64, (f64, f64)>) -> Vec<(f64, f64)> {
    active_touches.values().copied().collect()
}

fn local(pos: egui::Pos2, canvas: egui::Rect) -> (f64, f64) {
    (
        (pos.x - canvas.left()) as f64,
        (pos.y - canvas.top()) as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: (f64, f64) = (800.0, 600.0);

    fn drive(
        ctrl: &mut ViewportController,
        touches: &mut BTreeMap<u64, (f64, f64)>,
        id: u64,
        phase: TouchPhase,
        pos: (f64, f64),
    ) {
        if let Some(event) = translate_touch(touches, id, phase, pos) {
            ctrl.handle(event, VIEWPORT);
        }
    }

    #[test]
    fn single_finger_drag_pans_the_view() {
        let mut ctrl = ViewportController::default();
        let mut touches = BTreeMap::new();
        let start = ctrl.state.pan_center;

        drive(&mut ctrl, &mut touches, 0, TouchPhase::Start, (100.0, 100.0));
        assert!(ctrl.is_panning());
        drive(&mut ctrl, &mut touches, 0, TouchPhase::Move, (200.0, 140.0));

        // Dragging right/down moves the view center left/up in world space.
        assert!(ctrl.state.pan_center.0 < start.0);
        assert!(ctrl.state.pan_center.1 < start.1);

        drive(&mut ctrl, &mut touches, 0, TouchPhase::End, (200.0, 140.0));
        assert!(!ctrl.is_panning());
        assert!(touches.is_empty());
    }

    #[test]
    fn surviving_finger_keeps_panning_after_pinch() {
        let mut ctrl = ViewportController::default();
        let mut touches = BTreeMap::new();

        drive(&mut ctrl, &mut touches, 0, TouchPhase::Start, (300.0, 300.0));
        drive(&mut ctrl, &mut touches, 1, TouchPhase::Start, (500.0, 300.0));
        drive(&mut ctrl, &mut touches, 1, TouchPhase::End, (500.0, 300.0));
        assert!(ctrl.is_panning());

        let before = ctrl.state.pan_center;
        drive(&mut ctrl, &mut touches, 0, TouchPhase::Move, (340.0, 300.0));
        assert_ne!(ctrl.state.pan_center, before);
    }

    #[test]
    fn two_finger_move_is_a_pinch_not_a_pan() {
        let mut ctrl = ViewportController::default();
        let mut touches = BTreeMap::new();
        let start_zoom = ctrl.state.zoom_exponent;

        drive(&mut ctrl, &mut touches, 0, TouchPhase::Start, (300.0, 300.0));
        drive(&mut ctrl, &mut touches, 1, TouchPhase::Start, (500.0, 300.0));
        drive(&mut ctrl, &mut touches, 0, TouchPhase::Move, (200.0, 300.0));
        drive(&mut ctrl, &mut touches, 1, TouchPhase::Move, (600.0, 300.0));

        assert!(ctrl.state.zoom_exponent > start_zoom);
    }
}
