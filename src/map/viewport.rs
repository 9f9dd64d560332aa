//! Pan/zoom state for the map canvas and the world<->screen transform.
//!
//! The zoom level is stored as a base-2 exponent so wheel and pinch deltas map
//! linearly onto perceived zoom speed. All gesture handling goes through
//! [`ViewportController::handle`] so it can be driven event-by-event in tests.

/// World units visible across half the canvas width at zoom exponent 0.
pub const INITIAL_VIEW_WORLD_HALF_WIDTH: f64 = 10.0;
pub const ZOOM_EXPONENT_MIN: f64 = -7.0;
pub const ZOOM_EXPONENT_MAX: f64 = 12.0;
/// Wheel delta (pixels) to zoom-exponent conversion.
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.001;

const DEFAULT_ZOOM_EXPONENT: f64 = -6.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub zoom_exponent: f64,
    pub pan_center: (f64, f64),
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom_exponent: DEFAULT_ZOOM_EXPONENT,
            pan_center: (0.0, 0.0),
        }
    }
}

impl ViewportState {
    pub fn zoom_scale(&self) -> f64 {
        2f64.powf(self.zoom_exponent)
    }

    /// World units moved per screen pixel of drag at the current zoom.
    pub fn world_units_per_pixel(&self, viewport_width: f64) -> f64 {
        if viewport_width == 0.0 {
            return 0.0;
        }
        (2.0 * INITIAL_VIEW_WORLD_HALF_WIDTH / viewport_width) / self.zoom_scale()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl WorldBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Snapshot of the world<->screen mapping for one frame. Recomputed whenever
/// the viewport state or canvas size changes; never cached across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub bounds: WorldBounds,
    pub viewport: (f64, f64),
}

impl Transform {
    pub fn new(state: &ViewportState, viewport_width: f64, viewport_height: f64) -> Self {
        let aspect = if viewport_width == 0.0 {
            1.0
        } else {
            viewport_height / viewport_width
        };
        let half_w = INITIAL_VIEW_WORLD_HALF_WIDTH;
        let half_h = half_w * aspect;
        let inv_scale = 1.0 / state.zoom_scale();
        let bounds = WorldBounds {
            min_x: state.pan_center.0 - half_w * inv_scale,
            max_x: state.pan_center.0 + half_w * inv_scale,
            min_y: state.pan_center.1 - half_h * inv_scale,
            max_y: state.pan_center.1 + half_h * inv_scale,
        };
        Self {
            bounds,
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn to_screen(&self, world_x: f64, world_y: f64) -> (f64, f64) {
        let world_w = self.bounds.width();
        let world_h = self.bounds.height();
        if world_w == 0.0 || world_h == 0.0 {
            return (0.0, 0.0);
        }
        let norm_x = (world_x - self.bounds.min_x) / world_w;
        let norm_y = (world_y - self.bounds.min_y) / world_h;
        (norm_x * self.viewport.0, norm_y * self.viewport.1)
    }

    pub fn to_world(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        if self.viewport.0 == 0.0 || self.viewport.1 == 0.0 {
            return (self.bounds.min_x, self.bounds.min_y);
        }
        (
            self.bounds.min_x + (screen_x / self.viewport.0) * self.bounds.width(),
            self.bounds.min_y + (screen_y / self.viewport.1) * self.bounds.height(),
        )
    }
}

/// Abstract input events so the controller can be exercised without a GUI.
/// Touch events carry the positions of all currently-down fingers.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    PointerDown { pos: (f64, f64) },
    PointerMove { pos: (f64, f64) },
    PointerUp,
    Wheel { pos: (f64, f64), delta_y: f64 },
    TouchesChanged { touches: Vec<(f64, f64)> },
    TouchMove { touches: Vec<(f64, f64)> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GesturePhase {
    Idle,
    Panning {
        pointer_anchor: (f64, f64),
        pan_anchor: (f64, f64),
    },
    PinchZooming {
        last_distance: f64,
        last_midpoint: (f64, f64),
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    pub state: ViewportState,
    phase: GesturePhase,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(ViewportState::default())
    }
}

impl ViewportController {
    pub fn new(state: ViewportState) -> Self {
        Self {
            state,
            phase: GesturePhase::Idle,
        }
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.phase, GesturePhase::Panning { .. })
    }

    /// Feed one gesture event. Malformed sequences (e.g. a pointer-up with no
    /// preceding pointer-down) are silently ignored.
    pub fn handle(&mut self, event: GestureEvent, viewport: (f64, f64)) {
        match event {
            GestureEvent::PointerDown { pos } => {
                if matches!(self.phase, GesturePhase::Idle) {
                    self.phase = GesturePhase::Panning {
                        pointer_anchor: pos,
                        pan_anchor: self.state.pan_center,
                    };
                }
            }
            GestureEvent::PointerMove { pos } => {
                if let GesturePhase::Panning {
                    pointer_anchor,
                    pan_anchor,
                } = self.phase
                {
                    let wupp = self.state.world_units_per_pixel(viewport.0);
                    self.state.pan_center = (
                        pan_anchor.0 - (pos.0 - pointer_anchor.0) * wupp,
                        pan_anchor.1 - (pos.1 - pointer_anchor.1) * wupp,
                    );
                }
            }
            GestureEvent::PointerUp => {
                if matches!(self.phase, GesturePhase::Panning { .. }) {
                    self.phase = GesturePhase::Idle;
                }
            }
            GestureEvent::Wheel { pos, delta_y } => {
                self.apply_zoom_at(-delta_y * WHEEL_ZOOM_SENSITIVITY, pos, viewport);
            }
            GestureEvent::TouchesChanged { touches } => match touches.len() {
                0 => self.phase = GesturePhase::Idle,
                1 => {
                    // Transition from pinch back to a pan without any jump by
                    // re-anchoring at the surviving finger.
                    self.phase = GesturePhase::Panning {
                        pointer_anchor: touches[0],
                        pan_anchor: self.state.pan_center,
                    };
                }
                _ => {
                    self.phase = GesturePhase::PinchZooming {
                        last_distance: distance(touches[0], touches[1]),
                        last_midpoint: midpoint(touches[0], touches[1]),
                    };
                }
            },
            GestureEvent::TouchMove { touches } => {
                if touches.len() < 2 {
                    return;
                }
                if let GesturePhase::PinchZooming {
                    last_distance,
                    last_midpoint,
                } = self.phase
                {
                    let dist = distance(touches[0], touches[1]);
                    let mid = midpoint(touches[0], touches[1]);
                    if last_distance > 0.0 && dist > 0.0 {
                        // log2 of the spread ratio lands pinch deltas in the
                        // same exponent space as wheel zoom.
                        self.apply_zoom_at((dist / last_distance).log2(), mid, viewport);
                    }
                    let wupp = self.state.world_units_per_pixel(viewport.0);
                    self.state.pan_center.0 -= (mid.0 - last_midpoint.0) * wupp;
                    self.state.pan_center.1 -= (mid.1 - last_midpoint.1) * wupp;
                    self.phase = GesturePhase::PinchZooming {
                        last_distance: dist,
                        last_midpoint: mid,
                    };
                }
            }
        }
    }

    /// Change the zoom exponent by `delta` while keeping the world point under
    /// `anchor` fixed on screen.
    fn apply_zoom_at(&mut self, delta: f64, anchor: (f64, f64), viewport: (f64, f64)) {
        if viewport.0 == 0.0 || viewport.1 == 0.0 {
            return;
        }
        let transform = Transform::new(&self.state, viewport.0, viewport.1);
        let world_anchor = transform.to_world(anchor.0, anchor.1);

        let new_zoom = (self.state.zoom_exponent + delta)
            .clamp(ZOOM_EXPONENT_MIN, ZOOM_EXPONENT_MAX);
        let new_scale = 2f64.powf(new_zoom);

        let aspect = viewport.1 / viewport.0;
        let half_w = INITIAL_VIEW_WORLD_HALF_WIDTH;
        let half_h = half_w * aspect;
        let norm_x = anchor.0 / viewport.0;
        let norm_y = anchor.1 / viewport.1;

        self.state.zoom_exponent = new_zoom;
        self.state.pan_center = (
            world_anchor.0 - (-half_w + 2.0 * half_w * norm_x) / new_scale,
            world_anchor.1 - (-half_h + 2.0 * half_h * norm_y) / new_scale,
        );
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}
