//! Expanding-ring animation around the last point of a path.
//!
//! The scheduler is explicit so tests can step frames deterministically: the
//! view calls [`PulseScheduler::sync`] with whether any enabled path has
//! points, then [`PulseScheduler::tick`] once per displayed frame while
//! running. When nothing can pulse the scheduler stops entirely and the view
//! stops requesting repaints for it.

pub const PULSE_MAX_RADIUS: f32 = 30.0;
pub const PULSE_SPEED: f32 = 0.06;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseScheduler {
    running: bool,
    radius: f32,
    frames_ticked: u64,
}

impl Default for PulseScheduler {
    fn default() -> Self {
        Self {
            running: false,
            radius: 0.0,
            frames_ticked: 0,
        }
    }
}

impl PulseScheduler {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Ring opacity fades in lockstep with expansion.
    pub fn opacity(&self) -> f32 {
        1.0 - self.radius / PULSE_MAX_RADIUS
    }

    pub fn frames_ticked(&self) -> u64 {
        self.frames_ticked
    }

    /// Start or stop depending on whether anything can pulse. Stopping resets
    /// the ring so a later restart begins a fresh cycle.
    pub fn sync(&mut self, has_points: bool) {
        if has_points && !self.running {
            self.running = true;
        } else if !has_points && self.running {
            self.running = false;
            self.radius = 0.0;
        }
    }

    /// Advance one displayed frame. A no-op while stopped.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.frames_ticked += 1;
        self.radius += PULSE_SPEED;
        if self.radius > PULSE_MAX_RADIUS {
            self.radius = 0.0;
        }
    }
}
