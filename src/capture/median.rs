//! Temporal median filter over raw OCR coordinate readings.
//!
//! The two axes are filtered independently: longitudes and latitudes are each
//! sorted on their own, so the emitted point can combine values from two
//! different raw samples. That is intentional; it rejects per-axis outliers
//! better than a joint median.

use std::collections::VecDeque;

/// Sliding window of `(long, lat)` candidates, FIFO-truncated to capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: VecDeque<(f64, f64)>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, long: f64, lat: f64) {
        self.samples.push_back((long, lat));
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn samples(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.samples.iter()
    }

    /// Per-axis median of the most recent window, available once the buffer
    /// has filled. Returns `None` if a median lands on NaN.
    pub fn median_point(&self) -> Option<(f64, f64)> {
        if self.samples.len() < self.capacity {
            return None;
        }
        let window: Vec<(f64, f64)> = self
            .samples
            .iter()
            .skip(self.samples.len() - self.capacity)
            .copied()
            .collect();

        let mut longs: Vec<f64> = window.iter().map(|p| p.0).collect();
        let mut lats: Vec<f64> = window.iter().map(|p| p.1).collect();
        longs.sort_by(|a, b| a.total_cmp(b));
        lats.sort_by(|a, b| a.total_cmp(b));

        let mid = window.len() / 2;
        let long = longs[mid];
        let lat = lats[mid];
        if long.is_nan() || lat.is_nan() {
            return None;
        }
        Some((long, lat))
    }
}
