//! Screen-capture session and region-of-interest selection.
//!
//! The "stream" is a per-frame grab of the primary screen; a failed grab is
//! the stream-ended path and runs the same full reset as an explicit stop.
//! The selection rectangle lives in the frame's native pixel space, scaled
//! from wherever the preview happens to be displayed.

use anyhow::{Context as _, Result};
use image::RgbaImage;
use screenshots::Screen;
use tracing::{info, warn};

/// Selections at or below this many native pixels per side are treated as
/// unset for OCR purposes.
pub const MIN_REGION_PX: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub is_being_drawn: bool,
    pub anchor_x: f64,
    pub anchor_y: f64,
}

impl SelectionRegion {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Pointer-down: anchor a fresh zero-size rectangle.
    pub fn begin(&mut self, x: f64, y: f64) {
        *self = Self {
            x,
            y,
            width: 0.0,
            height: 0.0,
            is_being_drawn: true,
            anchor_x: x,
            anchor_y: y,
        };
    }

    /// Pointer-move: normalize the signed drag into a positive rect.
    pub fn update(&mut self, x: f64, y: f64) {
        if !self.is_being_drawn {
            return;
        }
        self.x = self.anchor_x.min(x);
        self.y = self.anchor_y.min(y);
        self.width = (x - self.anchor_x).abs();
        self.height = (y - self.anchor_y).abs();
    }

    /// Pointer-up: freeze the rectangle.
    pub fn finish(&mut self) {
        self.is_being_drawn = false;
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn is_valid_for_ocr(&self) -> bool {
        self.width > MIN_REGION_PX && self.height > MIN_REGION_PX
    }
}

/// Supplies capture frames. Swapped for a canned source in tests.
pub trait FrameSource: Send {
    fn grab(&mut self) -> Result<RgbaImage>;
}

pub struct ScreenSource {
    screen: Screen,
}

impl ScreenSource {
    /// Requests the OS screen-capture capability for the primary display.
    pub fn primary() -> Result<Self> {
        let screen = Screen::from_point(0, 0).context("no capturable screen found")?;
        Ok(Self { screen })
    }
}

impl FrameSource for ScreenSource {
    fn grab(&mut self) -> Result<RgbaImage> {
        self.screen.capture().context("screen capture failed")
    }
}

pub struct CaptureSession {
    source: Option<Box<dyn FrameSource>>,
    frame: Option<RgbaImage>,
    pub region: SelectionRegion,
    generation: u64,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self {
            source: None,
            frame: None,
            region: SelectionRegion::default(),
            generation: 0,
        }
    }
}

impl CaptureSession {
    pub fn is_capturing(&self) -> bool {
        self.source.is_some()
    }

    /// Monotonic session counter; recognition results tagged with an older
    /// generation are ignored after a reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    /// Begin capturing from `source`. Clears any previous region and frame.
    pub fn start(&mut self, source: Box<dyn FrameSource>) {
        self.stop();
        self.source = Some(source);
        info!("screen capture started");
    }

    /// Refresh the current frame. Returns `false` when the stream has ended,
    /// after running the full reset.
    pub fn grab_frame(&mut self) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        match source.grab() {
            Ok(frame) => {
                self.frame = Some(frame);
                true
            }
            Err(err) => {
                warn!(error = %err, "capture stream ended");
                self.stop();
                false
            }
        }
    }

    /// Full reset: drop the source and frame, clear the region, invalidate
    /// outstanding recognition results.
    pub fn stop(&mut self) {
        if self.source.is_some() {
            info!("screen capture stopped");
        }
        self.source = None;
        self.frame = None;
        self.region.reset();
        self.generation += 1;
    }

    /// Crop the selected region out of the current frame, clamped to the
    /// frame bounds. `None` while not capturing or when the region is unset.
    pub fn crop_region(&self) -> Option<RgbaImage> {
        let frame = self.frame.as_ref()?;
        if !self.region.has_area() {
            return None;
        }
        let x = self.region.x.max(0.0) as u32;
        let y = self.region.y.max(0.0) as u32;
        if x >= frame.width() || y >= frame.height() {
            return None;
        }
        let w = (self.region.width as u32).min(frame.width() - x);
        let h = (self.region.height as u32).min(frame.height() - y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(image::imageops::crop_imm(frame, x, y, w, h).to_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SolidSource {
        fail_after: usize,
        grabs: usize,
    }

    impl FrameSource for SolidSource {
        fn grab(&mut self) -> Result<RgbaImage> {
            self.grabs += 1;
            if self.grabs > self.fail_after {
                anyhow::bail!("stream gone");
            }
            Ok(RgbaImage::from_pixel(100, 80, image::Rgba([9, 9, 9, 255])))
        }
    }

    #[test]
    fn drag_normalizes_to_positive_rect() {
        let mut region = SelectionRegion::default();
        region.begin(50.0, 60.0);
        region.update(10.0, 20.0);
        region.finish();
        assert_eq!(
            (region.x, region.y, region.width, region.height),
            (10.0, 20.0, 40.0, 40.0)
        );
        assert!(!region.is_being_drawn);
    }

    #[test]
    fn tiny_region_is_invalid_for_ocr() {
        let mut region = SelectionRegion::default();
        region.begin(0.0, 0.0);
        region.update(5.0, 5.0);
        region.finish();
        assert!(region.has_area());
        assert!(!region.is_valid_for_ocr());
    }

    #[test]
    fn stream_failure_runs_full_reset_and_bumps_generation() {
        let mut session = CaptureSession::default();
        session.start(Box::new(SolidSource {
            fail_after: 1,
            grabs: 0,
        }));
        let generation = session.generation();
        assert!(session.grab_frame());
        session.region.begin(0.0, 0.0);
        session.region.update(50.0, 50.0);
        session.region.finish();

        assert!(!session.grab_frame());
        assert!(!session.is_capturing());
        assert!(!session.region.has_area());
        assert!(session.frame().is_none());
        assert!(session.generation() > generation);
    }

    #[test]
    fn crop_clamps_to_frame_bounds() {
        let mut session = CaptureSession::default();
        session.start(Box::new(SolidSource {
            fail_after: 10,
            grabs: 0,
        }));
        assert!(session.grab_frame());
        session.region.begin(90.0, 70.0);
        session.region.update(300.0, 300.0);
        session.region.finish();

        let crop = session.crop_region().unwrap();
        assert_eq!((crop.width(), crop.height()), (10, 10));
    }
}
