//! egui panel hosting the capture preview, region selection, and the live
//! OCR controls.

use std::time::Instant;

use anyhow::Result;
use eframe::egui::{
    self, Align2, Color32, ColorImage, FontId, Pos2, Rect, Sense, Stroke, TextureHandle,
    TextureOptions, Ui,
};
use tracing::warn;

use crate::capture::sampler::{LiveSampler, SampleConfig};
use crate::capture::session::{CaptureSession, ScreenSource};
use crate::map::model::PathPoint;
use crate::ocr::RecognitionEngine;

const PREVIEW_MAX_WIDTH: f32 = 640.0;

pub struct CapturePanel {
    pub session: CaptureSession,
    sampler: LiveSampler,
    live_ocr: bool,
    preview: Option<TextureHandle>,
    status: String,
}

impl CapturePanel {
    pub fn new(engine: Box<dyn RecognitionEngine>, config: SampleConfig) -> Result<Self> {
        Ok(Self {
            session: CaptureSession::default(),
            sampler: LiveSampler::new(engine, config)?,
            live_ocr: false,
            preview: None,
            status: "Start screen capture to begin.".to_string(),
        })
    }

    pub fn is_live(&self) -> bool {
        self.live_ocr
    }

    /// Render the panel and run one iteration of the sampling loop.
    /// `on_point` receives each newly filtered coordinate.
    pub fn ui(&mut self, ui: &mut Ui, on_point: &mut dyn FnMut(PathPoint)) {
        self.controls(ui);

        if self.session.is_capturing() && !self.session.grab_frame() {
            // Stream ended underneath us; grab_frame already ran the reset.
            self.live_ocr = false;
            self.sampler.reset();
            self.status = "Screen capture ended.".to_string();
        }

        self.preview_canvas(ui);

        if self.live_ocr {
            self.sample_once(on_point);
        }

        let line = if self.live_ocr && !self.sampler.status().is_empty() {
            self.sampler.status()
        } else {
            &self.status
        };
        ui.label(egui::RichText::new(line).italics().weak());

        // The preview is a continuous frame loop while the stream is live.
        if self.session.is_capturing() {
            ui.ctx().request_repaint();
        }
    }

    fn controls(&mut self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            let start = ui.add_enabled(
                !self.session.is_capturing(),
                egui::Button::new("Start screen capture"),
            );
            if start.clicked() {
                self.start_capture();
            }

            let can_clear = self.session.is_capturing()
                && self.session.region.has_area()
                && !self.live_ocr;
            if ui
                .add_enabled(can_clear, egui::Button::new("Clear selection"))
                .clicked()
            {
                self.session.region.reset();
                self.status =
                    "Selection cleared. Drag on the preview to select a new region.".to_string();
            }

            let can_toggle =
                self.session.is_capturing() && self.session.region.is_valid_for_ocr();
            let label = if self.live_ocr {
                "Stop live OCR"
            } else {
                "Start live OCR"
            };
            if ui
                .add_enabled(can_toggle || self.live_ocr, egui::Button::new(label))
                .clicked()
            {
                if self.live_ocr {
                    self.live_ocr = false;
                    self.status = "Live OCR stopped.".to_string();
                } else {
                    self.live_ocr = true;
                    self.status = "Live OCR started.".to_string();
                }
            }
        });
    }

    fn start_capture(&mut self) {
        match ScreenSource::primary() {
            Ok(source) => {
                self.session.start(Box::new(source));
                self.sampler.reset();
                self.live_ocr = false;
                self.status =
                    "Capture started. Drag on the preview to select the coordinate readout."
                        .to_string();
            }
            Err(err) => {
                warn!(error = %err, "failed to start screen capture");
                self.session.stop();
                self.sampler.reset();
                self.live_ocr = false;
                self.status = format!("Error: {err}");
            }
        }
    }

    fn preview_canvas(&mut self, ui: &mut Ui) {
        let Some(frame) = self.session.frame() else {
            let size = egui::vec2(ui.available_width().min(PREVIEW_MAX_WIDTH), 180.0);
            let (_, painter) = ui.allocate_painter(size, Sense::hover());
            painter.rect_filled(painter.clip_rect(), 2.0, Color32::from_gray(0xe9));
            painter.text(
                painter.clip_rect().center(),
                Align2::CENTER_CENTER,
                "Start screen capture to begin.",
                FontId::proportional(16.0),
                Color32::from_gray(0x55),
            );
            return;
        };

        let native = [frame.width() as usize, frame.height() as usize];
        let pixels = ColorImage::from_rgba_unmultiplied(native, frame.as_raw());
        match &mut self.preview {
            Some(texture) => texture.set(pixels, TextureOptions::LINEAR),
            None => {
                self.preview =
                    Some(ui.ctx()
                        .load_texture("capture-preview", pixels, TextureOptions::LINEAR));
            }
        }
        let Some(texture) = &self.preview else { return };

        let shown_w = ui.available_width().min(PREVIEW_MAX_WIDTH);
        let aspect = native[1] as f32 / native[0] as f32;
        let size = egui::vec2(shown_w, shown_w * aspect);
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let rect = response.rect;
        painter.image(
            texture.id(),
            rect,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        // Preview pixels to the frame's native pixel space.
        let scale = native[0] as f64 / rect.width() as f64;
        if !self.live_ocr {
            if response.drag_started() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let (x, y) = to_native(pos, rect, scale);
                    self.session.region.begin(x, y);
                }
            }
            if response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let (x, y) = to_native(pos, rect, scale);
                    self.session.region.update(x, y);
                }
            }
            if response.drag_stopped() {
                self.session.region.finish();
                self.status = if self.session.region.is_valid_for_ocr() {
                    "Region selected. Click \"Start live OCR\".".to_string()
                } else if self.session.region.has_area() {
                    "Selection too small. Re-select a larger region.".to_string()
                } else {
                    "Drag on the preview to select a region.".to_string()
                };
            }
        }

        let region = &self.session.region;
        if region.has_area() {
            let min = Pos2::new(
                rect.left() + (region.x / scale) as f32,
                rect.top() + (region.y / scale) as f32,
            );
            let overlay = Rect::from_min_size(
                min,
                egui::vec2((region.width / scale) as f32, (region.height / scale) as f32),
            );
            painter.rect_stroke(overlay, 0.0, Stroke::new(3.0, Color32::RED));
        }
    }

    fn sample_once(&mut self, on_point: &mut dyn FnMut(PathPoint)) {
        let now = Instant::now();
        if self.sampler.ready_to_sample(now) && self.session.region.is_valid_for_ocr() {
            if let Some(crop) = self.session.crop_region() {
                if let Err(err) = self.sampler.submit(self.session.generation(), &crop, now) {
                    warn!(error = %err, "failed to submit OCR sample");
                    self.status = "OCR sample failed to submit.".to_string();
                }
            }
        }
        if let Some((long, lat)) = self.sampler.poll(self.session.generation()) {
            on_point(PathPoint::new(lat, long));
        }
    }
}

fn to_native(pos: Pos2, rect: Rect, scale: f64) -> (f64, f64) {
    (
        (pos.x - rect.left()) as f64 * scale,
        (pos.y - rect.top()) as f64 * scale,
    )
}
