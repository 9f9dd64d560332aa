use eframe::egui::{self, CentralPanel, ComboBox, ScrollArea, SidePanel, TextEdit};
use tracing::warn;

use crate::capture::panel::CapturePanel;
use crate::map::compositor::SceneContent;
use crate::map::model::{MapShape, PathPoint, TrackPath};
use crate::map::view::MapView;
use crate::settings::{MapStyle, Settings};
use crate::world;

/// Color used for the live-tracked position marker.
const TRACKED_COLOR: [u8; 3] = [0, 0, 0];

pub struct CordexApp {
    settings: Settings,
    settings_path: String,
    map_view: MapView,
    capture: CapturePanel,
    /// Points the user plotted by hand via the coordinate entry box.
    user_path: TrackPath,
    /// Single point mirroring the latest filtered OCR reading.
    tracked_path: TrackPath,
    shapes: Vec<MapShape>,
    coord_entry: String,
}

impl CordexApp {
    pub fn new(
        settings: Settings,
        settings_path: String,
        map_view: MapView,
        capture: CapturePanel,
    ) -> Self {
        let mut tracked_path = TrackPath::default();
        tracked_path.color = Some(TRACKED_COLOR);
        tracked_path.name = Some("Tracked".to_string());
        Self {
            settings,
            settings_path,
            map_view,
            capture,
            user_path: TrackPath::default(),
            tracked_path,
            shapes: Vec::new(),
            coord_entry: String::new(),
        }
    }

    fn persist_settings(&self) {
        if let Err(e) = self.settings.save(&self.settings_path) {
            warn!("failed to save settings: {e}");
        }
    }

    fn preferences_ui(&mut self, ui: &mut egui::Ui) {
        let mut changed = false;

        ui.heading("Map");
        ComboBox::from_label("Style")
            .selected_text(self.settings.map_style.to_string())
            .show_ui(ui, |ui| {
                for style in [MapStyle::Light, MapStyle::Dark, MapStyle::Satellite] {
                    changed |= ui
                        .selectable_value(&mut self.settings.map_style, style, style.to_string())
                        .changed();
                }
            });

        changed |= ui
            .checkbox(&mut self.settings.water_overlay, "Water")
            .changed();
        changed |= ui.checkbox(&mut self.settings.mud_overlay, "Mud").changed();
        changed |= ui
            .checkbox(&mut self.settings.sanctuary_overlay, "Sanctuaries")
            .changed();
        changed |= ui
            .checkbox(&mut self.settings.structure_overlay, "Structures")
            .changed();
        changed |= ui
            .checkbox(&mut self.settings.migration_overlay, "Migration zones")
            .changed();
        changed |= ui
            .checkbox(&mut self.settings.gridlines, "Gridlines")
            .changed();
        changed |= ui
            .checkbox(&mut self.settings.location_labels, "Location labels")
            .changed();

        if changed {
            self.persist_settings();
        }

        ui.separator();
        ui.heading("Plot a point");
        let response = ui.add(
            TextEdit::singleline(&mut self.coord_entry)
                .hint_text("(Lat: -12,345 Long: 98,765 Alt: ...)"),
        );
        let submitted =
            response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Add point").clicked() || submitted {
            match world::parse_location(&self.coord_entry) {
                Some(point) => {
                    self.user_path.points.push(point);
                    self.user_path.enabled = true;
                    self.coord_entry.clear();
                }
                None => {
                    warn!("unrecognized coordinate entry: {:?}", self.coord_entry);
                }
            }
        }
        if !self.user_path.points.is_empty() && ui.button("Clear path").clicked() {
            self.user_path.points.clear();
        }

        ui.separator();
        ui.heading("Live tracking");
        let tracked = &mut self.tracked_path;
        let mut on_point = |point: PathPoint| {
            tracked.points = vec![point];
            tracked.enabled = true;
        };
        self.capture.ui(ui, &mut on_point);
        if !self.capture.is_live() && !self.tracked_path.points.is_empty() {
            if ui.button("Clear tracked point").clicked() {
                self.tracked_path.points.clear();
            }
        }
    }
}

impl eframe::App for CordexApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        SidePanel::left("preferences")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                ScrollArea::vertical().show(ui, |ui| self.preferences_ui(ui));
            });

        let layers = world::layer_stack(&self.settings);
        let texts = if self.settings.location_labels {
            world::location_labels()
        } else {
            Vec::new()
        };
        let paths = [self.user_path.clone(), self.tracked_path.clone()];

        CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let content = SceneContent {
                    layers: &layers,
                    shapes: &self.shapes,
                    texts: &texts,
                    paths: &paths,
                    draw_grid: self.settings.gridlines,
                };
                self.map_view.ui(ui, &content);
            });
    }
}
