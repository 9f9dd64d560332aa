use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use cordex::capture::panel::CapturePanel;
use cordex::capture::sampler::SampleConfig;
use cordex::gui::CordexApp;
use cordex::logging;
use cordex::map::layers::FsImageLoader;
use cordex::map::view::MapView;
use cordex::ocr::TesseractCli;
use cordex::settings::Settings;

const SETTINGS_FILE: &str = "settings.json";

fn main() -> anyhow::Result<()> {
    let settings = Settings::load(SETTINGS_FILE)?;
    logging::init(settings.debug_logging);

    let loader = Arc::new(FsImageLoader {
        base_dir: settings.assets_dir(),
    });
    let map_view = MapView::new(loader);

    let config = SampleConfig {
        interval: Duration::from_millis(settings.ocr_interval_ms),
        long_range: settings.ocr_long_range,
        lat_range: settings.ocr_lat_range,
        buffer_size: settings.ocr_buffer_size,
    };
    let capture = CapturePanel::new(Box::new(TesseractCli::default()), config)?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    let app = CordexApp::new(settings, SETTINGS_FILE.to_string(), map_view, capture);
    eframe::run_native(
        "Cordex",
        native_options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| anyhow::anyhow!("failed to start ui: {e}"))
}
