mod app;
mod ui;

use app::DigitApp;
use digits::{AppConfig, ModelProvider};
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::default();
    // Blocks until a model is loaded, or trained when none is usable.
    let classifier = ModelProvider::from_config(&config)
        .get_classifier()
        .inspect_err(|e| log::error!("Could not provide a classifier: {e}"))?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([680.0, 440.0]),
        ..Default::default()
    };
    eframe::run_native(
        "AI Digit Recognizer",
        native_options,
        Box::new(move |_cc| Ok(Box::new(DigitApp::new(&config.canvas, Box::new(classifier))))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the UI: {e}"))
}
