use crate::ui;

use digits::{CanvasConfig, Classifier, Session};
use ecolor::Hsva;
use eframe::egui::{self, Color32};
use eframe::{App, Frame};

/// The main application struct.
/// It owns the drawing session and the classifier, and delegates drawing to
/// the `ui` module.
pub struct DigitApp {
    pub session: Session,
    pub classifier: Box<dyn Classifier>,
    /// Message from the last failed prediction, shown until the next attempt.
    pub last_error: Option<String>,
    /// The canvas uploaded to the GPU, with the session revision it shows.
    pub canvas_texture: Option<(egui::TextureHandle, u64)>,
}

impl DigitApp {
    pub fn new(canvas: &CanvasConfig, classifier: Box<dyn Classifier>) -> Self {
        log::info!("Using classifier {}", classifier.name());
        Self {
            session: Session::new(canvas),
            classifier,
            last_error: None,
            canvas_texture: None,
        }
    }

    pub fn predict(&mut self) {
        match self.session.predict(&*self.classifier) {
            Ok(prediction) => {
                log::info!(
                    "Predicted {} with {:.1}% confidence",
                    prediction.digit(),
                    prediction.confidence() * 100.0
                );
                self.last_error = None;
            }
            Err(e) => {
                log::error!("Prediction failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    pub fn clear(&mut self) {
        self.session.clear();
        self.last_error = None;
    }

    /// A stable, well separated color for each digit's bar.
    pub fn digit_color(digit: usize) -> Color32 {
        let golden_ratio_conjugate = 0.618_034_f32;
        let hue = (digit as f32 * golden_ratio_conjugate).fract();
        Color32::from(Hsva { h: hue, s: 0.75, v: 0.9, a: 1.0 })
    }
}

impl App for DigitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        ui::draw_side_panel(self, ctx);
        ui::draw_central_panel(self, ctx);
    }
}
