use crate::app::DigitApp;

use digits::{NUM_CLASSES, Prediction};
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, vec2};

const CHART_HEIGHT: f32 = 180.0;

/// Draws the left-side panel: controls, the predicted digit and the
/// probability chart.
pub fn draw_side_panel(app: &mut DigitApp, ctx: &egui::Context) {
    egui::SidePanel::left("controls_panel")
        .exact_width(330.0)
        .show(ctx, |ui| {
            ui.heading("AI Digit Recognizer");
            ui.separator();

            ui.label("Draw a digit and click Predict");
            ui.label("Please draw it big as it is rescaled to 28x28");
            ui.horizontal(|ui| {
                if ui.button("Predict").clicked() {
                    app.predict();
                }
                if ui.button("Clear").clicked() {
                    app.clear();
                }
            });
            ui.separator();

            if let Some(error) = &app.last_error {
                ui.colored_label(Color32::RED, format!("Error: {error}"));
            }
            match app.session.last_prediction() {
                Some(prediction) => {
                    ui.label(
                        egui::RichText::new(format!("Prediction: {}", prediction.digit()))
                            .size(22.0)
                            .strong(),
                    );
                    ui.label(format!("Confidence: {:.1}%", prediction.confidence() * 100.0));
                }
                None => {
                    ui.label("Prediction: -");
                }
            }
            ui.separator();

            draw_probability_chart(ui, app.session.last_prediction());
        });
}

/// Draws the central panel holding the drawing canvas and handles strokes.
pub fn draw_central_panel(app: &mut DigitApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let canvas = app.session.canvas();
        let (width, height) = (canvas.width() as f32, canvas.height() as f32);

        // Re-upload the bitmap only when the session has changed it.
        let revision = app.session.revision();
        let stale = !matches!(&app.canvas_texture, Some((_, r)) if *r == revision);
        if stale {
            let image = egui::ColorImage::from_gray(
                [canvas.width() as usize, canvas.height() as usize],
                canvas.image().as_raw(),
            );
            match &mut app.canvas_texture {
                Some((texture, r)) => {
                    texture.set(image, egui::TextureOptions::NEAREST);
                    *r = revision;
                }
                None => {
                    let texture = ctx.load_texture("canvas", image, egui::TextureOptions::NEAREST);
                    app.canvas_texture = Some((texture, revision));
                }
            }
        }

        let (response, painter) = ui.allocate_painter(vec2(width, height), Sense::drag());
        let bitmap_rect = Rect::from_min_size(Pos2::ZERO, vec2(width, height));
        let to_bitmap = egui::emath::RectTransform::from_to(response.rect, bitmap_rect);

        if let Some((texture, _)) = &app.canvas_texture {
            painter.image(
                texture.id(),
                response.rect,
                Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        painter.rect_stroke(
            response.rect,
            0.0,
            Stroke::new(1.0, Color32::GRAY),
            egui::StrokeKind::Outside,
        );

        // --- Interaction Handling ---
        if let Some(pointer) = response.interact_pointer_pos() {
            let p = to_bitmap * pointer;
            if response.drag_started() {
                app.session.begin_stroke((p.x, p.y));
            } else if response.dragged() {
                app.session.extend_stroke((p.x, p.y));
            }
        }
        if response.drag_stopped() {
            app.session.end_stroke();
        }
    });
}

/// One bar per digit on a 0-100% axis.
fn draw_probability_chart(ui: &mut Ui, prediction: Option<&Prediction>) {
    ui.label("Probabilities");
    let width = ui.available_width();
    let (response, painter) = ui.allocate_painter(vec2(width, CHART_HEIGHT), Sense::hover());
    let rect = response.rect;

    // Leave room for tick labels on the left and digit labels underneath.
    let plot = Rect::from_min_max(
        Pos2::new(rect.left() + 36.0, rect.top() + 6.0),
        Pos2::new(rect.right() - 4.0, rect.bottom() - 18.0),
    );
    let axis = Stroke::new(1.0, Color32::GRAY);
    let font = FontId::proportional(11.0);
    let text_color = ui.visuals().text_color();

    for tick in (0..=100).step_by(20) {
        let y = egui::remap(tick as f32, 0.0..=100.0, plot.bottom()..=plot.top());
        painter.line_segment(
            [Pos2::new(plot.left(), y), Pos2::new(plot.right(), y)],
            Stroke::new(0.5, Color32::from_gray(70)),
        );
        painter.text(
            Pos2::new(plot.left() - 4.0, y),
            Align2::RIGHT_CENTER,
            format!("{tick}%"),
            font.clone(),
            text_color,
        );
    }
    painter.line_segment([plot.left_bottom(), plot.right_bottom()], axis);
    painter.line_segment([plot.left_bottom(), plot.left_top()], axis);

    let slot = plot.width() / NUM_CLASSES as f32;
    for digit in 0..NUM_CLASSES {
        let x = plot.left() + slot * digit as f32;
        let center = x + slot / 2.0;
        if let Some(prediction) = prediction {
            let p = prediction.probabilities()[digit].clamp(0.0, 1.0);
            let top = egui::remap(p, 0.0..=1.0, plot.bottom()..=plot.top());
            let bar = Rect::from_min_max(
                Pos2::new(x + slot * 0.15, top),
                Pos2::new(x + slot * 0.85, plot.bottom()),
            );
            painter.rect_filled(bar, 0.0, DigitApp::digit_color(digit));
        }
        painter.text(
            Pos2::new(center, plot.bottom() + 3.0),
            Align2::CENTER_TOP,
            digit.to_string(),
            font.clone(),
            text_color,
        );
    }
}
