use crate::canvas::Canvas;
use crate::classifier::{Classifier, Prediction};
use crate::config::CanvasConfig;
use crate::error::PipelineError;
use crate::pipeline;

/// Where the user is in the draw/predict/clear cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Idle,
    /// A stroke is in progress; `last` is the previous pointer sample.
    Drawing { last: (f32, f32) },
}

/// One drawing session: the canvas, the brush, and the most recent
/// prediction.
#[derive(Debug, Clone)]
pub struct Session {
    canvas: Canvas,
    brush_radius: f32,
    ink: u8,
    state: SessionState,
    last_prediction: Option<Prediction>,
    revision: u64,
}

impl Session {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            canvas: Canvas::from_config(config),
            brush_radius: config.brush_radius as f32,
            ink: config.ink,
            state: SessionState::Idle,
            last_prediction: None,
            revision: 0,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_prediction(&self) -> Option<&Prediction> {
        self.last_prediction.as_ref()
    }

    /// Increases every time the bitmap changes, so views can tell when to
    /// refresh.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Starts a stroke at `point`, painting a single disc there.
    pub fn begin_stroke(&mut self, point: (f32, f32)) {
        self.canvas.paint_disc(point.0, point.1, self.brush_radius, self.ink);
        self.state = SessionState::Drawing { last: point };
        self.revision += 1;
    }

    /// Continues the current stroke to `point`, joining it to the previous
    /// sample. Starts a new stroke when none is in progress.
    pub fn extend_stroke(&mut self, point: (f32, f32)) {
        match self.state {
            SessionState::Drawing { last } => {
                self.canvas.paint_segment(last, point, self.brush_radius, self.ink);
                self.state = SessionState::Drawing { last: point };
                self.revision += 1;
            }
            SessionState::Idle => self.begin_stroke(point),
        }
    }

    pub fn end_stroke(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Classifies the current drawing and remembers the result.
    ///
    /// Any open stroke is finished first. On error the previous prediction
    /// is kept.
    pub fn predict(&mut self, classifier: &dyn Classifier) -> Result<Prediction, PipelineError> {
        self.end_stroke();
        let prediction = pipeline::predict(classifier, &self.canvas)?;
        self.last_prediction = Some(prediction);
        Ok(prediction)
    }

    /// Wipes the canvas and forgets the last prediction.
    pub fn clear(&mut self) {
        self.canvas.clear();
        self.last_prediction = None;
        self.state = SessionState::Idle;
        self.revision += 1;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}
