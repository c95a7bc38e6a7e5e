use std::path::PathBuf;

use mlp::TrainingConfig;

/// File the trained classifier is persisted to, relative to the working
/// directory.
pub const DEFAULT_MODEL_PATH: &str = "mnist_model.bin";

/// Geometry and colors of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasConfig {
    /// Side length of the square bitmap, in pixels.
    pub size: u32,
    /// Radius of the disc stamped at each pointer sample.
    pub brush_radius: u32,
    /// Intensity of an empty pixel.
    pub background: u8,
    /// Intensity painted by strokes.
    pub ink: u8,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            size: 280,
            brush_radius: 8,
            background: 0,
            ink: 255,
        }
    }
}

/// Everything the application needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub canvas: CanvasConfig,
    pub training: TrainingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            canvas: CanvasConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}
