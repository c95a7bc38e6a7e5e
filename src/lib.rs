//! Handwritten digit recognition: a drawing canvas, the preprocessing that
//! turns it into an MNIST-style image, and a provider that loads or trains
//! the classifier behind it.

// Include submodules
mod canvas;
mod classifier;
mod config;
mod error;
pub mod pipeline;
mod provider;
mod session;

// Re-export types from submodules
pub use canvas::Canvas;
pub use classifier::{Classifier, DigitClassifier, INPUT_SHAPE, Prediction};
pub use config::{AppConfig, CanvasConfig, DEFAULT_MODEL_PATH};
pub use error::{PipelineError, ProviderError};
pub use pipeline::{downsample, predict};
pub use provider::{MnistSource, ModelOrigin, ModelProvider, TrainingData, TrainingSource};
pub use session::{Session, SessionState};

pub use digits_helpers::{IMAGE_PIXELS, IMAGE_SIDE, NUM_CLASSES};
pub use mlp::TrainingConfig;
