use mlp::{CheckpointError, MlpError};
use mnist_data::DatasetError;
use thiserror::Error;

/// Errors raised while turning a canvas into a prediction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The model input does not have the `[batch, 28, 28, 1]` layout.
    #[error("input shape mismatch: expected {expected:?}, got {actual:?}")]
    InputShape { expected: Vec<usize>, actual: Vec<usize> },

    /// The classifier produced something other than one distribution per
    /// sample.
    #[error("classifier returned {actual} values per sample, expected {expected}")]
    OutputShape { expected: usize, actual: usize },

    /// A network whose input or output width does not fit digit images.
    #[error(
        "model maps {input_dim} inputs to {num_classes} classes, \
         expected {expected_input} to {expected_classes}"
    )]
    IncompatibleModel {
        input_dim: usize,
        num_classes: usize,
        expected_input: usize,
        expected_classes: usize,
    },

    #[error(transparent)]
    Model(#[from] MlpError),
}

/// Errors raised while loading or training the classifier at startup.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("could not read persisted model: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("could not load training data: {0}")]
    Dataset(#[from] DatasetError),

    #[error("training failed: {0}")]
    Training(#[from] MlpError),

    #[error(transparent)]
    Classifier(#[from] PipelineError),
}
