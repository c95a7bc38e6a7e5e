//! A small feed-forward classifier trained with mini-batch Adam.
//!
//! The network is `input → dense + ReLU → dropout → dense + softmax`. It is
//! trained on labeled [`DataPoint`]s whose labels are class indices, and can
//! be persisted with the [`checkpoint`] module.
//!
//! [`DataPoint`]: digits_helpers::DataPoint

pub mod checkpoint;
mod config;
mod layer;
mod loss;
mod network;
mod optim;

pub use checkpoint::{CheckpointError, load_checkpoint, save_checkpoint};
pub use config::{AdamConfig, TrainingConfig};
pub use layer::Dense;
pub use network::{EpochMetrics, History, Mlp};

use thiserror::Error;

/// Errors raised while building, training or running an [`Mlp`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MlpError {
    /// A hyperparameter is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Training or evaluation was asked to run on no samples.
    #[error("dataset is empty")]
    EmptyDataSet,
    /// An input has the wrong number of features.
    #[error("dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// A training label does not name one of the output classes.
    #[error("label {label} is out of range for {num_classes} classes")]
    LabelOutOfRange { label: usize, num_classes: usize },
}
