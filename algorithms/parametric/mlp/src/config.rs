use serde::{Deserialize, Serialize};

use crate::MlpError;

/// Adam optimizer hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    pub beta_1: f64,
    pub beta_2: f64,
    /// Added to the denominator for numerical stability.
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-7,
        }
    }
}

/// Architecture and training hyperparameters.
///
/// The config travels with the weights inside a checkpoint, so a loaded
/// model knows how it was trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Width of the hidden dense layer.
    pub hidden_units: usize,
    /// Probability of zeroing a hidden activation during training.
    pub dropout: f64,
    /// Full passes over the training set.
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub adam: AdamConfig,
    /// Seed for weight initialization, shuffling and dropout masks.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hidden_units: 512,
            dropout: 0.2,
            epochs: 8,
            batch_size: 32,
            learning_rate: 1e-3,
            adam: AdamConfig::default(),
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_hidden_units(mut self, hidden_units: usize) -> Self {
        self.hidden_units = hidden_units;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks every hyperparameter is usable.
    pub fn validate(&self) -> Result<(), MlpError> {
        if self.hidden_units == 0 {
            return Err(MlpError::InvalidConfig("hidden_units must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(MlpError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if self.epochs == 0 {
            return Err(MlpError::InvalidConfig("epochs must be > 0".into()));
        }
        if self.batch_size == 0 {
            return Err(MlpError::InvalidConfig("batch_size must be > 0".into()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(MlpError::InvalidConfig(format!(
                "learning_rate must be > 0, got {}",
                self.learning_rate
            )));
        }
        let AdamConfig { beta_1, beta_2, epsilon } = self.adam;
        if !(0.0..1.0).contains(&beta_1) || !(0.0..1.0).contains(&beta_2) || !(epsilon > 0.0) {
            return Err(MlpError::InvalidConfig(
                "adam betas must be in [0, 1) and epsilon > 0".into(),
            ));
        }
        Ok(())
    }
}
