use digits_helpers::{IMAGE_PIXELS, IMAGE_SIDE, NUM_CLASSES, argmax};
use mlp::Mlp;
use ndarray::{Array2, ArrayView4};

use crate::error::PipelineError;

/// Shape of one model input: `[batch, height, width, channels]`.
pub const INPUT_SHAPE: [usize; 4] = [1, IMAGE_SIDE, IMAGE_SIDE, 1];

/// A function from digit images to label probabilities.
pub trait Classifier {
    /// Probabilities for a batch of `[batch, 28, 28, 1]` images, one row of
    /// ten per image.
    fn predict_batch(&self, images: ArrayView4<f32>) -> Result<Array2<f32>, PipelineError>;

    /// Short human-readable description, shown in the UI.
    fn name(&self) -> String;
}

/// The trained network behind the digit recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitClassifier {
    model: Mlp<f32>,
}

impl DigitClassifier {
    /// Wraps `model` after checking it maps 784 pixels to 10 digits.
    pub fn new(model: Mlp<f32>) -> Result<Self, PipelineError> {
        if model.input_dim() != IMAGE_PIXELS || model.num_classes() != NUM_CLASSES {
            return Err(PipelineError::IncompatibleModel {
                input_dim: model.input_dim(),
                num_classes: model.num_classes(),
                expected_input: IMAGE_PIXELS,
                expected_classes: NUM_CLASSES,
            });
        }
        Ok(Self { model })
    }

    pub fn model(&self) -> &Mlp<f32> {
        &self.model
    }

    pub fn into_inner(self) -> Mlp<f32> {
        self.model
    }
}

impl Classifier for DigitClassifier {
    fn predict_batch(&self, images: ArrayView4<f32>) -> Result<Array2<f32>, PipelineError> {
        let (batch, h, w, c) = images.dim();
        if (h, w, c) != (IMAGE_SIDE, IMAGE_SIDE, 1) {
            return Err(PipelineError::InputShape {
                expected: INPUT_SHAPE.to_vec(),
                actual: images.shape().to_vec(),
            });
        }
        // Flatten each image row-major, matching how the network was trained.
        let flat = Array2::from_shape_vec((batch, IMAGE_PIXELS), images.iter().copied().collect())
            .map_err(|_| PipelineError::InputShape {
                expected: INPUT_SHAPE.to_vec(),
                actual: images.shape().to_vec(),
            })?;
        Ok(self.model.predict_proba(flat.view())?)
    }

    fn name(&self) -> String {
        format!(
            "MLP 784-{}-10 (dropout {})",
            self.model.config().hidden_units,
            self.model.config().dropout
        )
    }
}

/// A probability for each digit 0 through 9.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    probabilities: [f32; NUM_CLASSES],
}

impl Prediction {
    /// Builds a prediction from classifier output.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::OutputShape` unless exactly ten values are
    /// given.
    pub fn from_slice(values: &[f32]) -> Result<Self, PipelineError> {
        let probabilities: [f32; NUM_CLASSES] =
            values.try_into().map_err(|_| PipelineError::OutputShape {
                expected: NUM_CLASSES,
                actual: values.len(),
            })?;
        Ok(Self { probabilities })
    }

    pub fn probabilities(&self) -> &[f32; NUM_CLASSES] {
        &self.probabilities
    }

    /// The most likely digit.
    pub fn digit(&self) -> usize {
        argmax(ndarray::aview1(&self.probabilities)).unwrap_or(0)
    }

    /// Probability of [`Prediction::digit`].
    pub fn confidence(&self) -> f32 {
        self.probabilities[self.digit()]
    }
}
