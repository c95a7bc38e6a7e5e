use digits_helpers::{DataPoint, Float, argmax, relu, relu_grad_mask, softmax_rows};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::layer::Dense;
use crate::loss::{cross_entropy, cross_entropy_grad};
use crate::optim::Adam;
use crate::MlpError;

/// Loss and accuracy after one epoch of training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochMetrics<F> {
    /// 1-based epoch number.
    pub epoch: usize,
    pub train_loss: F,
    pub train_accuracy: F,
    pub val_loss: Option<F>,
    pub val_accuracy: Option<F>,
}

/// Per-epoch metrics collected by [`Mlp::fit`].
#[derive(Debug, Clone, Default)]
pub struct History<F> {
    pub epochs: Vec<EpochMetrics<F>>,
}

impl<F: Copy> History<F> {
    pub fn last(&self) -> Option<EpochMetrics<F>> {
        self.epochs.last().copied()
    }
}

/// A two-layer perceptron classifier.
///
/// Inputs are flattened feature vectors; outputs are softmax probabilities
/// over `num_classes` labels. Dropout on the hidden layer is only active
/// inside [`Mlp::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "F: Serialize + DeserializeOwned")]
pub struct Mlp<F: Float> {
    config: TrainingConfig,
    hidden: Dense<F>,
    output: Dense<F>,
}

impl<F> Mlp<F>
where
    F: Float,
{
    /// Creates an untrained network with weights drawn from `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns `MlpError::InvalidConfig` if a dimension is zero or a
    /// hyperparameter is out of range.
    pub fn new(
        input_dim: usize,
        num_classes: usize,
        config: TrainingConfig,
    ) -> Result<Self, MlpError> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        Self::with_rng(input_dim, num_classes, config, &mut rng)
    }

    /// Creates an untrained network drawing initial weights from `rng`.
    pub fn with_rng<R: Rng>(
        input_dim: usize,
        num_classes: usize,
        config: TrainingConfig,
        rng: &mut R,
    ) -> Result<Self, MlpError> {
        if input_dim == 0 {
            return Err(MlpError::InvalidConfig("input dimension must be > 0".into()));
        }
        if num_classes < 2 {
            return Err(MlpError::InvalidConfig("need at least two classes".into()));
        }
        config.validate()?;

        let hidden = Dense::new(input_dim, config.hidden_units, rng);
        let output = Dense::new(config.hidden_units, num_classes, rng);
        Ok(Self { config, hidden, output })
    }

    pub fn input_dim(&self) -> usize {
        self.hidden.inputs()
    }

    pub fn num_classes(&self) -> usize {
        self.output.outputs()
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// True when every layer's shape agrees with its neighbours.
    pub fn is_consistent(&self) -> bool {
        self.hidden.is_consistent()
            && self.output.is_consistent()
            && self.hidden.outputs() == self.output.inputs()
    }

    /// Class probabilities for a batch of inputs, one row per sample.
    ///
    /// # Errors
    ///
    /// Returns `MlpError::DimensionMismatch` if `inputs` does not have
    /// `input_dim()` columns.
    pub fn predict_proba(&self, inputs: ArrayView2<F>) -> Result<Array2<F>, MlpError> {
        self.check_dim(inputs.ncols())?;
        let hidden = relu(self.hidden.forward(inputs).view());
        let mut probs = self.output.forward(hidden.view());
        softmax_rows(&mut probs);
        Ok(probs)
    }

    /// Predicted class index for a single feature vector.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<usize, MlpError> {
        let batch = features.insert_axis(Axis(0));
        let probs = self.predict_proba(batch)?;
        // A validated network always has at least two classes.
        Ok(argmax(probs.row(0)).unwrap_or(0))
    }

    /// Mean loss and accuracy over `data`, without dropout.
    pub fn evaluate(&self, data: &[DataPoint<usize, F>]) -> Result<(F, F), MlpError> {
        if data.is_empty() {
            return Err(MlpError::EmptyDataSet);
        }
        let mut loss_sum = F::zero();
        let mut correct = 0usize;
        let indices: Vec<usize> = (0..data.len()).collect();
        for chunk in indices.chunks(self.config.batch_size.max(256)) {
            let (x, labels) = self.stack(data, chunk)?;
            let probs = self.predict_proba(x.view())?;
            let batch = F::from_f64_lossy(labels.len() as f64);
            loss_sum += cross_entropy(probs.view(), &labels) * batch;
            correct += count_correct(probs.view(), &labels);
        }
        let n = F::from_f64_lossy(data.len() as f64);
        Ok((loss_sum / n, F::from_f64_lossy(correct as f64) / n))
    }

    /// Trains the network with mini-batch Adam for `config.epochs` epochs.
    ///
    /// When `validation` is given it is evaluated after every epoch; it never
    /// influences the weights.
    ///
    /// # Errors
    ///
    /// Returns `MlpError::EmptyDataSet` for an empty training set, and
    /// `DimensionMismatch`/`LabelOutOfRange` for malformed samples.
    pub fn fit(
        &mut self,
        train: &[DataPoint<usize, F>],
        validation: Option<&[DataPoint<usize, F>]>,
    ) -> Result<History<F>, MlpError> {
        if train.is_empty() {
            return Err(MlpError::EmptyDataSet);
        }
        // Offset the seed so shuffling does not replay the init stream.
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed.wrapping_add(1));
        let mut adam = Adam::new(
            self.config.adam,
            self.config.learning_rate,
            &self.hidden,
            &self.output,
        );
        let mut order: Vec<usize> = (0..train.len()).collect();
        let mut history = History::default();

        for epoch in 1..=self.config.epochs {
            order.shuffle(&mut rng);

            let mut loss_sum = F::zero();
            let mut correct = 0usize;
            for chunk in order.chunks(self.config.batch_size) {
                let (x, labels) = self.stack(train, chunk)?;
                let (loss, hits) = self.train_batch(x.view(), &labels, &mut adam, &mut rng);
                loss_sum += loss * F::from_f64_lossy(labels.len() as f64);
                correct += hits;
            }

            let n = F::from_f64_lossy(train.len() as f64);
            let (val_loss, val_accuracy) = match validation {
                Some(val) if !val.is_empty() => {
                    let (loss, acc) = self.evaluate(val)?;
                    (Some(loss), Some(acc))
                }
                _ => (None, None),
            };
            let metrics = EpochMetrics {
                epoch,
                train_loss: loss_sum / n,
                train_accuracy: F::from_f64_lossy(correct as f64) / n,
                val_loss,
                val_accuracy,
            };
            log_epoch(&metrics, self.config.epochs);
            history.epochs.push(metrics);
        }

        Ok(history)
    }

    /// One forward/backward pass with dropout, followed by an Adam update.
    /// Returns the batch loss and the number of correct predictions.
    fn train_batch<R: Rng>(
        &mut self,
        x: ArrayView2<F>,
        labels: &[usize],
        adam: &mut Adam<F>,
        rng: &mut R,
    ) -> (F, usize) {
        let z1 = self.hidden.forward(x);
        let a1 = relu(z1.view());
        let mask = dropout_mask(a1.dim(), self.config.dropout, rng);
        let h = &a1 * &mask;

        let mut probs = self.output.forward(h.view());
        softmax_rows(&mut probs);
        let loss = cross_entropy(probs.view(), labels);
        let hits = count_correct(probs.view(), labels);

        let grad_logits = cross_entropy_grad(probs.view(), labels);
        let (output_grads, grad_h) = self.output.backward(h.view(), grad_logits.view());
        let grad_z1 = grad_h * &mask * &relu_grad_mask(z1.view());
        let (hidden_grads, _) = self.hidden.backward(x, grad_z1.view());

        adam.update(&mut self.hidden, &hidden_grads, &mut self.output, &output_grads);
        (loss, hits)
    }

    /// Gathers the samples at `indices` into a feature matrix and label list.
    fn stack(
        &self,
        data: &[DataPoint<usize, F>],
        indices: &[usize],
    ) -> Result<(Array2<F>, Vec<usize>), MlpError> {
        let dim = self.input_dim();
        let mut x = Array2::zeros((indices.len(), dim));
        let mut labels = Vec::with_capacity(indices.len());
        for (row, &i) in indices.iter().enumerate() {
            let point = &data[i];
            self.check_dim(point.dim())?;
            if point.label >= self.num_classes() {
                return Err(MlpError::LabelOutOfRange {
                    label: point.label,
                    num_classes: self.num_classes(),
                });
            }
            x.row_mut(row).assign(&point.features);
            labels.push(point.label);
        }
        Ok((x, labels))
    }

    fn check_dim(&self, actual: usize) -> Result<(), MlpError> {
        let expected = self.input_dim();
        if actual != expected {
            return Err(MlpError::DimensionMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Inverted dropout: kept units are scaled by `1 / (1 - rate)` so the
/// expected activation is unchanged and inference needs no rescaling.
fn dropout_mask<F: Float, R: Rng>(shape: (usize, usize), rate: f64, rng: &mut R) -> Array2<F> {
    if rate <= 0.0 {
        return Array2::ones(shape);
    }
    let keep = F::from_f64_lossy(1.0 / (1.0 - rate));
    Array2::from_shape_simple_fn(shape, || {
        if rng.random::<f64>() < rate { F::zero() } else { keep }
    })
}

fn count_correct<F: Float>(probs: ArrayView2<F>, labels: &[usize]) -> usize {
    probs
        .rows()
        .into_iter()
        .zip(labels)
        .filter(|(row, label)| argmax(row.view()) == Some(**label))
        .count()
}

fn log_epoch<F: Float>(m: &EpochMetrics<F>, total: usize) {
    match (m.val_loss, m.val_accuracy) {
        (Some(val_loss), Some(val_accuracy)) => log::info!(
            "Epoch {}/{} - loss: {:.4} - accuracy: {:.4} - val_loss: {:.4} - val_accuracy: {:.4}",
            m.epoch,
            total,
            m.train_loss,
            m.train_accuracy,
            val_loss,
            val_accuracy
        ),
        _ => log::info!(
            "Epoch {}/{} - loss: {:.4} - accuracy: {:.4}",
            m.epoch,
            total,
            m.train_loss,
            m.train_accuracy
        ),
    }
}
