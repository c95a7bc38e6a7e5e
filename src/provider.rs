use std::path::{Path, PathBuf};

use digits_helpers::{DataPoint, IMAGE_PIXELS, NUM_CLASSES};
use mlp::{Mlp, TrainingConfig, load_checkpoint, save_checkpoint};
use mnist_data::{DatasetError, MnistDataset};

use crate::classifier::DigitClassifier;
use crate::config::AppConfig;
use crate::error::{PipelineError, ProviderError};

/// Normalized samples to train on, plus a held-out set that is only used
/// for reporting.
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    pub train: Vec<DataPoint<usize, f32>>,
    pub validation: Vec<DataPoint<usize, f32>>,
}

/// Where training samples come from when no usable model is persisted.
pub trait TrainingSource {
    fn load(&self) -> Result<TrainingData, DatasetError>;
}

/// The MNIST train split, validated against the test split.
#[derive(Debug, Clone, Copy, Default)]
pub struct MnistSource;

impl TrainingSource for MnistSource {
    fn load(&self) -> Result<TrainingData, DatasetError> {
        let train = MnistDataset::train()?;
        let test = MnistDataset::test()?;
        log::info!("Loaded MNIST: {} training, {} test images", train.len(), test.len());
        Ok(TrainingData {
            train: train.to_data_points(),
            validation: test.to_data_points(),
        })
    }
}

/// How the classifier handed out by [`ModelProvider::load_or_train`] came
/// to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOrigin {
    Loaded,
    Trained,
}

/// Supplies the digit classifier: from disk when possible, otherwise by
/// training a fresh one and persisting it.
#[derive(Debug, Clone)]
pub struct ModelProvider<S = MnistSource> {
    model_path: PathBuf,
    config: TrainingConfig,
    source: S,
}

impl ModelProvider<MnistSource> {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.model_path, config.training.clone(), MnistSource)
    }
}

impl<S: TrainingSource> ModelProvider<S> {
    pub fn new(model_path: impl AsRef<Path>, config: TrainingConfig, source: S) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            config,
            source,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn get_classifier(&self) -> Result<DigitClassifier, ProviderError> {
        self.load_or_train().map(|(classifier, _)| classifier)
    }

    /// Loads the persisted classifier, or trains and persists a new one when
    /// the file is missing, corrupt, from another format version or holds a
    /// network of the wrong shape.
    ///
    /// # Errors
    ///
    /// Any other checkpoint failure (e.g. permission denied) is returned
    /// without training, as are dataset and training failures.
    pub fn load_or_train(&self) -> Result<(DigitClassifier, ModelOrigin), ProviderError> {
        match self.load() {
            Ok(classifier) => {
                log::info!("Loaded model from {}", self.model_path.display());
                return Ok((classifier, ModelOrigin::Loaded));
            }
            Err(ProviderError::Checkpoint(e)) if e.is_recoverable() => {
                log::warn!(
                    "No usable model at {} ({e}), training a new one",
                    self.model_path.display()
                );
            }
            Err(ProviderError::Classifier(e @ PipelineError::IncompatibleModel { .. })) => {
                log::warn!("Persisted model does not fit digit images ({e}), training a new one");
            }
            Err(e) => return Err(e),
        }

        let classifier = self.train()?;
        save_checkpoint(classifier.model(), &self.model_path)?;
        log::info!("Saved model to {}", self.model_path.display());
        Ok((classifier, ModelOrigin::Trained))
    }

    fn load(&self) -> Result<DigitClassifier, ProviderError> {
        let model: Mlp<f32> = load_checkpoint(&self.model_path)?;
        Ok(DigitClassifier::new(model)?)
    }

    fn train(&self) -> Result<DigitClassifier, ProviderError> {
        let data = self.source.load()?;
        let mut model = Mlp::new(IMAGE_PIXELS, NUM_CLASSES, self.config.clone())?;
        let validation = (!data.validation.is_empty()).then_some(data.validation.as_slice());
        let history = model.fit(&data.train, validation)?;
        if let Some(last) = history.last() {
            log::info!(
                "Training finished after {} epochs: accuracy {:.4}",
                last.epoch,
                last.train_accuracy
            );
        }
        Ok(DigitClassifier::new(model)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlp::CheckpointError;
    use mlp::checkpoint::{CHECKPOINT_MAGIC, save_writer};
    use ndarray::Array1;
    use std::cell::Cell;
    use std::fs;

    /// Ten well separated classes: class `c` lights up its own block of
    /// pixels.
    struct Synthetic {
        loads: Cell<usize>,
    }

    impl Synthetic {
        fn new() -> Self {
            Self { loads: Cell::new(0) }
        }
    }

    fn sample(label: usize) -> DataPoint<usize, f32> {
        let block = IMAGE_PIXELS / NUM_CLASSES;
        let features = Array1::from_shape_fn(IMAGE_PIXELS, |i| {
            if i / block == label { 1.0 } else { 0.0 }
        });
        DataPoint::new(features, label)
    }

    impl TrainingSource for Synthetic {
        fn load(&self) -> Result<TrainingData, DatasetError> {
            self.loads.set(self.loads.get() + 1);
            Ok(TrainingData {
                train: (0..40).map(|i| sample(i % NUM_CLASSES)).collect(),
                validation: (0..10).map(sample).collect(),
            })
        }
    }

    struct Failing;

    impl TrainingSource for Failing {
        fn load(&self) -> Result<TrainingData, DatasetError> {
            Err(DatasetError::CountMismatch { images: 3, labels: 2 })
        }
    }

    fn small_config() -> TrainingConfig {
        TrainingConfig::default()
            .with_hidden_units(16)
            .with_epochs(2)
            .with_batch_size(8)
    }

    fn provider(path: &Path) -> ModelProvider<Synthetic> {
        ModelProvider::new(path, small_config(), Synthetic::new())
    }

    #[test]
    fn test_missing_file_trains_then_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("mnist_model.bin");
        let provider = provider(&path);

        let (trained, origin) = provider.load_or_train().unwrap();
        assert_eq!(origin, ModelOrigin::Trained);
        assert_eq!(provider.source.loads.get(), 1);
        assert!(path.exists());

        let (loaded, origin) = provider.load_or_train().unwrap();
        assert_eq!(origin, ModelOrigin::Loaded);
        assert_eq!(provider.source.loads.get(), 1);
        assert_eq!(loaded, trained);
    }

    #[test]
    fn test_valid_file_is_not_retrained() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let model = Mlp::<f32>::new(IMAGE_PIXELS, NUM_CLASSES, small_config()).unwrap();
        save_checkpoint(&model, &path).unwrap();

        let provider = provider(&path);
        let classifier = provider.get_classifier().unwrap();
        assert_eq!(provider.source.loads.get(), 0);
        assert_eq!(classifier.model(), &model);
    }

    #[test]
    fn test_corrupt_file_is_retrained() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"definitely not a model").unwrap();

        let provider = provider(&path);
        let (_, origin) = provider.load_or_train().unwrap();
        assert_eq!(origin, ModelOrigin::Trained);
        assert!(load_checkpoint::<f32>(&path).is_ok());
    }

    #[test]
    fn test_version_mismatch_is_retrained() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let mut bytes = CHECKPOINT_MAGIC.to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        fs::write(&path, bytes).unwrap();

        let (_, origin) = provider(&path).load_or_train().unwrap();
        assert_eq!(origin, ModelOrigin::Trained);
    }

    #[test]
    fn test_wrong_shape_is_retrained() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let other = Mlp::<f32>::new(12, 3, small_config()).unwrap();
        let mut file = fs::File::create(&path).unwrap();
        save_writer(&other, &mut file).unwrap();

        let provider = provider(&path);
        let (classifier, origin) = provider.load_or_train().unwrap();
        assert_eq!(origin, ModelOrigin::Trained);
        assert_eq!(classifier.model().input_dim(), IMAGE_PIXELS);
        assert_eq!(provider.source.loads.get(), 1);
    }

    #[test]
    fn test_unreadable_path_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the model file should be cannot be read.
        let provider = provider(dir.path());

        let err = provider.load_or_train().unwrap_err();
        assert!(matches!(err, ProviderError::Checkpoint(CheckpointError::Io(_))));
        assert_eq!(provider.source.loads.get(), 0);
    }

    #[test]
    fn test_dataset_failure_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ModelProvider::new(dir.path().join("model.bin"), small_config(), Failing);
        let err = provider.get_classifier().unwrap_err();
        assert!(matches!(err, ProviderError::Dataset(DatasetError::CountMismatch { .. })));
    }
}
