//! The MNIST handwritten digit dataset.
//!
//! 70,000 28x28 grayscale images in 10 classes: 60,000 for training and
//! 10,000 for testing. Files are fetched once from the
//! [CVDF mirror](https://github.com/cvdfoundation/mnist), unpacked into the
//! user's cache directory and read from disk afterwards.

mod download;
mod idx;

use std::fs;
use std::path::Path;

use digits_helpers::{DataPoint, Float, IMAGE_PIXELS, IMAGE_SIDE, normalize_pixels};
use thiserror::Error;

pub use download::{cache_dir, download_split};
pub use idx::{IdxImages, parse_images, parse_labels};

/// Errors raised while fetching or decoding MNIST.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{file}: expected IDX magic {expected:#010x}, found {found:#010x}")]
    InvalidMagic { file: String, expected: u32, found: u32 },

    #[error("{file}: expected {expected} bytes of data, found {actual}")]
    Truncated { file: String, expected: usize, actual: usize },

    #[error("{file}: expected {expected_rows}x{expected_cols} images, found {rows}x{cols}")]
    UnexpectedShape {
        file: String,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("found {images} images but {labels} labels")]
    CountMismatch { images: usize, labels: usize },
}

/// Which half of MNIST to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub const fn images_file(&self) -> &'static str {
        match self {
            Split::Train => "train-images-idx3-ubyte",
            Split::Test => "t10k-images-idx3-ubyte",
        }
    }

    pub const fn labels_file(&self) -> &'static str {
        match self {
            Split::Train => "train-labels-idx1-ubyte",
            Split::Test => "t10k-labels-idx1-ubyte",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

/// One MNIST sample: raw row-major pixel intensities and the digit label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnistItem {
    pub image: Vec<u8>,
    pub label: u8,
}

/// An in-memory MNIST split.
#[derive(Debug, Clone)]
pub struct MnistDataset {
    split: Split,
    items: Vec<MnistItem>,
}

impl MnistDataset {
    /// The 60,000-image training split, downloading it if needed.
    pub fn train() -> Result<Self, DatasetError> {
        Self::load(Split::Train)
    }

    /// The 10,000-image test split, downloading it if needed.
    pub fn test() -> Result<Self, DatasetError> {
        Self::load(Split::Test)
    }

    /// Loads `split` from the cache directory, downloading missing files.
    pub fn load(split: Split) -> Result<Self, DatasetError> {
        let root = cache_dir();
        let split_dir = download_split(split, &root)?;
        Self::from_dir(split, split_dir)
    }

    /// Reads an already unpacked split from `dir`.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Io` if a file is missing and one of the format
    /// errors if a file is not a well-formed 28x28 IDX file.
    pub fn from_dir(split: Split, dir: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let dir = dir.as_ref();
        let images_path = dir.join(split.images_file());
        let labels_path = dir.join(split.labels_file());

        // MNIST is small enough to keep in memory:
        // train images are 28 * 28 * 60000 = 47.04MB.
        let images = parse_images(&fs::read(&images_path)?, &display(&images_path))?;
        let labels = parse_labels(&fs::read(&labels_path)?, &display(&labels_path))?;

        if images.rows != IMAGE_SIDE || images.cols != IMAGE_SIDE {
            return Err(DatasetError::UnexpectedShape {
                file: display(&images_path),
                expected_rows: IMAGE_SIDE,
                expected_cols: IMAGE_SIDE,
                rows: images.rows,
                cols: images.cols,
            });
        }
        if images.count != labels.len() {
            return Err(DatasetError::CountMismatch {
                images: images.count,
                labels: labels.len(),
            });
        }

        let items = images
            .pixels
            .chunks(IMAGE_PIXELS)
            .zip(labels)
            .map(|(chunk, label)| MnistItem {
                image: chunk.to_vec(),
                label,
            })
            .collect();
        log::debug!("Loaded MNIST {} split from {}", split.name(), dir.display());

        Ok(Self { split, items })
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MnistItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MnistItem> {
        self.items.iter()
    }

    /// Flattened samples with intensities scaled to `[0, 1]`, labelled by
    /// digit.
    pub fn to_data_points<F: Float>(&self) -> Vec<DataPoint<usize, F>> {
        self.items
            .iter()
            .map(|item| DataPoint::new(normalize_pixels(&item.image), usize::from(item.label)))
            .collect()
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
