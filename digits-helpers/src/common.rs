use ndarray::Array1;
use crate::Float;
use std::fmt::Debug;

/// Represents a single labeled sample: a flattened feature vector and its label.
///
/// L: The type of the label (e.g., `usize` class index, `String`).
/// F: The float type for the features (e.g., f32, f64).
#[derive(Debug, Clone)]
pub struct DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub features: Array1<F>,
    pub label: L,
}

impl<L, F> DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub fn new(features: Array1<F>, label: L) -> Self {
        DataPoint { features, label }
    }

    /// Number of features in this sample.
    pub fn dim(&self) -> usize {
        self.features.len()
    }
}

/// Flattens a row-major image into a feature vector, scaling `0..=255`
/// intensities to `[0, 1]`.
pub fn normalize_pixels<F: Float>(pixels: &[u8]) -> Array1<F> {
    let scale = F::from_f64_lossy(255.0);
    pixels
        .iter()
        .map(|&p| F::from_f64_lossy(f64::from(p)) / scale)
        .collect()
}
