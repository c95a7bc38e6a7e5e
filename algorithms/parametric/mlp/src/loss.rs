//! Sparse categorical cross-entropy over softmax outputs.

use digits_helpers::Float;
use ndarray::{Array2, ArrayView2};

/// Mean negative log-likelihood of the true class.
pub(crate) fn cross_entropy<F: Float>(probs: ArrayView2<F>, labels: &[usize]) -> F {
    let floor = F::from_f64_lossy(1e-7);
    let total: F = labels
        .iter()
        .enumerate()
        .map(|(row, &label)| -probs[[row, label]].max(floor).ln())
        .sum();
    total / F::from_f64_lossy(labels.len() as f64)
}

/// Gradient of the mean cross-entropy w.r.t. the logits that fed the
/// softmax: `(p - onehot(y)) / batch`.
pub(crate) fn cross_entropy_grad<F: Float>(probs: ArrayView2<F>, labels: &[usize]) -> Array2<F> {
    let mut grad = probs.to_owned();
    for (row, &label) in labels.iter().enumerate() {
        grad[[row, label]] -= F::one();
    }
    let batch = F::from_f64_lossy(labels.len() as f64);
    grad.mapv_inplace(|g| g / batch);
    grad
}
