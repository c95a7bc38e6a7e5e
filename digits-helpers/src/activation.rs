//! Element-wise activations shared by the network and its callers.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::Float;

/// Rectified linear unit, `max(0, x)`.
pub fn relu<F: Float>(x: ArrayView2<F>) -> Array2<F> {
    x.mapv(|v| if v > F::zero() { v } else { F::zero() })
}

/// Derivative mask of [`relu`] evaluated at the pre-activation `z`:
/// one where `z > 0`, zero elsewhere.
pub fn relu_grad_mask<F: Float>(z: ArrayView2<F>) -> Array2<F> {
    z.mapv(|v| if v > F::zero() { F::one() } else { F::zero() })
}

/// Row-wise softmax, applied in place.
///
/// Each row is shifted by its maximum before exponentiation so large logits
/// cannot overflow.
pub fn softmax_rows<F: Float>(logits: &mut Array2<F>) {
    for mut row in logits.axis_iter_mut(Axis(0)) {
        let max = row.fold(F::neg_infinity(), |acc, &v| acc.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > F::zero() {
            row.mapv_inplace(|v| v / sum);
        }
    }
}

/// Index of the largest element; ties resolve to the lowest index.
/// Returns `None` for an empty view.
pub fn argmax<F: Float>(row: ArrayView1<F>) -> Option<usize> {
    let mut best: Option<(usize, F)> = None;
    for (i, &v) in row.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_relu_clamps_negatives() {
        let x = array![[-1.0, 0.0, 2.5]];
        assert_eq!(relu(x.view()), array![[0.0, 0.0, 2.5]]);
        assert_eq!(relu_grad_mask(x.view()), array![[0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let mut logits = array![[1.0_f64, 2.0, 3.0], [0.0, 0.0, 0.0]];
        softmax_rows(&mut logits);
        for row in logits.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(logits[[1, 0]], 1.0 / 3.0, epsilon = 1e-12);
        assert!(logits[[0, 2]] > logits[[0, 1]]);
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        let mut logits = array![[1000.0_f32, 1000.0]];
        softmax_rows(&mut logits);
        assert!(logits.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(logits[[0, 0]], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_argmax_prefers_first_on_tie() {
        assert_eq!(argmax(array![0.1, 0.7, 0.7].view()), Some(1));
        assert_eq!(argmax(array![3.0, -1.0].view()), Some(0));
        let empty: ndarray::Array1<f32> = ndarray::Array1::zeros(0);
        assert_eq!(argmax(empty.view()), None);
    }
}
