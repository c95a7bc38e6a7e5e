use digits_helpers::Float;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A fully connected layer computing `x · W + b`.
///
/// `weights` has shape `[inputs, outputs]` so a batch of row vectors can be
/// multiplied directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense<F: Float> {
    pub weights: Array2<F>,
    pub bias: Array1<F>,
}

/// Parameter gradients for one [`Dense`] layer.
#[derive(Debug, Clone)]
pub(crate) struct DenseGrads<F: Float> {
    pub weights: Array2<F>,
    pub bias: Array1<F>,
}

impl<F: Float> Dense<F> {
    /// Glorot-uniform weights and zero bias.
    pub fn new<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let limit = F::from_f64_lossy((6.0 / (inputs + outputs) as f64).sqrt());
        let weights = Array2::from_shape_simple_fn((inputs, outputs), || {
            rng.random_range(-limit..limit)
        });
        Self {
            weights,
            bias: Array1::zeros(outputs),
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn outputs(&self) -> usize {
        self.weights.ncols()
    }

    /// True when the bias length agrees with the weight matrix.
    pub fn is_consistent(&self) -> bool {
        self.bias.len() == self.weights.ncols()
    }

    pub fn forward(&self, x: ArrayView2<F>) -> Array2<F> {
        x.dot(&self.weights) + &self.bias
    }

    /// Backpropagates `grad_out` (gradient w.r.t. this layer's output) given
    /// the layer's input `x`. Returns the parameter gradients and the gradient
    /// w.r.t. `x`.
    pub(crate) fn backward(
        &self,
        x: ArrayView2<F>,
        grad_out: ArrayView2<F>,
    ) -> (DenseGrads<F>, Array2<F>) {
        let grads = DenseGrads {
            weights: x.t().dot(&grad_out),
            bias: grad_out.sum_axis(Axis(0)),
        };
        let grad_in = grad_out.dot(&self.weights.t());
        (grads, grad_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_glorot_init_within_limit() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let layer: Dense<f64> = Dense::new(784, 512, &mut rng);
        let limit = (6.0_f64 / (784.0 + 512.0)).sqrt();
        assert_eq!(layer.weights.dim(), (784, 512));
        assert!(layer.weights.iter().all(|w| w.abs() <= limit));
        assert!(layer.bias.iter().all(|&b| b == 0.0));
        assert!(layer.is_consistent());
    }

    #[test]
    fn test_forward_and_backward_shapes() {
        let layer = Dense {
            weights: array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
            bias: array![0.5, -0.5],
        };
        let x = array![[1.0, 0.0, 1.0]];
        let y = layer.forward(x.view());
        assert_abs_diff_eq!(y, array![[6.5, 7.5]]);

        let grad_out = array![[1.0, 1.0]];
        let (grads, grad_in) = layer.backward(x.view(), grad_out.view());
        assert_eq!(grads.weights, array![[1.0, 1.0], [0.0, 0.0], [1.0, 1.0]]);
        assert_eq!(grads.bias, array![1.0, 1.0]);
        assert_eq!(grad_in, array![[3.0, 7.0, 11.0]]);
    }
}
