//! Adam optimizer state for the two dense layers of an [`Mlp`](crate::Mlp).

use digits_helpers::Float;
use ndarray::{Array, Dimension, Zip};

use crate::config::AdamConfig;
use crate::layer::{Dense, DenseGrads};

/// First and second moment estimates for one parameter tensor.
#[derive(Debug, Clone)]
struct Moments<F: Float, D: Dimension> {
    m: Array<F, D>,
    v: Array<F, D>,
}

impl<F: Float, D: Dimension> Moments<F, D> {
    fn zeros_like(param: &Array<F, D>) -> Self {
        Self {
            m: Array::zeros(param.raw_dim()),
            v: Array::zeros(param.raw_dim()),
        }
    }

    fn step(&mut self, param: &mut Array<F, D>, grad: &Array<F, D>, hp: &StepParams<F>) {
        Zip::from(param)
            .and(grad)
            .and(&mut self.m)
            .and(&mut self.v)
            .for_each(|p, &g, m, v| {
                *m = hp.beta_1 * *m + (F::one() - hp.beta_1) * g;
                *v = hp.beta_2 * *v + (F::one() - hp.beta_2) * g * g;
                let m_hat = *m / hp.bias_correction_1;
                let v_hat = *v / hp.bias_correction_2;
                *p -= hp.lr * m_hat / (v_hat.sqrt() + hp.epsilon);
            });
    }
}

/// Per-step constants shared by every parameter update.
struct StepParams<F> {
    lr: F,
    beta_1: F,
    beta_2: F,
    epsilon: F,
    bias_correction_1: F,
    bias_correction_2: F,
}

#[derive(Debug, Clone)]
struct LayerMoments<F: Float> {
    weights: Moments<F, ndarray::Ix2>,
    bias: Moments<F, ndarray::Ix1>,
}

impl<F: Float> LayerMoments<F> {
    fn for_layer(layer: &Dense<F>) -> Self {
        Self {
            weights: Moments::zeros_like(&layer.weights),
            bias: Moments::zeros_like(&layer.bias),
        }
    }
}

/// Adam with bias-corrected moment estimates, tracking state for a hidden and
/// an output layer.
#[derive(Debug, Clone)]
pub(crate) struct Adam<F: Float> {
    config: AdamConfig,
    learning_rate: f64,
    step: i32,
    hidden: LayerMoments<F>,
    output: LayerMoments<F>,
}

impl<F: Float> Adam<F> {
    pub fn new(
        config: AdamConfig,
        learning_rate: f64,
        hidden: &Dense<F>,
        output: &Dense<F>,
    ) -> Self {
        Self {
            config,
            learning_rate,
            step: 0,
            hidden: LayerMoments::for_layer(hidden),
            output: LayerMoments::for_layer(output),
        }
    }

    /// Applies one update to both layers.
    pub fn update(
        &mut self,
        hidden: &mut Dense<F>,
        hidden_grads: &DenseGrads<F>,
        output: &mut Dense<F>,
        output_grads: &DenseGrads<F>,
    ) {
        self.step += 1;
        let hp = StepParams {
            lr: F::from_f64_lossy(self.learning_rate),
            beta_1: F::from_f64_lossy(self.config.beta_1),
            beta_2: F::from_f64_lossy(self.config.beta_2),
            epsilon: F::from_f64_lossy(self.config.epsilon),
            bias_correction_1: F::from_f64_lossy(1.0 - self.config.beta_1.powi(self.step)),
            bias_correction_2: F::from_f64_lossy(1.0 - self.config.beta_2.powi(self.step)),
        };

        self.hidden.weights.step(&mut hidden.weights, &hidden_grads.weights, &hp);
        self.hidden.bias.step(&mut hidden.bias, &hidden_grads.bias, &hp);
        self.output.weights.step(&mut output.weights, &output_grads.weights, &hp);
        self.output.bias.step(&mut output.bias, &output_grads.bias, &hp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        // With bias correction the first Adam step is lr * sign(g).
        let mut hidden = Dense {
            weights: array![[1.0_f64, -1.0]],
            bias: array![0.0, 0.0],
        };
        let mut output = Dense {
            weights: array![[0.5_f64], [0.5]],
            bias: array![0.0],
        };
        let hidden_grads = DenseGrads {
            weights: array![[2.0, -3.0]],
            bias: array![0.0, 0.0],
        };
        let output_grads = DenseGrads {
            weights: array![[0.1], [-0.1]],
            bias: array![1.0],
        };
        let mut adam = Adam::new(AdamConfig::default(), 0.01, &hidden, &output);
        adam.update(&mut hidden, &hidden_grads, &mut output, &output_grads);

        assert_abs_diff_eq!(hidden.weights[[0, 0]], 0.99, epsilon = 1e-6);
        assert_abs_diff_eq!(hidden.weights[[0, 1]], -0.99, epsilon = 1e-6);
        assert_abs_diff_eq!(hidden.bias[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(output.weights[[0, 0]], 0.49, epsilon = 1e-5);
        assert_abs_diff_eq!(output.weights[[1, 0]], 0.51, epsilon = 1e-5);
        assert_abs_diff_eq!(output.bias[0], -0.01, epsilon = 1e-6);
    }
}
