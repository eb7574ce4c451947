use crate::{activation::activation::Activation, math::matrix::Matrix};

/// Fully connected layer operating on `(batch, input_size)` matrices.
///
/// `forward` caches what `backward` needs; `backward` stores the parameter
/// gradients on the layer until the optimizer consumes them.
#[derive(Debug, Clone)]
pub struct Dense {
    pub input_size: usize,
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: Activation,
    pub weights_grad: Matrix,
    pub biases_grad: Matrix,
    input: Matrix,
    pre_neurons: Matrix, // z = xW + b, needed for the activation derivative
}

impl Dense {
    pub fn new(input_size: usize, size: usize, activation: Activation) -> Dense {
        let weights = if activation.prefers_he_init() {
            Matrix::he(input_size, size)
        } else {
            Matrix::xavier(input_size, size)
        };

        Dense {
            input_size,
            size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
            weights_grad: Matrix::zeros(input_size, size),
            biases_grad: Matrix::zeros(1, size),
            input: Matrix::default(),
            pre_neurons: Matrix::default(),
        }
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let z = (input * &self.weights).add_row(&self.biases);
        let a = z.map(|x| self.activator.function(x));
        self.input = input.clone();
        self.pre_neurons = z;
        a
    }

    /// Inference-only pass; leaves the backprop cache untouched.
    pub fn predict(&self, input: &Matrix) -> Matrix {
        (input * &self.weights)
            .add_row(&self.biases)
            .map(|x| self.activator.function(x))
    }

    /// Takes ∂L/∂a for this layer's output, stores ∂L/∂W and ∂L/∂b, and
    /// returns ∂L/∂x for the previous layer.
    pub fn backward(&mut self, output_grad: &Matrix) -> Matrix {
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        // δ = error ⊙ σ'(z)
        let delta = output_grad.hadamard(&act_derivative);

        self.weights_grad = &self.input.transpose() * &delta;
        self.biases_grad = delta.sum_rows();

        &delta * &self.weights.transpose()
    }

    /// `(name suffix, parameter, gradient)` for every trainable tensor.
    pub fn params_mut(&mut self) -> [(&'static str, &mut Matrix, &Matrix); 2] {
        [
            ("weight", &mut self.weights, &self.weights_grad),
            ("bias", &mut self.biases, &self.biases_grad),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::mse::MseLoss;

    #[test]
    fn weight_gradient_matches_finite_difference() {
        let mut layer = Dense::new(3, 2, Activation::Tanh);
        let x = Matrix::from_rows(&[&[0.5, -0.2, 0.1], &[0.3, 0.8, -0.6]]);
        let target = Matrix::from_rows(&[&[0.1, 0.2], &[-0.3, 0.4]]);

        let out = layer.forward(&x);
        layer.backward(&MseLoss::derivative(&out, &target));
        let analytic = layer.weights_grad.data[1];

        let h = 1e-6;
        let mut plus = layer.clone();
        plus.weights.data[1] += h;
        let mut minus = layer.clone();
        minus.weights.data[1] -= h;
        let numeric = (MseLoss::loss(&plus.predict(&x), &target)
            - MseLoss::loss(&minus.predict(&x), &target))
            / (2.0 * h);

        assert!((numeric - analytic).abs() < 1e-6);
    }

    fn weight_std(layer: &Dense) -> f64 {
        let n = layer.weights.data.len() as f64;
        (layer.weights.data.iter().map(|w| w * w).sum::<f64>() / n).sqrt()
    }

    #[test]
    fn rectifiers_get_he_init() {
        // 256 x 64 draws put the sample std within a few percent of the target.
        let relu = Dense::new(256, 64, Activation::Relu);
        let tanh = Dense::new(256, 64, Activation::Tanh);
        assert!((weight_std(&relu) - (2.0f64 / 256.0).sqrt()).abs() < 0.01);
        assert!((weight_std(&tanh) - (1.0f64 / 256.0).sqrt()).abs() < 0.01);
    }
}
