use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, TrainError};
use crate::layers::dense::Dense;
use crate::math::matrix::Matrix;
use crate::math::tensor::StateDict;
use crate::network::spec::{AutoEncoderSpec, LayerSpec};

/// Dense autoencoder over flattened signal windows.
///
/// Parameters are addressed as `encoder.<i>.weight`, `encoder.<i>.bias`,
/// `decoder.<i>.weight`, `decoder.<i>.bias`.
pub struct AutoEncoder {
    pub spec: AutoEncoderSpec,
    pub encoder: Vec<Dense>,
    pub decoder: Vec<Dense>,
}

/// A parameter, its current gradient, and its state-dict name.
pub struct NamedParam<'a> {
    pub name: String,
    pub value: &'a mut Matrix,
    pub grad: &'a Matrix,
}

fn build(layers: Vec<LayerSpec>) -> Vec<Dense> {
    layers.into_iter()
        .map(|l| Dense::new(l.input_size, l.size, l.activation))
        .collect()
}

impl AutoEncoder {
    pub fn new(spec: AutoEncoderSpec) -> AutoEncoder {
        let encoder = build(spec.encoder_layers());
        let decoder = build(spec.decoder_layers());
        AutoEncoder { spec, encoder, decoder }
    }

    /// Training forward pass; caches activations for `backward`.
    /// Returns `(encoded, decoded)`.
    pub fn forward(&mut self, x: &Matrix) -> (Matrix, Matrix) {
        let mut encoded = x.clone();
        for layer in &mut self.encoder {
            encoded = layer.forward(&encoded);
        }
        let mut decoded = encoded.clone();
        for layer in &mut self.decoder {
            decoded = layer.forward(&decoded);
        }
        (encoded, decoded)
    }

    /// Evaluation forward pass; no caching, no gradients.
    pub fn predict(&self, x: &Matrix) -> (Matrix, Matrix) {
        let encoded = self.encoder.iter().fold(x.clone(), |acc, l| l.predict(&acc));
        let decoded = self.decoder.iter().fold(encoded.clone(), |acc, l| l.predict(&acc));
        (encoded, decoded)
    }

    /// Backpropagates ∂L/∂decoded through every layer, leaving each layer's
    /// gradients in place for the optimizer.
    pub fn backward(&mut self, decoded_grad: &Matrix) {
        let mut grad = decoded_grad.clone();
        for layer in self.decoder.iter_mut().rev() {
            grad = layer.backward(&grad);
        }
        for layer in self.encoder.iter_mut().rev() {
            grad = layer.backward(&grad);
        }
    }

    pub fn named_params_mut(&mut self) -> Vec<NamedParam<'_>> {
        let mut out = Vec::with_capacity(4 * (self.encoder.len() + self.decoder.len()));
        for (prefix, layers) in [("encoder", &mut self.encoder), ("decoder", &mut self.decoder)] {
            for (i, layer) in layers.iter_mut().enumerate() {
                for (suffix, value, grad) in layer.params_mut() {
                    out.push(NamedParam { name: format!("{prefix}.{i}.{suffix}"), value, grad });
                }
            }
        }
        out
    }

    fn named_params(&self) -> Vec<(String, &Matrix)> {
        let mut out = Vec::new();
        for (prefix, layers) in [("encoder", &self.encoder), ("decoder", &self.decoder)] {
            for (i, layer) in layers.iter().enumerate() {
                out.push((format!("{prefix}.{i}.weight"), &layer.weights));
                out.push((format!("{prefix}.{i}.bias"), &layer.biases));
            }
        }
        out
    }

    /// Parameter name to `[rows, cols]`.
    pub fn parameter_shapes(&self) -> BTreeMap<String, Vec<usize>> {
        self.named_params().into_iter()
            .map(|(name, m)| (name, m.shape().to_vec()))
            .collect()
    }

    pub fn num_parameters(&self) -> usize {
        self.named_params().iter().map(|(_, m)| m.data.len()).sum()
    }

    pub fn state_dict(&self) -> StateDict {
        self.named_params().into_iter()
            .map(|(name, m)| (name, m.to_tensor()))
            .collect()
    }

    /// Replaces every parameter from `state`. The key set must match exactly
    /// and every shape must agree; on error the model is left unchanged.
    pub fn load_state_dict(&mut self, mut state: StateDict) -> Result<()> {
        let shapes = self.parameter_shapes();

        if let Some(extra) = state.keys().find(|k| !shapes.contains_key(*k)) {
            return Err(TrainError::IncompatibleState(format!("unexpected model key '{extra}'")));
        }

        let mut staged = Vec::with_capacity(shapes.len());
        for (name, shape) in &shapes {
            let tensor = state.remove(name).ok_or_else(|| {
                TrainError::IncompatibleState(format!("missing model key '{name}'"))
            })?;
            let m = Matrix::from_tensor(tensor, shape[0], shape[1]).map_err(|e| {
                TrainError::IncompatibleState(format!("model key '{name}': {e}"))
            })?;
            staged.push(m);
        }

        // BTreeMap order matches the sorted order of named_params_mut names.
        let mut params = self.named_params_mut();
        params.sort_by(|a, b| a.name.cmp(&b.name));
        for (param, m) in params.into_iter().zip(staged) {
            *param.value = m;
        }
        Ok(())
    }
}

impl fmt::Display for AutoEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AutoEncoder(")?;
        for (prefix, layers) in [("encoder", &self.encoder), ("decoder", &self.decoder)] {
            writeln!(f, "  ({prefix}): Sequential(")?;
            for (i, l) in layers.iter().enumerate() {
                writeln!(
                    f,
                    "    ({i}): Dense(in_features={}, out_features={}, activation={})",
                    l.input_size, l.size, l.activator
                )?;
            }
            writeln!(f, "  )")?;
        }
        write!(f, ")")
    }
}
