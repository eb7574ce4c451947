use serde::{Serialize, Deserialize};
use crate::activation::activation::Activation;

/// Describes one dense layer of the autoencoder.
///
/// - `input_size`: width of the incoming batch
/// - `size`      : number of neurons (output width)
/// - `activation`: non-linearity applied after the affine map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub input_size: usize,
    pub size: usize,
    pub activation: Activation,
}

/// Architecture of the symmetric autoencoder:
/// `signal_len → hidden_dim → latent_dim → hidden_dim → signal_len`.
///
/// The code layer and the reconstruction layer are linear; the two hidden
/// layers use `hidden_activation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoEncoderSpec {
    pub signal_len: usize,
    pub hidden_dim: usize,
    pub latent_dim: usize,
    pub hidden_activation: Activation,
}

impl AutoEncoderSpec {
    pub fn new(signal_len: usize, hidden_dim: usize, latent_dim: usize) -> Self {
        AutoEncoderSpec {
            signal_len,
            hidden_dim,
            latent_dim,
            hidden_activation: Activation::Tanh,
        }
    }

    pub fn with_activation(mut self, hidden_activation: Activation) -> Self {
        self.hidden_activation = hidden_activation;
        self
    }

    pub fn encoder_layers(&self) -> Vec<LayerSpec> {
        vec![
            LayerSpec { input_size: self.signal_len, size: self.hidden_dim, activation: self.hidden_activation },
            LayerSpec { input_size: self.hidden_dim, size: self.latent_dim, activation: Activation::Identity },
        ]
    }

    pub fn decoder_layers(&self) -> Vec<LayerSpec> {
        vec![
            LayerSpec { input_size: self.latent_dim, size: self.hidden_dim, activation: self.hidden_activation },
            LayerSpec { input_size: self.hidden_dim, size: self.signal_len, activation: Activation::Identity },
        ]
    }
}
