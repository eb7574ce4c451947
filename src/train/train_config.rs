use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::activation::activation::Activation;
use crate::error::{Result, TrainError};
use crate::optim::OptimizerKind;

/// Configuration for one training run.
///
/// # Fields
/// - `epochs`           : the loop runs epochs `start..epochs`
/// - `batch_size`       : samples per mini-batch; the last batch may be short
/// - `learning_rate`    : optimizer step size
/// - `log_interval`     : validate and report when `epoch % log_interval == 0`
/// - `save_interval`    : checkpoint when `epoch % save_interval == 0`
/// - `signal_len`       : values per (flattened) input window
/// - `hidden_dim`       : width of the encoder/decoder hidden layers
/// - `latent_dim`       : width of the code layer
/// - `activation`       : non-linearity of the two hidden layers
/// - `eval_val`         : run the validation pass at report epochs
/// - `continue_training`: restore the latest checkpoint before training
/// - `use_gpu`          : request a GPU; the CPU backend is the only one built
/// - `num_workers`      : batches prefetched on a background thread (0 = inline)
/// - `optimizer`        : update rule
/// - `train_file`       : `.npy` corpus of shape `(N, *sample_shape)`
/// - `checkpoint_dir`   : where `checkpoint_epoch_<E>.json` files live
/// - `seed`             : seed for the train/validation/test partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub log_interval: usize,
    pub save_interval: usize,
    pub signal_len: usize,
    pub hidden_dim: usize,
    pub latent_dim: usize,
    pub activation: Activation,
    pub eval_val: bool,
    pub continue_training: bool,
    pub use_gpu: bool,
    pub num_workers: usize,
    pub optimizer: OptimizerKind,
    pub train_file: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 100_000,
            batch_size: 1000,
            learning_rate: 1e-4,
            log_interval: 10,
            save_interval: 100,
            signal_len: 60,
            hidden_dim: 32,
            latent_dim: 6,
            activation: Activation::Tanh,
            eval_val: true,
            continue_training: false,
            use_gpu: true,
            num_workers: 0,
            optimizer: OptimizerKind::Adam,
            train_file: PathBuf::from("normal.npy"),
            checkpoint_dir: PathBuf::from("model_saved"),
            seed: 0,
        }
    }
}

impl TrainConfig {
    /// Rejects values the loop cannot run with. Called once, before training.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("epochs", self.epochs),
            ("batch_size", self.batch_size),
            ("log_interval", self.log_interval),
            ("save_interval", self.save_interval),
            ("signal_len", self.signal_len),
            ("hidden_dim", self.hidden_dim),
            ("latent_dim", self.latent_dim),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(TrainError::InvalidConfig(format!("{name} must be at least 1")));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainError::InvalidConfig(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// The device training actually runs on.
    pub fn device(&self) -> Device {
        Device::Cpu
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
        }
    }
}
