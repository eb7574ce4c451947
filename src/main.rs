use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use signal_ae::logging::init_logging;
use signal_ae::{train_from_config, Activation, OptimizerKind, TrainConfig};

/// Train a signal-window autoencoder with periodic validation and
/// resumable checkpoints.
#[derive(Parser, Debug)]
#[command(name = "signal-ae", version, about, long_about = None)]
struct Cli {
    /// Number of epochs; the loop runs epochs start..EPOCH
    #[arg(long = "epoch", default_value_t = 100_000)]
    epochs: usize,

    /// Samples per mini-batch
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Learning rate
    #[arg(long, default_value_t = 1e-4)]
    lr: f64,

    /// Report (and validate) every n epochs
    #[arg(long, default_value_t = 10)]
    log_interval: usize,

    /// Save a checkpoint every n epochs
    #[arg(long, default_value_t = 100)]
    save_interval: usize,

    /// Raw input signal length, e.g. 60 for samples of shape (1, 60)
    #[arg(long, default_value_t = 60)]
    signal_len: usize,

    /// Width of the hidden layers
    #[arg(long, default_value_t = 32)]
    hidden_dim: usize,

    /// Latent dimension
    #[arg(long, default_value_t = 6)]
    latent_dim: usize,

    /// Non-linearity of the two hidden layers
    #[arg(long, value_enum, default_value_t = Activation::Tanh)]
    activation: Activation,

    /// Evaluate the validation set at report epochs (true | false)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    eval_val: bool,

    /// Resume from the latest checkpoint (true | false)
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    continue_training: bool,

    /// Use a GPU if one is available (true | false)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    use_gpu: bool,

    /// Batches prefetched on a background thread; 0 assembles them inline
    #[arg(long, default_value_t = 0)]
    num_workers: usize,

    /// Update rule
    #[arg(long, value_enum, default_value_t = OptimizerKind::Adam)]
    optimizer: OptimizerKind,

    /// Input .npy file of shape (N, *sample_shape)
    #[arg(long, default_value = "normal.npy")]
    train_file: PathBuf,

    /// Directory for checkpoint_epoch_<E>.json files
    #[arg(long, default_value = "model_saved")]
    checkpoint_dir: PathBuf,

    /// Log file, appended to on every run
    #[arg(long, default_value = "log_training.log")]
    log_file: PathBuf,

    /// Seed for the train/validation/test partition
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl From<Cli> for TrainConfig {
    fn from(cli: Cli) -> Self {
        TrainConfig {
            epochs: cli.epochs,
            batch_size: cli.batch_size,
            learning_rate: cli.lr,
            log_interval: cli.log_interval,
            save_interval: cli.save_interval,
            signal_len: cli.signal_len,
            hidden_dim: cli.hidden_dim,
            latent_dim: cli.latent_dim,
            activation: cli.activation,
            eval_val: cli.eval_val,
            continue_training: cli.continue_training,
            use_gpu: cli.use_gpu,
            num_workers: cli.num_workers,
            optimizer: cli.optimizer,
            train_file: cli.train_file,
            checkpoint_dir: cli.checkpoint_dir,
            seed: cli.seed,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(Some(&cli.log_file))
        .with_context(|| format!("cannot open log file '{}'", cli.log_file.display()))?;

    let config = TrainConfig::from(cli);
    let train_file = config.train_file.clone();
    train_from_config(config)
        .with_context(|| format!("training on '{}' failed", train_file.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_library() {
        let cli = Cli::parse_from(["signal-ae"]);
        assert_eq!(TrainConfig::from(cli), TrainConfig::default());
    }

    #[test]
    fn boolean_flags_take_values() {
        let cli = Cli::parse_from([
            "signal-ae", "--eval-val", "false", "--continue-training", "true",
            "--epoch", "3", "--optimizer", "sgd", "--activation", "relu",
        ]);
        let cfg = TrainConfig::from(cli);
        assert!(!cfg.eval_val);
        assert!(cfg.continue_training);
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.optimizer, OptimizerKind::Sgd);
        assert_eq!(cfg.activation, Activation::Relu);
    }
}
