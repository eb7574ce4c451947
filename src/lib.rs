pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod checkpoint;
pub mod train;
pub mod error;
pub mod logging;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use math::tensor::{StateDict, Tensor};
pub use activation::activation::Activation;
pub use layers::dense::Dense;
pub use network::autoencoder::AutoEncoder;
pub use network::spec::AutoEncoderSpec;
pub use loss::mse::MseLoss;
pub use optim::{Adam, Optimizer, OptimizerKind, Sgd};
pub use data::{Dataset, Split};
pub use checkpoint::{Checkpoint, CheckpointManager};
pub use train::{train_from_config, EpochReport, LoopState, ResumeOutcome, TrainConfig, TrainSummary, Trainer};
pub use error::{Result, TrainError};
