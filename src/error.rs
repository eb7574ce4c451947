use std::path::PathBuf;

/// Everything that can go wrong while loading data, training or
/// checkpointing.
///
/// `NoCheckpointFound` and `CorruptCheckpoint` are recoverable: the trainer
/// downgrades them to a warning and starts from epoch 0. Every other variant
/// ends the run.
#[derive(thiserror::Error, Debug)]
pub enum TrainError {
    /// The dataset file is missing, unreadable, malformed or empty.
    #[error("invalid dataset '{}': {reason}", path.display())]
    InvalidDataset { path: PathBuf, reason: String },

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No checkpoint artifact exists in the checkpoint directory.
    #[error("no checkpoint found in '{}'", dir.display())]
    NoCheckpointFound { dir: PathBuf },

    /// A checkpoint artifact exists but cannot be restored.
    #[error("corrupt checkpoint '{}': {reason}", path.display())]
    CorruptCheckpoint { path: PathBuf, reason: String },

    /// The reconstruction loss stopped being a finite number.
    #[error("non-finite loss at epoch {epoch}, step {step}")]
    NonFiniteLoss { epoch: usize, step: usize },

    /// Two operands of a numeric operation disagree on shape.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },

    /// A state dict does not fit the model or optimizer it is loaded into.
    #[error("incompatible state dict: {0}")]
    IncompatibleState(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrainError {
    pub fn invalid_dataset(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TrainError::InvalidDataset { path: path.into(), reason: reason.into() }
    }

    pub fn corrupt_checkpoint(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TrainError::CorruptCheckpoint { path: path.into(), reason: reason.into() }
    }

    /// True for the failures the resume path recovers from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrainError::NoCheckpointFound { .. } | TrainError::CorruptCheckpoint { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TrainError>;
