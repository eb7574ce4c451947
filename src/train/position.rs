use std::fmt;

/// Where the training state machine is.
///
/// `Idle → Running → {Validating, Checkpointing} → Running → … → Completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Validating,
    Checkpointing,
    Completed,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopState::Idle => "idle",
            LoopState::Running => "running",
            LoopState::Validating => "validating",
            LoopState::Checkpointing => "checkpointing",
            LoopState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// The trainer's single view of progress, read when reporting and
/// checkpointing and overwritten when a checkpoint is restored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingPosition {
    pub epoch: usize,
    /// Index of the last step within `epoch`.
    pub step: usize,
    pub total_step: usize,
    pub train_loss: Option<f64>,
    pub val_loss: Option<f64>,
}
