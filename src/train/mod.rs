pub mod trainer;
pub mod epoch_stats;
pub mod train_config;
pub mod loop_fn;
pub mod position;

pub use trainer::{train_from_config, ResumeOutcome, TrainSummary, Trainer};
pub use epoch_stats::EpochReport;
pub use train_config::{Device, TrainConfig};
pub use loop_fn::{compute_eval_loss, run_one_epoch, EpochOutcome};
pub use position::{LoopState, TrainingPosition};
