use std::fmt;

use serde::{Serialize, Deserialize};

/// One progress record, produced at every epoch where
/// `epoch % log_interval == 0`.
///
/// It is always logged; when the trainer has a progress channel the same
/// value is also sent there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    /// 0-based epoch index.
    pub epoch: usize,
    /// Exclusive upper bound of the run's epochs.
    pub total_epochs: usize,
    /// `epoch * batches_per_epoch + step` of the last step in the epoch.
    pub total_step: usize,
    /// Loss of the epoch's last mini-batch (not an average).
    pub train_loss: f64,
    /// Full-batch validation loss; `None` means validation was not computed.
    pub val_loss: Option<f64>,
    /// Wall-clock duration of the epoch's training pass in milliseconds.
    pub elapsed_ms: u64,
}

impl fmt::Display for EpochReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "epoch: {}, total_step: {}, train_loss: {:.10}, val_loss: ",
            self.epoch, self.total_step, self.train_loss
        )?;
        match self.val_loss {
            Some(v) => write!(f, "{v:.10}"),
            None => write!(f, "not computed"),
        }
    }
}
