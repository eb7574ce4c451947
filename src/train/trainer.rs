use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

use log::{info, warn};

use crate::checkpoint::manager::CheckpointManager;
use crate::data::batches::BatchIterator;
use crate::data::dataset::Dataset;
use crate::data::split::{partition, Split};
use crate::error::{Result, TrainError};
use crate::network::autoencoder::AutoEncoder;
use crate::network::spec::AutoEncoderSpec;
use crate::optim::Optimizer;
use crate::train::epoch_stats::EpochReport;
use crate::train::loop_fn::{compute_eval_loss, run_one_epoch};
use crate::train::position::{LoopState, TrainingPosition};
use crate::train::train_config::TrainConfig;

/// How the resume attempt ended.
#[derive(Debug)]
pub enum ResumeOutcome {
    /// Model and optimizer were restored; training restarts at `epoch`.
    Restored { path: PathBuf, epoch: usize, loss: f64 },
    /// Nothing usable was found; training starts at epoch 0.
    FreshStart(TrainError),
}

/// What a finished run leaves behind.
#[derive(Debug)]
pub struct TrainSummary {
    pub start_epoch: usize,
    /// Epoch tag of the unconditional final checkpoint.
    pub final_epoch: usize,
    pub final_loss: f64,
    /// Every checkpoint write in order, duplicates included.
    pub checkpoints: Vec<PathBuf>,
    pub resume: Option<ResumeOutcome>,
    pub state: LoopState,
}

/// Owns the model, the optimizer and the training position for one run.
pub struct Trainer {
    config: TrainConfig,
    model: AutoEncoder,
    optimizer: Box<dyn Optimizer>,
    checkpoints: CheckpointManager,
    position: TrainingPosition,
    state: LoopState,
    progress_tx: Option<mpsc::Sender<EpochReport>>,
}

impl Trainer {
    /// Validates `config` and builds a freshly initialised model and
    /// optimizer.
    pub fn new(config: TrainConfig) -> Result<Trainer> {
        config.validate()?;
        let spec = AutoEncoderSpec::new(config.signal_len, config.hidden_dim, config.latent_dim)
            .with_activation(config.activation);
        let model = AutoEncoder::new(spec);
        let optimizer = config.optimizer.build(config.learning_rate);
        let checkpoints = CheckpointManager::new(&config.checkpoint_dir);

        Ok(Trainer {
            config,
            model,
            optimizer,
            checkpoints,
            position: TrainingPosition::default(),
            state: LoopState::Idle,
            progress_tx: None,
        })
    }

    /// Also sends every `EpochReport` to `tx`. A dropped receiver is ignored.
    pub fn with_progress(mut self, tx: mpsc::Sender<EpochReport>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn model(&self) -> &AutoEncoder {
        &self.model
    }

    pub fn optimizer(&self) -> &dyn Optimizer {
        self.optimizer.as_ref()
    }

    pub fn position(&self) -> &TrainingPosition {
        &self.position
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Restores the latest checkpoint into the model, the optimizer and the
    /// position.
    ///
    /// Any failure to restore is logged and leaves the model and optimizer
    /// untouched, with the position back at epoch 0. The stored epoch is
    /// resumed as-is, so its work is done again.
    pub fn resume(&mut self) -> ResumeOutcome {
        let outcome = match self.restore_latest() {
            Ok((path, epoch, loss)) => {
                info!("load checkpoint file: '{}'", path.display());
                info!("continue epoch: {epoch}, train_loss: {loss:.10}");
                ResumeOutcome::Restored { path, epoch, loss }
            }
            Err(err) => {
                warn!("load model checkpoint failed: {err}");
                self.position = TrainingPosition::default();
                ResumeOutcome::FreshStart(err)
            }
        };
        info!("continue training from epoch: {}", self.position.epoch);
        outcome
    }

    fn restore_latest(&mut self) -> Result<(PathBuf, usize, f64)> {
        let (path, checkpoint) = self.checkpoints.load_latest()?;
        let corrupt = |e: TrainError| TrainError::corrupt_checkpoint(&path, e.to_string());

        // Load into fresh instances so a half-applied checkpoint never leaks.
        let mut model = AutoEncoder::new(self.model.spec.clone());
        model.load_state_dict(checkpoint.model_state).map_err(corrupt)?;
        let mut optimizer = self.config.optimizer.build(self.config.learning_rate);
        optimizer
            .load_state_dict(checkpoint.optimizer_state, &model.parameter_shapes())
            .map_err(corrupt)?;

        self.model = model;
        self.optimizer = optimizer;
        self.position = TrainingPosition {
            epoch: checkpoint.epoch,
            train_loss: Some(checkpoint.loss),
            ..TrainingPosition::default()
        };
        Ok((path, checkpoint.epoch, checkpoint.loss))
    }

    /// Drives the whole run over `split` and returns once the final
    /// checkpoint is on disk.
    pub fn run(&mut self, dataset: &Dataset, split: &Split) -> Result<TrainSummary> {
        if split.train.is_empty() {
            return Err(TrainError::invalid_dataset(&dataset.source, "training subset is empty"));
        }
        if dataset.window_len() != self.config.signal_len {
            return Err(TrainError::ShapeMismatch {
                expected: vec![self.config.signal_len],
                actual: vec![dataset.window_len()],
            });
        }

        self.state = LoopState::Idle;
        self.position = TrainingPosition::default();
        let resume = self.config.continue_training.then(|| self.resume());
        let start_epoch = self.position.epoch;

        let batches = BatchIterator::new(dataset, &split.train, self.config.batch_size);
        let batches_per_epoch = batches.num_batches();
        let mut written = Vec::new();

        self.state = LoopState::Running;
        for epoch in start_epoch..self.config.epochs {
            let started = Instant::now();
            let outcome = run_one_epoch(
                &mut self.model,
                self.optimizer.as_mut(),
                &batches,
                self.config.num_workers,
                epoch,
            )?;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            self.position.epoch = epoch;
            self.position.step = outcome.last_step;
            self.position.total_step = epoch * batches_per_epoch + outcome.last_step;
            self.position.train_loss = Some(outcome.last_loss);

            if epoch % self.config.log_interval == 0 {
                self.state = LoopState::Validating;
                self.position.val_loss = if self.config.eval_val {
                    compute_eval_loss(&self.model, dataset, &split.validation)
                } else {
                    None
                };
                self.report(elapsed_ms);
                self.state = LoopState::Running;
            }

            if epoch % self.config.save_interval == 0 {
                written.push(self.checkpoint()?);
            }
        }

        // Unconditional, even when it repeats this epoch's scheduled save.
        written.push(self.checkpoint()?);
        self.state = LoopState::Completed;

        Ok(TrainSummary {
            start_epoch,
            final_epoch: self.position.epoch,
            final_loss: self.position.train_loss.unwrap_or_default(),
            checkpoints: written,
            resume,
            state: self.state,
        })
    }

    fn report(&self, elapsed_ms: u64) {
        let report = EpochReport {
            epoch: self.position.epoch,
            total_epochs: self.config.epochs,
            total_step: self.position.total_step,
            train_loss: self.position.train_loss.unwrap_or_default(),
            val_loss: self.position.val_loss,
            elapsed_ms,
        };
        info!("{report}");
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(report);
        }
    }

    /// Snapshots the current position, model and optimizer.
    fn checkpoint(&mut self) -> Result<PathBuf> {
        let previous = self.state;
        self.state = LoopState::Checkpointing;

        let loss = self.position.train_loss.ok_or_else(|| {
            TrainError::InvalidConfig("no completed epoch to checkpoint".into())
        })?;
        let path = self.checkpoints.save(
            self.position.epoch,
            loss,
            &self.model.state_dict(),
            &self.optimizer.state_dict(),
        )?;

        self.state = previous;
        Ok(path)
    }
}

/// Loads the configured corpus, partitions it, and trains to completion.
pub fn train_from_config(config: TrainConfig) -> Result<TrainSummary> {
    config.validate()?;
    info!("{config:?}");
    if config.use_gpu {
        info!("GPU requested; no GPU backend is built in, using device: {}", config.device());
    } else {
        info!("device: {}", config.device());
    }

    let dataset = Dataset::load(&config.train_file, config.signal_len)?;
    let split = partition(&dataset, config.seed)?;
    info!("training set length: {}", split.train.len());
    info!("validation set length: {}", split.validation.len());
    info!("test set length: {}", split.test.len());

    let mut trainer = Trainer::new(config)?;
    info!(
        "model structure:\n{}\noptimizer: {}, parameters: {}",
        trainer.model(),
        trainer.optimizer().name(),
        trainer.model().num_parameters()
    );

    let summary = trainer.run(&dataset, &split)?;
    info!(
        "training {} at epoch {} (train_loss: {:.10}), {} checkpoint writes",
        summary.state,
        summary.final_epoch,
        summary.final_loss,
        summary.checkpoints.len()
    );
    Ok(summary)
}
