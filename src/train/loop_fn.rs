use crate::data::batches::{drive, full_batch, BatchIterator};
use crate::data::dataset::Dataset;
use crate::error::{Result, TrainError};
use crate::loss::mse::MseLoss;
use crate::network::autoencoder::AutoEncoder;
use crate::optim::Optimizer;

/// What one pass over the training subset leaves behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochOutcome {
    /// Index of the last step taken.
    pub last_step: usize,
    /// Reconstruction loss of that last step.
    pub last_loss: f64,
}

/// Runs one epoch of mini-batch updates: forward, MSE against the input,
/// backward, optimizer step.
///
/// The first non-finite loss aborts the epoch with `NonFiniteLoss` before the
/// offending batch updates any parameter.
pub fn run_one_epoch(
    model: &mut AutoEncoder,
    optimizer: &mut dyn Optimizer,
    batches: &BatchIterator<'_>,
    num_workers: usize,
    epoch: usize,
) -> Result<EpochOutcome> {
    let mut step = 0;
    let mut last: Option<EpochOutcome> = None;

    drive(batches.epoch(), num_workers, |x| {
        let (_encoded, decoded) = model.forward(&x);
        let loss = MseLoss::loss(&decoded, &x);
        if !loss.is_finite() {
            return Err(TrainError::NonFiniteLoss { epoch, step });
        }

        model.backward(&MseLoss::derivative(&decoded, &x));
        optimizer.step(model.named_params_mut());

        last = Some(EpochOutcome { last_step: step, last_loss: loss });
        step += 1;
        Ok(())
    })?;

    // An empty training subset is rejected before the loop starts.
    last.ok_or_else(|| TrainError::invalid_dataset("<train subset>", "training subset is empty"))
}

/// Full-batch reconstruction loss in evaluation mode. `None` when the subset
/// is empty.
pub fn compute_eval_loss(model: &AutoEncoder, dataset: &Dataset, indices: &[usize]) -> Option<f64> {
    let x = full_batch(dataset, indices)?;
    let (_encoded, decoded) = model.predict(&x);
    Some(MseLoss::loss(&decoded, &x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::AutoEncoderSpec;
    use crate::optim::Adam;

    fn sine_windows(n: usize, len: usize) -> Dataset {
        Dataset::from_windows(
            (0..n)
                .map(|i| (0..len).map(|t| ((t + i) as f64 * 0.3).sin()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn reports_the_last_batch_not_an_average() {
        let ds = sine_windows(25, 8);
        let indices: Vec<usize> = (0..25).collect();
        let batches = BatchIterator::new(&ds, &indices, 10);
        let mut model = AutoEncoder::new(AutoEncoderSpec::new(8, 6, 3));
        let mut optim = Adam::new(1e-3);

        let out = run_one_epoch(&mut model, &mut optim, &batches, 0, 0).unwrap();
        assert_eq!(out.last_step, 2);
        assert!(out.last_loss.is_finite());
        assert_eq!(optim.steps_taken(), 3);
    }

    #[test]
    fn training_reduces_reconstruction_error() {
        let ds = sine_windows(40, 8);
        let indices: Vec<usize> = (0..40).collect();
        let batches = BatchIterator::new(&ds, &indices, 8);
        let mut model = AutoEncoder::new(AutoEncoderSpec::new(8, 16, 4));
        let mut optim = Adam::new(1e-2);

        let before = compute_eval_loss(&model, &ds, &indices).unwrap();
        for epoch in 0..60 {
            run_one_epoch(&mut model, &mut optim, &batches, 1, epoch).unwrap();
        }
        let after = compute_eval_loss(&model, &ds, &indices).unwrap();
        assert!(after < before, "loss went from {before} to {after}");
    }

    #[test]
    fn non_finite_input_is_fatal() {
        let mut windows = vec![vec![0.5; 4]; 3];
        windows[1][2] = f64::NAN;
        let ds = Dataset::from_windows(windows).unwrap();
        let indices = vec![1];
        let batches = BatchIterator::new(&ds, &indices, 1);
        let mut model = AutoEncoder::new(AutoEncoderSpec::new(4, 3, 2));
        let mut optim = Adam::new(1e-3);

        let err = run_one_epoch(&mut model, &mut optim, &batches, 0, 4).unwrap_err();
        assert!(matches!(err, TrainError::NonFiniteLoss { epoch: 4, step: 0 }));
        assert_eq!(optim.steps_taken(), 0);
    }

    #[test]
    fn empty_validation_subset_reports_nothing() {
        let ds = sine_windows(3, 4);
        let model = AutoEncoder::new(AutoEncoderSpec::new(4, 3, 2));
        assert!(compute_eval_loss(&model, &ds, &[]).is_none());
        assert!(compute_eval_loss(&model, &ds, &[0, 2]).is_some());
    }
}
