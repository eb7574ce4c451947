use std::sync::mpsc;
use std::thread;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::dataset::Dataset;
use crate::error::Result;
use crate::math::matrix::Matrix;

/// Mini-batch view over one subset of a `Dataset`.
///
/// Each call to `epoch` reshuffles and yields a fresh lazy sequence; the
/// trailing partial batch is kept.
pub struct BatchIterator<'a> {
    dataset: &'a Dataset,
    indices: &'a [usize],
    batch_size: usize,
}

impl<'a> BatchIterator<'a> {
    /// `batch_size` must be at least 1.
    pub fn new(dataset: &'a Dataset, indices: &'a [usize], batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be at least 1");
        BatchIterator { dataset, indices, batch_size }
    }

    /// Number of batches per epoch, counting the partial one.
    pub fn num_batches(&self) -> usize {
        self.indices.len().div_ceil(self.batch_size)
    }

    /// Shuffled batches for one epoch, drawn from the thread RNG.
    pub fn epoch(&self) -> Batches<'a> {
        self.epoch_with_rng(&mut rand::thread_rng())
    }

    pub fn epoch_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Batches<'a> {
        let mut order = self.indices.to_vec();
        order.shuffle(rng);
        Batches { dataset: self.dataset, order, batch_size: self.batch_size, cursor: 0 }
    }
}

/// One epoch's worth of `(batch, features)` matrices.
pub struct Batches<'a> {
    dataset: &'a Dataset,
    order: Vec<usize>,
    batch_size: usize,
    cursor: usize,
}

impl Iterator for Batches<'_> {
    type Item = Matrix;

    fn next(&mut self) -> Option<Matrix> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let rows: Vec<&[f64]> = self.order[self.cursor..end]
            .iter()
            .map(|&i| self.dataset.windows[i].as_slice())
            .collect();
        self.cursor = end;
        Some(Matrix::from_rows(&rows))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.order.len() - self.cursor).div_ceil(self.batch_size);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Batches<'_> {}

/// The whole subset as a single batch, in index order. `None` when empty.
pub fn full_batch(dataset: &Dataset, indices: &[usize]) -> Option<Matrix> {
    if indices.is_empty() {
        return None;
    }
    let rows: Vec<&[f64]> = indices.iter().map(|&i| dataset.windows[i].as_slice()).collect();
    Some(Matrix::from_rows(&rows))
}

/// Feeds every batch to `consume`, one blocking hand-off at a time.
///
/// With `workers > 0` batches are assembled on a scoped background thread
/// and buffered in a channel holding at most `workers` of them. The first
/// error from `consume` stops the producer and is returned.
pub fn drive<F>(batches: Batches<'_>, workers: usize, mut consume: F) -> Result<()>
where
    F: FnMut(Matrix) -> Result<()>,
{
    if workers == 0 {
        for batch in batches {
            consume(batch)?;
        }
        return Ok(());
    }

    thread::scope(|s| {
        let (tx, rx) = mpsc::sync_channel(workers);
        s.spawn(move || {
            for batch in batches {
                // Receiver gone: the consumer bailed out.
                if tx.send(batch).is_err() {
                    break;
                }
            }
        });
        for batch in rx {
            consume(batch)?;
        }
        Ok(())
    })
}
