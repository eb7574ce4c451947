use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::dataset::Dataset;
use crate::error::{Result, TrainError};

/// Seed used for the train/validation/test partition unless configured
/// otherwise.
pub const DEFAULT_SPLIT_SEED: u64 = 0;

/// Disjoint index sets over one `Dataset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

/// `(train, validation, test)` sizes: floor(0.8 n), floor(0.1 n), remainder.
pub fn split_sizes(n: usize) -> (usize, usize, usize) {
    let train = n * 8 / 10;
    let validation = n / 10;
    (train, validation, n - train - validation)
}

/// Assigns every sample index to exactly one subset, reproducibly for a
/// given `seed`.
///
/// The permutation comes from a generator seeded here and dropped on return,
/// so only the partition is deterministic; epoch shuffling keeps drawing from
/// the entropy-seeded thread RNG.
pub fn partition(dataset: &Dataset, seed: u64) -> Result<Split> {
    let n = dataset.len();
    if n == 0 {
        return Err(TrainError::invalid_dataset(&dataset.source, "cannot partition an empty dataset"));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (train_len, val_len, _) = split_sizes(n);
    let test = indices.split_off(train_len + val_len);
    let validation = indices.split_off(train_len);

    Ok(Split { train: indices, validation, test })
}
