pub mod batches;
pub mod dataset;
pub mod npy;
pub mod split;

pub use batches::{full_batch, BatchIterator};
pub use dataset::Dataset;
pub use split::{partition, split_sizes, Split};
