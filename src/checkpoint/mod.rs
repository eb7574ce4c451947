pub mod manager;
pub mod natural;

pub use manager::{Checkpoint, CheckpointManager};
pub use natural::natural_cmp;
