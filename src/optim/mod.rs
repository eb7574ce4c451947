pub mod adam;
pub mod sgd;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::tensor::StateDict;
use crate::network::autoencoder::NamedParam;

pub use adam::Adam;
pub use sgd::Sgd;

/// Parameter update rule with checkpointable state.
pub trait Optimizer {
    fn name(&self) -> &'static str;

    /// Applies one update using the gradients carried by `params`.
    fn step(&mut self, params: Vec<NamedParam<'_>>);

    fn state_dict(&self) -> StateDict;

    /// Replaces the optimizer statistics. `shapes` maps each model parameter
    /// name to its shape; state for anything else is rejected.
    fn load_state_dict(&mut self, state: StateDict, shapes: &BTreeMap<String, Vec<usize>>) -> Result<()>;
}

/// Selects the update rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn build(self, learning_rate: f64) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate)),
            OptimizerKind::Sgd => Box::new(Sgd::new(learning_rate)),
        }
    }
}
