use std::collections::BTreeMap;

use crate::error::{Result, TrainError};
use crate::math::tensor::StateDict;
use crate::network::autoencoder::NamedParam;
use crate::optim::Optimizer;

/// Plain gradient descent. Carries no per-parameter state.
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn name(&self) -> &'static str {
        "SGD"
    }

    fn step(&mut self, params: Vec<NamedParam<'_>>) {
        let lr = self.learning_rate;
        for p in params {
            for (w, g) in p.value.data.iter_mut().zip(&p.grad.data) {
                *w -= lr * g;
            }
        }
    }

    fn state_dict(&self) -> StateDict {
        StateDict::new()
    }

    fn load_state_dict(
        &mut self,
        state: StateDict,
        _shapes: &BTreeMap<String, Vec<usize>>,
    ) -> Result<()> {
        match state.keys().next() {
            None => Ok(()),
            Some(key) => Err(TrainError::IncompatibleState(format!(
                "SGD keeps no state, found key '{key}'"
            ))),
        }
    }
}
