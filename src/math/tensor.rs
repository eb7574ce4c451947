use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named-parameter snapshot: parameter name to tensor value.
///
/// Both the model and the optimizer expose their state as a `StateDict`;
/// checkpoints store two of them.
pub type StateDict = BTreeMap<String, Tensor>;

/// Shape plus flat row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl Tensor {
    pub fn scalar(value: f64) -> Tensor {
        Tensor { shape: vec![1], data: vec![value] }
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// True when the value count agrees with the declared shape.
    pub fn is_consistent(&self) -> bool {
        self.numel() == self.data.len()
    }
}
