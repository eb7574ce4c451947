use std::collections::BTreeMap;

use crate::error::{Result, TrainError};
use crate::math::matrix::Matrix;
use crate::math::tensor::{StateDict, Tensor};
use crate::network::autoencoder::NamedParam;
use crate::optim::Optimizer;

const STEP_KEY: &str = "step";
const EXP_AVG: &str = "exp_avg";
const EXP_AVG_SQ: &str = "exp_avg_sq";

/// Adam with bias correction (Kingma & Ba, 2015).
///
/// Moment estimates are created lazily on the first step for each parameter
/// and persisted as `<param>.exp_avg` / `<param>.exp_avg_sq`, next to the
/// shared `step` counter.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    step: u64,
    exp_avg: BTreeMap<String, Matrix>,
    exp_avg_sq: BTreeMap<String, Matrix>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            step: 0,
            exp_avg: BTreeMap::new(),
            exp_avg_sq: BTreeMap::new(),
        }
    }

    pub fn steps_taken(&self) -> u64 {
        self.step
    }
}

impl Optimizer for Adam {
    fn name(&self) -> &'static str {
        "Adam"
    }

    fn step(&mut self, params: Vec<NamedParam<'_>>) {
        self.step += 1;
        let t = self.step as i32;
        let bias1 = 1.0 - self.beta1.powi(t);
        let bias2 = 1.0 - self.beta2.powi(t);
        let step_size = self.learning_rate / bias1;

        for p in params {
            let first = self.exp_avg.entry(p.name.clone())
                .or_insert_with(|| Matrix::zeros(p.value.rows, p.value.cols));
            let second = self.exp_avg_sq.entry(p.name)
                .or_insert_with(|| Matrix::zeros(p.value.rows, p.value.cols));

            for (((w, g), m), v) in p.value.data.iter_mut()
                .zip(&p.grad.data)
                .zip(first.data.iter_mut())
                .zip(second.data.iter_mut())
            {
                *m = self.beta1 * *m + (1.0 - self.beta1) * g;
                *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
                let denom = (*v / bias2).sqrt() + self.eps;
                *w -= step_size * *m / denom;
            }
        }
    }

    fn state_dict(&self) -> StateDict {
        let mut state = StateDict::new();
        state.insert(STEP_KEY.to_owned(), Tensor::scalar(self.step as f64));
        for (name, m) in &self.exp_avg {
            state.insert(format!("{name}.{EXP_AVG}"), m.to_tensor());
        }
        for (name, v) in &self.exp_avg_sq {
            state.insert(format!("{name}.{EXP_AVG_SQ}"), v.to_tensor());
        }
        state
    }

    fn load_state_dict(
        &mut self,
        mut state: StateDict,
        shapes: &BTreeMap<String, Vec<usize>>,
    ) -> Result<()> {
        let step = state.remove(STEP_KEY)
            .ok_or_else(|| TrainError::IncompatibleState("missing optimizer key 'step'".into()))?;
        let step = match step.data.as_slice() {
            [s] if s.is_finite() && *s >= 0.0 && s.fract() == 0.0 => *s as u64,
            _ => return Err(TrainError::IncompatibleState("optimizer 'step' is not a count".into())),
        };

        let mut exp_avg = BTreeMap::new();
        let mut exp_avg_sq = BTreeMap::new();
        for (key, tensor) in state {
            let (param, slot) = if let Some(p) = key.strip_suffix(&format!(".{EXP_AVG_SQ}")) {
                (p, &mut exp_avg_sq)
            } else if let Some(p) = key.strip_suffix(&format!(".{EXP_AVG}")) {
                (p, &mut exp_avg)
            } else {
                return Err(TrainError::IncompatibleState(format!("unexpected optimizer key '{key}'")));
            };
            let shape = shapes.get(param).ok_or_else(|| {
                TrainError::IncompatibleState(format!("optimizer state for unknown parameter '{param}'"))
            })?;
            let m = Matrix::from_tensor(tensor, shape[0], shape[1]).map_err(|e| {
                TrainError::IncompatibleState(format!("optimizer key '{key}': {e}"))
            })?;
            slot.insert(param.to_owned(), m);
        }

        if exp_avg.keys().ne(exp_avg_sq.keys()) {
            return Err(TrainError::IncompatibleState(
                "first and second moment estimates cover different parameters".into(),
            ));
        }

        self.step = step;
        self.exp_avg = exp_avg;
        self.exp_avg_sq = exp_avg_sq;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::autoencoder::AutoEncoder;
    use crate::network::spec::AutoEncoderSpec;

    #[test]
    fn first_step_moves_each_weight_by_about_lr() {
        let mut w = Matrix::from_rows(&[&[1.0, -1.0]]);
        let g = Matrix::from_rows(&[&[0.5, -2.0]]);
        let mut adam = Adam::new(0.1);
        adam.step(vec![NamedParam { name: "w".into(), value: &mut w, grad: &g }]);
        assert!((w.data[0] - 0.9).abs() < 1e-6);
        assert!((w.data[1] + 0.9).abs() < 1e-6);
        assert_eq!(adam.steps_taken(), 1);
    }

    #[test]
    fn state_round_trips_through_state_dict() {
        let mut model = AutoEncoder::new(AutoEncoderSpec::new(4, 3, 2));
        let mut adam = Adam::new(1e-3);
        let x = Matrix::from_rows(&[&[0.1, 0.2, 0.3, 0.4]]);
        let (_, decoded) = model.forward(&x);
        model.backward(&(&decoded - &x));
        adam.step(model.named_params_mut());

        let state = adam.state_dict();
        assert_eq!(state.len(), 1 + 2 * 8);

        let mut restored = Adam::new(1e-3);
        restored.load_state_dict(state.clone(), &model.parameter_shapes()).unwrap();
        assert_eq!(restored.state_dict(), state);
    }

    #[test]
    fn rejects_state_without_step() {
        let shapes = BTreeMap::new();
        let err = Adam::new(1e-3).load_state_dict(StateDict::new(), &shapes).unwrap_err();
        assert!(matches!(err, TrainError::IncompatibleState(_)));
    }
}
