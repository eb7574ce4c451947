use serde::{Serialize, Deserialize};
use std::fmt;

/// Negative-side slope of `LeakyRelu`.
pub const LEAKY_SLOPE: f64 = 0.01;

/// Element-wise non-linearity applied after a dense layer's affine map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Identity,
    Relu,
    LeakyRelu,
    Sigmoid,
    Tanh,
}

impl Activation {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu => if x > 0.0 { x } else { LEAKY_SLOPE * x },
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
        }
    }

    /// Derivative with respect to the pre-activation `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            Activation::Identity => 1.0,
            Activation::Relu => if x > 0.0 { 1.0 } else { 0.0 },
            Activation::LeakyRelu => if x > 0.0 { 1.0 } else { LEAKY_SLOPE },
            Activation::Sigmoid => {
                let s = self.function(x);
                s * (1.0 - s)
            }
            Activation::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }

    /// He init suits the rectifiers, Xavier the saturating and linear units.
    pub fn prefers_he_init(&self) -> bool {
        matches!(self, Activation::Relu | Activation::LeakyRelu)
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Identity => write!(f, "Identity"),
            Activation::Relu => write!(f, "ReLU"),
            Activation::LeakyRelu => write!(f, "LeakyReLU(negative_slope={LEAKY_SLOPE})"),
            Activation::Sigmoid => write!(f, "Sigmoid"),
            Activation::Tanh => write!(f, "Tanh"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivatives_match_finite_differences() {
        let h = 1e-6;
        for act in [
            Activation::Identity,
            Activation::Relu,
            Activation::LeakyRelu,
            Activation::Sigmoid,
            Activation::Tanh,
        ] {
            // Away from 0, where the rectifiers have a kink.
            for &x in &[-1.5, -0.3, 0.4, 2.0] {
                let numeric = (act.function(x + h) - act.function(x - h)) / (2.0 * h);
                assert!((numeric - act.derivative(x)).abs() < 1e-5, "{act} at {x}");
            }
        }
    }

    #[test]
    fn names_match_the_command_line() {
        use clap::ValueEnum;
        let names: Vec<String> = Activation::value_variants().iter()
            .filter_map(|a| a.to_possible_value())
            .map(|v| v.get_name().to_owned())
            .collect();
        assert_eq!(names, vec!["identity", "relu", "leaky-relu", "sigmoid", "tanh"]);
        assert_eq!(serde_json::to_string(&Activation::LeakyRelu).unwrap(), "\"leaky_relu\"");
    }
}
