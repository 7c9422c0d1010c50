#[allow(unused)]
use crate::prelude::*;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
    Silu,
    Softmax,
}

impl Activation {
    /// Activated value at `index`. The whole pre-activation vector is passed
    /// because Softmax depends on every element; the sum is recomputed on
    /// each call, which is O(n) per index at these layer widths.
    pub fn activate(&self, values: ArrayView1<f64>, index: usize) -> f64 {
        match self {
            Self::Sigmoid => sigmoid(values[index]),
            Self::Tanh => values[index].tanh(),
            Self::Relu => values[index].max(0.0),
            Self::Silu => values[index] * sigmoid(values[index]),
            Self::Softmax => {
                let exp_sum: f64 = values.iter().map(|v| v.exp()).sum();
                values[index].exp() / exp_sum
            }
        }
    }

    /// Analytic derivative at `index`, matching `activate`.
    ///
    /// The Softmax arm is the diagonal Jacobian entry only; cross-terms with
    /// the other outputs are dropped. It is valid exclusively inside the
    /// fixed output-head pairing and must not be combined with arbitrary
    /// costs.
    pub fn derivative(&self, values: ArrayView1<f64>, index: usize) -> f64 {
        match self {
            Self::Sigmoid => {
                let a = sigmoid(values[index]);
                a * (1.0 - a)
            }
            Self::Tanh => {
                let t = values[index].tanh();
                1.0 - t * t
            }
            // Subgradient at 0 defined as 0
            Self::Relu => {
                if values[index] > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Silu => {
                let sig = sigmoid(values[index]);
                sig + values[index] * sig * (1.0 - sig)
            }
            Self::Softmax => {
                let exp_sum: f64 = values.iter().map(|v| v.exp()).sum();
                let ex = values[index].exp();
                (ex * exp_sum - ex * ex) / (exp_sum * exp_sum)
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
