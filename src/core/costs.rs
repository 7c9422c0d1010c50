use crate::prelude::*;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cost {
    MeanSquareError,
    CrossEntropy,
    None,
}

impl Cost {
    /// Total cost of one output vector against its expected vector.
    pub fn cost(&self, outputs: ArrayView1<f64>, expected: ArrayView1<f64>) -> Result<f64> {
        if outputs.len() != expected.len() {
            return Err(NNError::LayerShapeMismatch(format!(
                "output length {} doesn't match expected length {}",
                outputs.len(),
                expected.len()
            )));
        }

        match self {
            Cost::MeanSquareError => {
                let cost = outputs
                    .iter()
                    .zip(expected.iter())
                    .map(|(o, e)| (o - e) * (o - e))
                    .sum::<f64>();
                Ok(0.5 * cost)
            }
            Cost::CrossEntropy => {
                let mut cost = 0.0;
                for (&o, &e) in outputs.iter().zip(expected.iter()) {
                    let term = if e == 1.0 { -o.ln() } else { -(1.0 - o).ln() };
                    // Outputs saturated at exactly 0 or 1 produce an infinite
                    // term; those contribute nothing instead of poisoning the
                    // total.
                    if term.is_finite() {
                        cost += term;
                    }
                }
                Ok(cost)
            }
            Cost::None => Err(NNError::InvalidCost("no cost function selected".to_string())),
        }
    }

    /// Derivative of the cost with respect to a single output unit.
    pub fn derivative(&self, output: f64, expected: f64) -> Result<f64> {
        match self {
            Cost::MeanSquareError => Ok(output - expected),
            Cost::CrossEntropy => {
                // The quotient blows up at the poles; the derivative is
                // pinned to 0 there.
                if output == 0.0 || output == 1.0 {
                    Ok(0.0)
                } else {
                    Ok((expected - output) / (output * (output - 1.0)))
                }
            }
            Cost::None => Err(NNError::InvalidCost("no cost function selected".to_string())),
        }
    }
}
