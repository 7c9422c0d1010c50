use crate::prelude::*;

/// SGD step with momentum and multiplicative weight decay.
///
/// Per element: `v = v*momentum - g*learn_rate`, then
/// `p = p*weight_decay + v`. The accumulated gradient is zeroed afterwards
/// so the buffer is ready for the next mini-batch. Callers pass a
/// `weight_decay` of 1.0 for parameters that are not decayed (biases).
pub fn apply_update<D: Dimension>(
    params: &mut Array<f64, D>,
    velocities: &mut Array<f64, D>,
    gradients: &mut Array<f64, D>,
    learn_rate: f64,
    weight_decay: f64,
    momentum: f64,
) {
    Zip::from(&mut *params)
        .and(&mut *velocities)
        .and(&mut *gradients)
        .for_each(|p, v, g| {
            *v = *v * momentum - *g * learn_rate;
            *p = *p * weight_decay + *v;
        });
    gradients.fill(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_update_rule() {
        let mut params = array![1.0, 2.0];
        let mut velocities = array![0.5, 0.0];
        let mut gradients = array![0.1, -0.2];

        apply_update(&mut params, &mut velocities, &mut gradients, 0.1, 0.99, 0.9);

        // v = 0.5*0.9 - 0.1*0.1 = 0.44; p = 1.0*0.99 + 0.44
        assert!((velocities[0] - 0.44).abs() < 1e-12);
        assert!((params[0] - 1.43).abs() < 1e-12);
        // v = 0.0*0.9 - (-0.2)*0.1 = 0.02; p = 2.0*0.99 + 0.02
        assert!((velocities[1] - 0.02).abs() < 1e-12);
        assert!((params[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_gradients_reset_after_update() {
        let mut params = array![[1.0, 1.0], [1.0, 1.0]];
        let mut velocities = Array2::zeros((2, 2));
        let mut gradients = array![[0.3, 0.3], [0.3, 0.3]];

        apply_update(&mut params, &mut velocities, &mut gradients, 0.5, 1.0, 0.0);

        assert!(gradients.iter().all(|&g| g == 0.0));
        assert!(params.iter().all(|&p| (p - 0.85).abs() < 1e-12));
    }

    #[test]
    fn test_velocity_carries_across_updates() {
        let mut params = array![0.0];
        let mut velocities = array![0.0];
        let mut gradients = array![1.0];

        apply_update(&mut params, &mut velocities, &mut gradients, 1.0, 1.0, 0.5);
        assert!((params[0] + 1.0).abs() < 1e-12);

        // Zero gradient: the step is pure momentum.
        apply_update(&mut params, &mut velocities, &mut gradients, 1.0, 1.0, 0.5);
        assert!((velocities[0] + 0.5).abs() < 1e-12);
        assert!((params[0] + 1.5).abs() < 1e-12);
    }
}
