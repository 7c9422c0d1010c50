use crate::prelude::*;
use crate::core::optimizers::apply_update;
use crate::rand_array;
use std::sync::Mutex;

/// Per-sample scratch for one layer's forward/backward pass. Each training
/// sample owns a private cache per layer for the duration of its pass;
/// caches are never shared between concurrently processed samples.
#[derive(Debug, Clone)]
pub struct LayerCache {
    pub inputs: Array1<f64>,
    pub weighted_inputs: Array1<f64>,
    pub activations: Array1<f64>,
    pub node_values: Array1<f64>,
}

impl LayerCache {
    pub fn new(num_in: usize, num_out: usize) -> Self {
        Self {
            inputs: Array1::zeros(num_in),
            weighted_inputs: Array1::zeros(num_out),
            activations: Array1::zeros(num_out),
            node_values: Array1::zeros(num_out),
        }
    }
}

#[derive(Debug)]
struct Gradients {
    dw: Array2<f64>,
    db: Array1<f64>,
}

/// One affine map from `num_in` inputs to `num_out` outputs plus the
/// nonlinearity applied to its outputs.
///
/// `w` is `(num_out, num_in)`; ndarray's row-major layout puts the weight
/// connecting input `i` to output `o` at flat offset `o*num_in + i`. The
/// gradient accumulators live behind a mutex because every sample of a
/// mini-batch sums into them concurrently; velocities are only touched by
/// the single-threaded update after the batch barrier.
#[derive(Debug)]
pub struct Dense {
    num_in: usize,
    num_out: usize,
    pub w: Array2<f64>,
    pub b: Array1<f64>,
    grads: Mutex<Gradients>,
    vw: Array2<f64>,
    vb: Array1<f64>,
}

impl Dense {
    /// Builds a layer with zeroed parameters and state. Parameters are
    /// populated by `init_random_weights` or `set_parameters`.
    pub fn new(num_in: usize, num_out: usize) -> Result<Self> {
        if num_in == 0 || num_out == 0 {
            return Err(NNError::InvalidLayerConfiguration(
                "Layer dimensions must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            num_in,
            num_out,
            w: Array2::zeros((num_out, num_in)),
            b: Array1::zeros(num_out),
            grads: Mutex::new(Gradients {
                dw: Array2::zeros((num_out, num_in)),
                db: Array1::zeros(num_out),
            }),
            vw: Array2::zeros((num_out, num_in)),
            vb: Array1::zeros(num_out),
        })
    }

    pub fn num_in(&self) -> usize {
        self.num_in
    }

    pub fn num_out(&self) -> usize {
        self.num_out
    }

    /// Weight connecting input node `node_in` to output node `node_out`.
    pub fn weight(&self, node_in: usize, node_out: usize) -> f64 {
        self.w[[node_out, node_in]]
    }

    /// Draws every weight and bias i.i.d. from a standard normal. The draw
    /// is not scaled by layer width, so wide layers start with large
    /// pre-activation variance.
    pub fn init_random_weights(&mut self) {
        self.w = rand_array!(self.num_out, self.num_in);
        self.b = rand_array!(self.num_out);
    }

    /// Replaces the parameters, validating shapes; velocities and any
    /// accumulated gradients are reset.
    pub fn set_parameters(&mut self, w: Array2<f64>, b: Array1<f64>) -> Result<()> {
        if w.dim() != (self.num_out, self.num_in) || b.len() != self.num_out {
            return Err(NNError::LayerShapeMismatch(format!(
                "expected weights {:?} and biases {}, got {:?} and {}",
                (self.num_out, self.num_in),
                self.num_out,
                w.dim(),
                b.len()
            )));
        }
        self.w = w;
        self.b = b;
        self.vw.fill(0.0);
        self.vb.fill(0.0);
        let grads = self.grads.get_mut().expect("gradient lock poisoned");
        grads.dw.fill(0.0);
        grads.db.fill(0.0);
        Ok(())
    }

    /// Layer outputs for `inputs`; intermediate values are discarded.
    pub fn forward(&self, inputs: ArrayView1<f64>, activation: Activation) -> Array1<f64> {
        let weighted_inputs = self.w.dot(&inputs) + &self.b;
        Array1::from_shape_fn(self.num_out, |i| {
            activation.activate(weighted_inputs.view(), i)
        })
    }

    /// Same as `forward`, recording inputs, weighted inputs and activations
    /// into `cache` for the backward pass.
    pub fn forward_cached(
        &self,
        cache: &mut LayerCache,
        inputs: ArrayView1<f64>,
        activation: Activation,
    ) -> Array1<f64> {
        cache.inputs.assign(&inputs);
        cache.weighted_inputs = self.w.dot(&inputs) + &self.b;
        for i in 0..self.num_out {
            cache.activations[i] = activation.activate(cache.weighted_inputs.view(), i);
        }
        cache.activations.clone()
    }

    /// Node values for the final layer.
    ///
    /// The output head is a fixed policy: the layer's outputs went through
    /// Softmax, and the error signal is the squared-error delta `(a - e)`
    /// times the Softmax diagonal derivative. The network's configured cost
    /// kind is consumed by cost reporting, never here.
    pub fn output_node_values(&self, cache: &mut LayerCache, expected: ArrayView1<f64>) {
        for i in 0..self.num_out {
            let cost_derivative = cache.activations[i] - expected[i];
            let activation_derivative =
                Activation::Softmax.derivative(cache.weighted_inputs.view(), i);
            cache.node_values[i] = cost_derivative * activation_derivative;
        }
    }

    /// Node values for a hidden layer, propagating the error one layer
    /// backward through `next`'s weights (read-only borrow).
    pub fn hidden_node_values(
        &self,
        cache: &mut LayerCache,
        next: &Dense,
        next_node_values: ArrayView1<f64>,
        activation: Activation,
    ) {
        for node in 0..self.num_out {
            let mut value = 0.0;
            for (next_node, &next_value) in next_node_values.iter().enumerate() {
                // d(next weighted input)/d(this activation) is the
                // connecting weight
                value += next.weight(node, next_node) * next_value;
            }
            value *= activation.derivative(cache.weighted_inputs.view(), node);
            cache.node_values[node] = value;
        }
    }

    /// Adds one sample's contribution to the shared gradient accumulators.
    ///
    /// The whole per-layer accumulation sits in one critical section;
    /// concurrent samples summing into the same buffers with anything
    /// narrower would lose updates.
    pub fn accumulate_gradients(&self, cache: &LayerCache) {
        let mut grads = self.grads.lock().expect("gradient lock poisoned");
        for node_out in 0..self.num_out {
            let node_value = cache.node_values[node_out];
            for node_in in 0..self.num_in {
                grads.dw[[node_out, node_in]] += cache.inputs[node_in] * node_value;
            }
            grads.db[node_out] += node_value;
        }
    }

    /// Applies the accumulated gradient and resets it. Weight decay is
    /// multiplicative on the weights only; biases take the plain momentum
    /// step. Runs single-threaded, after the mini-batch barrier.
    pub fn apply_gradients(&mut self, learn_rate: f64, regularization: f64, momentum: f64) {
        let weight_decay = 1.0 - regularization * learn_rate;
        let grads = self.grads.get_mut().expect("gradient lock poisoned");
        apply_update(
            &mut self.w,
            &mut self.vw,
            &mut grads.dw,
            learn_rate,
            weight_decay,
            momentum,
        );
        apply_update(&mut self.b, &mut self.vb, &mut grads.db, learn_rate, 1.0, momentum);
    }

    /// Snapshot of the accumulated gradients.
    pub fn gradients(&self) -> (Array2<f64>, Array1<f64>) {
        let grads = self.grads.lock().expect("gradient lock poisoned");
        (grads.dw.clone(), grads.db.clone())
    }
}
