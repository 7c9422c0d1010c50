use crate::prelude::*;
use crate::data::{self, Sample};
use crate::utils::max_value_index;
use rayon::prelude::*;
use std::fs::File;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

const LEARN_RATE_DECAY: f64 = 0.8;

#[derive(Serialize, Deserialize)]
struct LayerParams {
    w: Array2<f64>,
    b: Array1<f64>,
}

/// A feedforward classifier: an ordered chain of `Dense` layers plus the
/// in-memory dataset it trains and evaluates on.
///
/// Hidden layers run the configured activation; the output layer always
/// runs Softmax, and training always drives it with the squared-error ×
/// Softmax-derivative head (see `Dense::output_node_values`). The
/// configured cost kind is consumed by `dataset_cost`.
pub struct Network {
    layers: Vec<Dense>,
    layer_sizes: Vec<usize>,
    activation: Activation,
    cost: Cost,
    data: Vec<Sample>,
    num_correct: AtomicUsize,
}

impl Network {
    /// Builds chained layers from an ordered size sequence
    /// `[n0, n1, .., nk]`. Degenerate topologies and an unset cost kind are
    /// configuration errors.
    pub fn new(layer_sizes: &[usize], activation: Activation, cost: Cost) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(NNError::InvalidTopology(format!(
                "need at least an input and an output size, got {:?}",
                layer_sizes
            )));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(NNError::InvalidTopology(
                "layer sizes must be greater than 0".to_string(),
            ));
        }
        if cost == Cost::None {
            return Err(NNError::CostNotSet);
        }

        let mut layers = Vec::with_capacity(layer_sizes.len() - 1);
        for pair in layer_sizes.windows(2) {
            layers.push(Dense::new(pair[0], pair[1])?);
        }

        Ok(Self {
            layers,
            layer_sizes: layer_sizes.to_vec(),
            activation,
            cost,
            data: Vec::new(),
            num_correct: AtomicUsize::new(0),
        })
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Dense] {
        &mut self.layers
    }

    pub fn init_random_weights(&mut self) {
        for layer in &mut self.layers {
            layer.init_random_weights();
        }
    }

    /// Runs every layer in order; the final layer always uses Softmax
    /// regardless of the configured activation.
    pub fn forward_pass(&self, inputs: ArrayView1<f64>) -> Array1<f64> {
        let last = self.layers.len() - 1;
        let mut current = inputs.to_owned();
        for layer in &self.layers[..last] {
            current = layer.forward(current.view(), self.activation);
        }
        self.layers[last].forward(current.view(), Activation::Softmax)
    }

    fn forward_pass_cached(
        &self,
        caches: &mut [LayerCache],
        inputs: ArrayView1<f64>,
    ) -> Array1<f64> {
        let last = self.layers.len() - 1;
        let mut current = inputs.to_owned();
        for (layer, cache) in self.layers[..last].iter().zip(caches[..last].iter_mut()) {
            current = layer.forward_cached(cache, current.view(), self.activation);
        }
        self.layers[last].forward_cached(&mut caches[last], current.view(), Activation::Softmax)
    }

    /// One sample's gradient contribution: capturing forward pass, output
    /// node values, then the reverse sweep accumulating into every layer.
    /// The caches are private to this call, so samples of a batch can run
    /// concurrently; the layers' accumulators do their own locking.
    fn train_sample(&self, index: usize) {
        let sample = &self.data[index];
        let mut caches: Vec<LayerCache> = self
            .layers
            .iter()
            .map(|layer| LayerCache::new(layer.num_in(), layer.num_out()))
            .collect();

        let outputs = self.forward_pass_cached(&mut caches, sample.features.view());

        let last = self.layers.len() - 1;
        let mut expected = Array1::zeros(self.layers[last].num_out());
        expected[sample.label] = 1.0;

        self.layers[last].output_node_values(&mut caches[last], expected.view());
        self.layers[last].accumulate_gradients(&caches[last]);

        for i in (0..last).rev() {
            let (head, tail) = caches.split_at_mut(i + 1);
            self.layers[i].hidden_node_values(
                &mut head[i],
                &self.layers[i + 1],
                tail[0].node_values.view(),
                self.activation,
            );
            self.layers[i].accumulate_gradients(&head[i]);
        }

        if max_value_index(outputs.view()) == sample.label {
            self.num_correct.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Mini-batch SGD over the loaded dataset. Per epoch the learn rate
    /// decays by a fixed 0.8; per batch window one rayon task runs per
    /// sample, all join, then every layer applies its accumulated gradient
    /// scaled by `learn_rate / batch_len`. The tail window is clamped to
    /// the dataset length.
    pub fn train(
        &mut self,
        iterations: usize,
        mini_batch_size: usize,
        mut learn_rate: f64,
        regularization: f64,
        momentum: f64,
    ) -> Result<()> {
        if self.data.is_empty() {
            return Err(NNError::EmptyDataset);
        }
        if mini_batch_size == 0 {
            return Err(NNError::Other(
                "mini-batch size must be greater than 0".to_string(),
            ));
        }

        for iteration in 0..iterations {
            learn_rate *= LEARN_RATE_DECAY;

            for batch_start in (0..self.data.len()).step_by(mini_batch_size) {
                let batch_end = (batch_start + mini_batch_size).min(self.data.len());
                let batch_len = batch_end - batch_start;

                self.num_correct.store(0, Ordering::Relaxed);

                // Fork-join barrier: every sample of the window completes
                // before any parameter moves.
                let network = &*self;
                (batch_start..batch_end)
                    .into_par_iter()
                    .for_each(|i| network.train_sample(i));

                for layer in &mut self.layers {
                    layer.apply_gradients(
                        learn_rate / batch_len as f64,
                        regularization,
                        momentum,
                    );
                }

                let accuracy =
                    self.num_correct.load(Ordering::Relaxed) as f64 / batch_len as f64;
                println!(
                    "[epoch {}/{}] batch accuracy: {:.2}%",
                    iteration + 1,
                    iterations,
                    accuracy * 100.0
                );
            }
        }

        Ok(())
    }

    /// Fraction of loaded samples whose arg-max output matches the label.
    pub fn test(&self) -> Result<f64> {
        if self.data.is_empty() {
            return Err(NNError::EmptyDataset);
        }

        let mut num_correct = 0;
        for sample in &self.data {
            let outputs = self.forward_pass(sample.features.view());
            if max_value_index(outputs.view()) == sample.label {
                num_correct += 1;
            }
        }

        let accuracy = num_correct as f64 / self.data.len() as f64;
        println!("{}/{}", num_correct, self.data.len());
        println!("{:.2}%", accuracy * 100.0);
        Ok(accuracy)
    }

    /// Mean cost over the loaded dataset against one-hot targets, computed
    /// with the configured cost kind.
    pub fn dataset_cost(&self) -> Result<f64> {
        if self.data.is_empty() {
            return Err(NNError::EmptyDataset);
        }

        let num_out = self.layers[self.layers.len() - 1].num_out();
        let mut total = 0.0;
        for sample in &self.data {
            let outputs = self.forward_pass(sample.features.view());
            let mut expected = Array1::zeros(num_out);
            expected[sample.label] = 1.0;
            total += self.cost.cost(outputs.view(), expected.view())?;
        }
        Ok(total / self.data.len() as f64)
    }

    pub fn load_data(&mut self, path: &str, num_inputs: usize, data_size: usize) -> Result<()> {
        let samples = data::load_csv(path, num_inputs, data_size)?;
        self.attach_data(samples)
    }

    /// Stores an in-memory dataset. Every sample must carry the same
    /// feature count and a label inside the output range. A feature count
    /// differing from the input layer's width rebuilds the first layer at
    /// the new width with fresh random parameters. The adjustment is logged,
    /// not an error, but it discards whatever that layer had learned.
    pub fn attach_data(&mut self, samples: Vec<Sample>) -> Result<()> {
        if samples.is_empty() {
            return Err(NNError::EmptyDataset);
        }

        let num_inputs = samples[0].features.len();
        let num_out = self.layer_sizes[self.layer_sizes.len() - 1];
        for (i, sample) in samples.iter().enumerate() {
            if sample.features.len() != num_inputs {
                return Err(NNError::DatasetError(format!(
                    "sample {} has {} features, expected {}",
                    i,
                    sample.features.len(),
                    num_inputs
                )));
            }
            if sample.label >= num_out {
                return Err(NNError::DatasetError(format!(
                    "sample {} has label {} outside the {} output classes",
                    i, sample.label, num_out
                )));
            }
        }

        if num_inputs != self.layer_sizes[0] {
            eprintln!(
                "Input layer resized to {} from {}",
                num_inputs, self.layer_sizes[0]
            );
            let mut first = Dense::new(num_inputs, self.layer_sizes[1])?;
            first.init_random_weights();
            self.layers[0] = first;
            self.layer_sizes[0] = num_inputs;
        }

        self.data = samples;
        Ok(())
    }

    pub fn clear_data(&mut self) {
        self.data.clear();
    }

    /// Serializes every layer's weights and biases with bincode.
    pub fn save_weights(&self, path: &str) -> Result<()> {
        let params: Vec<LayerParams> = self
            .layers
            .iter()
            .map(|layer| LayerParams {
                w: layer.w.clone(),
                b: layer.b.clone(),
            })
            .collect();

        let encoded: Vec<u8> =
            bincode::serialize(&params).map_err(NNError::SerializationError)?;

        File::create(path)
            .map_err(NNError::IoError)?
            .write_all(&encoded)
            .map_err(NNError::IoError)?;

        Ok(())
    }

    /// Loads weights saved by `save_weights`. Shapes are validated against
    /// the live topology; velocities and pending gradients reset.
    pub fn load_weights(&mut self, path: &str) -> Result<()> {
        let mut buffer = Vec::new();
        File::open(path)
            .map_err(NNError::IoError)?
            .read_to_end(&mut buffer)
            .map_err(NNError::IoError)?;

        let params: Vec<LayerParams> =
            bincode::deserialize(&buffer).map_err(NNError::SerializationError)?;

        if params.len() != self.layers.len() {
            return Err(NNError::ModelLoadError(format!(
                "file holds {} layers, network has {}",
                params.len(),
                self.layers.len()
            )));
        }
        for (layer, p) in self.layers.iter_mut().zip(params) {
            layer.set_parameters(p.w, p.b)?;
        }
        Ok(())
    }
}
