use crate::prelude::*;
use ndarray_rand::rand_distr::{Distribution, Normal};

const FEATURE_SCALE: f64 = 255.0;
const NOISE_STD: f64 = 0.001;

/// One labeled training or test sample.
#[derive(Debug, Clone)]
pub struct Sample {
    pub label: usize,
    pub features: Array1<f64>,
}

/// Reads at most `data_size` samples from a headerless CSV file where each
/// row is a class label followed by `num_inputs` raw feature values.
///
/// Features are scaled by 1/255 and perturbed with Gaussian noise
/// (mean 0, sigma 0.001); the noise is a baked-in regularization step the
/// training loop expects to already be applied. The label field is parsed
/// exactly, without scaling or noise.
pub fn load_csv(path: &str, num_inputs: usize, data_size: usize) -> Result<Vec<Sample>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    let noise = Normal::new(0.0, NOISE_STD).map_err(|e| NNError::Other(e.to_string()))?;
    let mut rng = rand::thread_rng();

    let mut samples = Vec::with_capacity(data_size);
    for (row, record) in reader.records().enumerate() {
        if samples.len() == data_size {
            break;
        }
        let record = record?;
        if record.len() != num_inputs + 1 {
            return Err(NNError::DatasetError(format!(
                "row {} has {} fields, expected {}",
                row,
                record.len(),
                num_inputs + 1
            )));
        }

        let label = parse_field(&record, row, 0)? as usize;
        let mut features = Array1::zeros(num_inputs);
        for i in 0..num_inputs {
            let raw = parse_field(&record, row, i + 1)?;
            features[i] = raw / FEATURE_SCALE + noise.sample(&mut rng);
        }
        samples.push(Sample { label, features });
    }

    Ok(samples)
}

fn parse_field(record: &csv::StringRecord, row: usize, col: usize) -> Result<f64> {
    record[col].trim().parse::<f64>().map_err(|e| {
        NNError::DatasetError(format!("row {} field {}: {}", row, col, e))
    })
}
