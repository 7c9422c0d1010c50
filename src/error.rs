use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum NNError {
    // Topology related errors
    InvalidTopology(String),
    InvalidLayerConfiguration(String),
    LayerShapeMismatch(String),

    // Cost related errors
    CostNotSet,
    InvalidCost(String),

    // Dataset related errors
    EmptyDataset,
    DatasetError(String),

    // File operations
    ModelLoadError(String),
    ModelSaveError(String),

    IoError(std::io::Error),
    SerializationError(Box<bincode::ErrorKind>),
    CsvError(csv::Error),

    Other(String),
}

impl fmt::Display for NNError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NNError::InvalidTopology(msg) => write!(f, "Invalid topology: {}", msg),
            NNError::InvalidLayerConfiguration(msg) => write!(f, "Invalid layer configuration: {}", msg),
            NNError::LayerShapeMismatch(msg) => write!(f, "Layer shape mismatch: {}", msg),
            NNError::CostNotSet => write!(f, "Cost function not set"),
            NNError::InvalidCost(msg) => write!(f, "Invalid cost function: {}", msg),
            NNError::EmptyDataset => write!(f, "No dataset loaded"),
            NNError::DatasetError(msg) => write!(f, "Dataset error: {}", msg),
            NNError::ModelLoadError(msg) => write!(f, "Failed to load weights: {}", msg),
            NNError::ModelSaveError(msg) => write!(f, "Failed to save weights: {}", msg),
            NNError::IoError(err) => write!(f, "I/O error: {}", err),
            NNError::SerializationError(err) => write!(f, "Serialization error: {}", err),
            NNError::CsvError(err) => write!(f, "CSV error: {}", err),
            NNError::Other(err) => write!(f, "Other error: {}", err),
        }
    }
}

impl From<std::io::Error> for NNError {
    fn from(err: std::io::Error) -> NNError {
        NNError::IoError(err)
    }
}

impl From<Box<bincode::ErrorKind>> for NNError {
    fn from(err: Box<bincode::ErrorKind>) -> NNError {
        NNError::SerializationError(err)
    }
}

impl From<csv::Error> for NNError {
    fn from(err: csv::Error) -> NNError {
        NNError::CsvError(err)
    }
}

impl Error for NNError {}

pub type Result<T> = std::result::Result<T, NNError>;
