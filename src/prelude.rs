pub use serde::{Serialize, Deserialize};

pub use ndarray::*;
pub use ndarray_rand::RandomExt;
pub use ndarray_rand::rand_distr::StandardNormal;

pub use crate::models::Network;
pub use crate::error::*;

// Internal re-exports
pub use crate::core::{Activation, Cost, Dense, LayerCache, apply_update};
pub use crate::data::Sample;
pub use crate::utils::max_value_index;
