#[allow(unused)]
use crate::prelude::*;

#[macro_export]
macro_rules! rand_array {
    ($($x:expr),*) => {
        {
            Array::random(($($x,)*), StandardNormal)
        }
    };
}

/// Index of the largest value; ties resolve to the earliest index.
pub fn max_value_index(values: ArrayView1<f64>) -> usize {
    let mut index = 0;
    let mut max_value = f64::NEG_INFINITY;
    for (i, &value) in values.iter().enumerate() {
        if value > max_value {
            max_value = value;
            index = i;
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_max_value_index() {
        assert_eq!(max_value_index(array![0.1, 0.9, 0.2].view()), 1);
        assert_eq!(max_value_index(array![3.0, 1.0, 2.0].view()), 0);
    }

    #[test]
    fn test_max_value_index_tie_picks_earliest() {
        assert_eq!(max_value_index(array![0.5, 0.5].view()), 0);
        assert_eq!(max_value_index(array![0.0, 0.7, 0.7, 0.1].view()), 1);
    }
}
