// Finite-difference checks that the backward pass produces the gradients
// the forward pass implies.

use ndarray::array;
use rmlp::prelude::*;

fn relative_error(numerical: f64, analytical: f64) -> f64 {
    let numerator = (numerical - analytical).abs();
    let denominator = (numerical.abs() + analytical.abs()).max(1e-8);
    numerator / denominator
}

// Cost of a single sigmoid layer under mean squared error.
fn sigmoid_layer_cost(layer: &Dense, inputs: ArrayView1<f64>, expected: ArrayView1<f64>) -> f64 {
    let outputs = layer.forward(inputs, Activation::Sigmoid);
    Cost::MeanSquareError
        .cost(outputs.view(), expected)
        .unwrap()
}

// Node values for a sigmoid + mean-squared-error head, where the
// elementwise derivative composition is exact.
fn sigmoid_mse_node_values(cache: &mut LayerCache, expected: ArrayView1<f64>) {
    for i in 0..cache.node_values.len() {
        let cost_derivative = Cost::MeanSquareError
            .derivative(cache.activations[i], expected[i])
            .unwrap();
        let activation_derivative =
            Activation::Sigmoid.derivative(cache.weighted_inputs.view(), i);
        cache.node_values[i] = cost_derivative * activation_derivative;
    }
}

#[test]
fn test_single_sigmoid_layer_gradient_matches_finite_difference() {
    let mut layer = Dense::new(3, 2).unwrap();
    layer
        .set_parameters(
            array![[0.5, -0.3, 0.8], [0.2, 0.9, -0.6]],
            array![0.1, -0.2],
        )
        .unwrap();
    let inputs = array![0.7, -1.2, 0.4];
    let expected = array![1.0, 0.0];
    let epsilon = 1e-5;

    let mut cache = LayerCache::new(3, 2);
    layer.forward_cached(&mut cache, inputs.view(), Activation::Sigmoid);
    sigmoid_mse_node_values(&mut cache, expected.view());
    layer.accumulate_gradients(&cache);
    let (dw, db) = layer.gradients();

    for node_out in 0..2 {
        for node_in in 0..3 {
            layer.w[[node_out, node_in]] += epsilon;
            let cost_plus = sigmoid_layer_cost(&layer, inputs.view(), expected.view());
            layer.w[[node_out, node_in]] -= 2.0 * epsilon;
            let cost_minus = sigmoid_layer_cost(&layer, inputs.view(), expected.view());
            layer.w[[node_out, node_in]] += epsilon;

            let numerical = (cost_plus - cost_minus) / (2.0 * epsilon);
            let analytical = dw[[node_out, node_in]];
            let rel_error = relative_error(numerical, analytical);
            assert!(
                rel_error < 1e-5,
                "weight gradient mismatch at ({},{}): numerical={:.10}, analytical={:.10}",
                node_in,
                node_out,
                numerical,
                analytical
            );
        }
    }

    for node_out in 0..2 {
        layer.b[node_out] += epsilon;
        let cost_plus = sigmoid_layer_cost(&layer, inputs.view(), expected.view());
        layer.b[node_out] -= 2.0 * epsilon;
        let cost_minus = sigmoid_layer_cost(&layer, inputs.view(), expected.view());
        layer.b[node_out] += epsilon;

        let numerical = (cost_plus - cost_minus) / (2.0 * epsilon);
        let rel_error = relative_error(numerical, db[node_out]);
        assert!(
            rel_error < 1e-5,
            "bias gradient mismatch at {}: numerical={:.10}, analytical={:.10}",
            node_out,
            numerical,
            db[node_out]
        );
    }
}

#[test]
fn test_hidden_layer_gradient_matches_finite_difference() {
    // Two sigmoid layers under mean squared error; the hidden layer's node
    // values come from the backward chain through the output layer's
    // weights, so this checks the cross-layer propagation exactly.
    let mut hidden = Dense::new(2, 3).unwrap();
    hidden
        .set_parameters(
            array![[0.5, 0.2], [0.3, 0.7], [-0.4, 0.6]],
            array![0.1, 0.2, -0.1],
        )
        .unwrap();
    let mut output = Dense::new(3, 2).unwrap();
    output
        .set_parameters(
            array![[0.4, -0.6, 0.3], [0.8, 0.1, -0.5]],
            array![0.0, 0.1],
        )
        .unwrap();
    let inputs = array![1.0, -2.0];
    let expected = array![0.8, 0.2];
    let epsilon = 1e-5;

    let two_layer_cost = |hidden: &Dense, output: &Dense| -> f64 {
        let mid = hidden.forward(inputs.view(), Activation::Sigmoid);
        let out = output.forward(mid.view(), Activation::Sigmoid);
        Cost::MeanSquareError
            .cost(out.view(), expected.view())
            .unwrap()
    };

    let mut hidden_cache = LayerCache::new(2, 3);
    let mut output_cache = LayerCache::new(3, 2);
    let mid = hidden.forward_cached(&mut hidden_cache, inputs.view(), Activation::Sigmoid);
    output.forward_cached(&mut output_cache, mid.view(), Activation::Sigmoid);

    sigmoid_mse_node_values(&mut output_cache, expected.view());
    hidden.hidden_node_values(
        &mut hidden_cache,
        &output,
        output_cache.node_values.view(),
        Activation::Sigmoid,
    );
    hidden.accumulate_gradients(&hidden_cache);
    let (dw, _) = hidden.gradients();

    for node_out in 0..3 {
        for node_in in 0..2 {
            hidden.w[[node_out, node_in]] += epsilon;
            let cost_plus = two_layer_cost(&hidden, &output);
            hidden.w[[node_out, node_in]] -= 2.0 * epsilon;
            let cost_minus = two_layer_cost(&hidden, &output);
            hidden.w[[node_out, node_in]] += epsilon;

            let numerical = (cost_plus - cost_minus) / (2.0 * epsilon);
            let analytical = dw[[node_out, node_in]];
            let rel_error = relative_error(numerical, analytical);
            assert!(
                rel_error < 1e-5,
                "hidden gradient mismatch at ({},{}): numerical={:.10}, analytical={:.10}",
                node_in,
                node_out,
                numerical,
                analytical
            );
        }
    }
}

#[test]
fn test_output_head_node_values_follow_the_fixed_pairing() {
    // The output head is a closed contract: squared-error delta times the
    // Softmax diagonal derivative, whatever cost the network was
    // configured with.
    let mut layer = Dense::new(2, 3).unwrap();
    layer
        .set_parameters(
            array![[0.3, -0.2], [0.5, 0.4], [-0.1, 0.7]],
            array![0.0, 0.1, -0.3],
        )
        .unwrap();
    let inputs = array![0.9, -0.4];
    let expected = array![0.0, 1.0, 0.0];

    let mut cache = LayerCache::new(2, 3);
    layer.forward_cached(&mut cache, inputs.view(), Activation::Softmax);
    layer.output_node_values(&mut cache, expected.view());

    for i in 0..3 {
        let delta = cache.activations[i] - expected[i];
        let diag = Activation::Softmax.derivative(cache.weighted_inputs.view(), i);
        assert!((cache.node_values[i] - delta * diag).abs() < 1e-12);
    }
}

#[test]
fn test_output_head_gradient_is_a_descent_direction() {
    // The head drops the Softmax cross-terms, so its gradient is not the
    // exact derivative of softmax-then-squared-error; it must still point
    // downhill on that cost.
    let mut layer = Dense::new(3, 2).unwrap();
    layer
        .set_parameters(
            array![[0.5, -0.3, 0.8], [0.2, 0.9, -0.6]],
            array![0.1, -0.2],
        )
        .unwrap();
    let inputs = array![0.7, -1.2, 0.4];
    let expected = array![1.0, 0.0];
    let epsilon = 1e-5;

    let softmax_cost = |layer: &Dense| -> f64 {
        let outputs = layer.forward(inputs.view(), Activation::Softmax);
        Cost::MeanSquareError
            .cost(outputs.view(), expected.view())
            .unwrap()
    };

    let mut cache = LayerCache::new(3, 2);
    layer.forward_cached(&mut cache, inputs.view(), Activation::Softmax);
    layer.output_node_values(&mut cache, expected.view());
    layer.accumulate_gradients(&cache);
    let (dw, _) = layer.gradients();

    let mut dot = 0.0;
    for node_out in 0..2 {
        for node_in in 0..3 {
            layer.w[[node_out, node_in]] += epsilon;
            let cost_plus = softmax_cost(&layer);
            layer.w[[node_out, node_in]] -= 2.0 * epsilon;
            let cost_minus = softmax_cost(&layer);
            layer.w[[node_out, node_in]] += epsilon;

            let numerical = (cost_plus - cost_minus) / (2.0 * epsilon);
            dot += numerical * dw[[node_out, node_in]];
        }
    }
    assert!(dot > 0.0, "head gradient opposes the true gradient: {}", dot);
}
