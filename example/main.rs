use rmlp::prelude::*;

fn main() -> Result<()> {
    let mut network = Network::new(
        &[784, 100, 100, 10],
        Activation::Sigmoid,
        Cost::CrossEntropy,
    )?;

    network.init_random_weights();

    network.load_data("data/mnist_train.csv", 784, 60000)?;

    network.train(10, 100, 1.0, 0.1, 0.9)?;

    println!("training set cost: {:.4}", network.dataset_cost()?);

    network.clear_data();

    network.load_data("data/mnist_test.csv", 784, 10000)?;

    network.test()?;

    network.save_weights("./mnist.weights")?;

    Ok(())
}
