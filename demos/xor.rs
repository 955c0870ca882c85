use nnet::{
    train_loop, Activation, ActivationLayer, DenseLayer, Layer, Loss, NeuralNet, TrainConfig, TrainOutcome,
};

fn main() -> nnet::Result<()> {
    tracing_subscriber::fmt::init();

    let layers: Vec<Box<dyn Layer>> = vec![
        Box::new(DenseLayer::new(0.1, 3)),
        Box::new(ActivationLayer::new(0.1, Activation::Tanh)),
        Box::new(DenseLayer::new(0.1, 1)),
        Box::new(ActivationLayer::new(0.1, Activation::Sigmoid)),
    ];
    let mut net = NeuralNet::new(2, layers, Loss::SquaredError)?;

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    let config = TrainConfig::new(5000).report_every(2000);
    match train_loop(&mut net, &inputs, &expected_outputs, &config)? {
        TrainOutcome::Diverged { epoch, .. } => println!("Diverged in epoch {epoch}"),
        outcome => println!("Final loss: {:.6}", outcome.last_loss().unwrap_or(f64::NAN)),
    }

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, net.query(input)?[0]);
    }
    Ok(())
}
