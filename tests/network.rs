use approx::assert_abs_diff_eq;
use nnet::{
    train_network, Activation, ActivationLayer, ConvLayer, DenseLayer, Layer, LayerSpec, Loss, NetworkSpec,
    NeuralNet, NnetError, Padding, PoolFunction, PoolLayer,
};

#[test]
fn dense_tanh_stack_is_deterministic_with_constant_parameters() {
    let layers: Vec<Box<dyn Layer>> = vec![
        Box::new(DenseLayer::new(0.1, 2)),
        Box::new(ActivationLayer::new(0.1, Activation::Tanh)),
    ];
    let mut net = NeuralNet::with_initializer(3, layers, Loss::SquaredError, || 0.5).unwrap();

    let out = net.query(&[1.0, 0.0, 0.0]).unwrap();
    assert_eq!(out.len(), 2);
    assert_abs_diff_eq!(out[0], 0.5f64.tanh(), epsilon = 1e-12);
    assert_abs_diff_eq!(out[1], 0.5f64.tanh(), epsilon = 1e-12);
}

#[test]
fn fitting_a_single_dense_layer_lowers_the_loss() {
    let mut values = [0.2, -0.1, 0.4, 0.3, 0.0, -0.5].into_iter();
    let mut net = NeuralNet::with_initializer(
        3,
        vec![Box::new(DenseLayer::new(0.05, 2))],
        Loss::SquaredError,
        move || values.next().unwrap_or(0.0),
    )
    .unwrap();

    let (x, t) = ([1.0, -1.0, 0.5], [1.0, -1.0]);
    let first = net.fit(&x, &t).unwrap();
    let second = net.fit(&x, &t).unwrap();
    assert!(second < first, "{} !< {}", second, first);
}

#[test]
fn training_passes_reduce_the_loss() {
    let inputs = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
    let targets = vec![vec![0.5], vec![-0.5], vec![0.0]];
    let mut net = NeuralNet::with_initializer(
        2,
        vec![Box::new(DenseLayer::new(0.1, 1))],
        Loss::SquaredError,
        || 0.0,
    )
    .unwrap();

    let first = train_network(&mut net, &inputs, &targets).unwrap();
    let mut last = first;
    for _ in 0..50 {
        last = train_network(&mut net, &inputs, &targets).unwrap();
    }
    assert!(last < first / 10.0);
}

#[test]
fn incompatible_layer_chain_fails_negotiation() {
    // 5 inputs cannot be cut into 2×2 planes.
    let layers: Vec<Box<dyn Layer>> = vec![Box::new(PoolLayer::new(2, 2, 2, 2, PoolFunction::Max))];
    assert!(matches!(
        NeuralNet::new(5, layers, Loss::SquaredError),
        Err(NnetError::SizeMismatch { .. })
    ));

    // A 4×4 kernel does not fit a 3×3 plane.
    let layers: Vec<Box<dyn Layer>> = vec![Box::new(ConvLayer::new(0.1, 3, 3, 1, 4, 4, Padding::Valid))];
    assert!(matches!(
        NeuralNet::new(9, layers, Loss::SquaredError),
        Err(NnetError::SizeMismatch { .. })
    ));
}

#[test]
fn query_rejects_wrong_input_length() {
    let mut net = NeuralNet::new(3, vec![Box::new(DenseLayer::new(0.1, 2))], Loss::SquaredError).unwrap();
    assert!(matches!(
        net.query(&[1.0, 2.0]),
        Err(NnetError::SizeMismatch { expected: 3, actual: 2, .. })
    ));
    assert!(matches!(net.back_query(&[1.0]), Err(NnetError::SizeMismatch { .. })));
}

#[test]
fn clones_do_not_share_parameters() {
    let mut source =
        NeuralNet::with_initializer(2, vec![Box::new(DenseLayer::new(0.5, 2))], Loss::SquaredError, || 0.25)
            .unwrap();
    let mut copy = source.clone();
    let layers = source.layers_copy();

    let x = [1.0, 2.0];
    let before = source.query(&x).unwrap();
    for _ in 0..5 {
        copy.fit(&x, &[3.0, -3.0]).unwrap();
    }
    assert_eq!(source.query(&x).unwrap(), before);
    assert_ne!(copy.query(&x).unwrap(), before);

    let mut rebuilt = NeuralNet::new(2, layers, Loss::SquaredError).unwrap();
    assert_eq!(rebuilt.layers().len(), 1);
    assert_eq!(rebuilt.query(&x).unwrap().len(), 2);
}

#[test]
fn convolution_and_pooling_shapes_flow_through_the_network() {
    let spec = NetworkSpec {
        name: "shapes".into(),
        input_size: 2 * 4 * 4,
        loss: Loss::SquaredError,
        loss_derivative: None,
        layers: vec![
            LayerSpec::Conv {
                in_height: 4,
                in_width: 4,
                kernels: 3,
                kernel_height: 2,
                kernel_width: 2,
                padding: Padding::Valid,
                learning_rate: 0.01,
            },
            LayerSpec::Pool {
                in_height: 3,
                in_width: 3,
                window_height: 2,
                window_width: 2,
                function: PoolFunction::Average,
                derivative: None,
            },
        ],
    };
    let mut net = spec.build_with(|| 1.0).unwrap();
    // 2 input planes × 3 kernels of 3×3, pooled to 2×2.
    assert_eq!(net.output_size(), 6 * 4);

    let out = net.query(&[1.0; 32]).unwrap();
    // An all-ones 2×2 kernel over all-ones planes gives 4 everywhere.
    assert!(out.iter().all(|&v| (v - 4.0).abs() < 1e-9));

    let grad = net.back_query(&[0.0; 24]).unwrap();
    assert_eq!(grad.len(), 32);
}
