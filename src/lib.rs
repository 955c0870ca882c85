//! A small from-scratch neural-network engine: dense, activation,
//! FFT-convolution and pooling layers, online training, and a plain-text
//! model format.

pub mod activation;
pub mod error;
pub mod io;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod pool;
pub mod registry;
pub mod train;

// Convenience re-exports
pub use activation::Activation;
pub use error::{NnetError, Result};
pub use layers::{ActivationLayer, ConvLayer, DenseLayer, Layer, Padding, PoolLayer};
pub use loss::Loss;
pub use math::matrix::Matrix;
pub use network::{LayerSpec, NetworkSpec, NeuralNet};
pub use pool::PoolFunction;
pub use registry::FunctionCode;
pub use train::{evaluate_accuracy, train_loop, train_network, TrainConfig, TrainOutcome};
