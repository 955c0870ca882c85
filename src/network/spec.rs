use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::Result;
use crate::layers::{ActivationLayer, ConvLayer, DenseLayer, Layer, Padding, PoolLayer};
use crate::loss::Loss;
use crate::math::random::default_random;
use crate::network::network::NeuralNet;
use crate::pool::PoolFunction;

/// Describes one layer of a network architecture.
///
/// Serialized with a `"type"` field selecting the variant, e.g.
/// `{"type": "dense", "size": 16, "learning_rate": 0.05}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        size: usize,
        learning_rate: f64,
    },
    Activation {
        function: Activation,
        /// Jacobian used in the backward pass; defaults to `function`'s own.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        derivative: Option<Activation>,
        learning_rate: f64,
    },
    Conv {
        in_height: usize,
        in_width: usize,
        kernels: usize,
        kernel_height: usize,
        kernel_width: usize,
        padding: Padding,
        learning_rate: f64,
    },
    Pool {
        in_height: usize,
        in_width: usize,
        window_height: usize,
        window_width: usize,
        function: PoolFunction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        derivative: Option<PoolFunction>,
    },
}

impl LayerSpec {
    /// Creates the unsized layer; sizes are negotiated when the network is built.
    pub fn to_layer(&self) -> Box<dyn Layer> {
        match *self {
            LayerSpec::Dense { size, learning_rate } => Box::new(DenseLayer::new(learning_rate, size)),
            LayerSpec::Activation { function, derivative, learning_rate } => Box::new(
                ActivationLayer::new(learning_rate, function)
                    .with_derivative(derivative.unwrap_or(function)),
            ),
            LayerSpec::Conv {
                in_height,
                in_width,
                kernels,
                kernel_height,
                kernel_width,
                padding,
                learning_rate,
            } => Box::new(ConvLayer::new(
                learning_rate,
                in_height,
                in_width,
                kernels,
                kernel_height,
                kernel_width,
                padding,
            )),
            LayerSpec::Pool { in_height, in_width, window_height, window_width, function, derivative } => {
                Box::new(
                    PoolLayer::new(in_height, in_width, window_height, window_width, function)
                        .with_derivative(derivative.unwrap_or(function)),
                )
            }
        }
    }
}

/// A serializable description of a network architecture and its loss.
///
/// Stored as JSON independently of trained parameters, so an architecture can
/// be written down before any training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name, used as the default model file stem.
    pub name: String,
    pub input_size: usize,
    pub loss: Loss,
    /// Gradient paired with `loss`; defaults to the loss's own gradient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_derivative: Option<Loss>,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
}

impl NetworkSpec {
    /// Builds the network with the default uniform initializer.
    pub fn build(&self) -> Result<NeuralNet> {
        self.build_with(default_random)
    }

    pub fn build_with(&self, generator: impl FnMut() -> f64) -> Result<NeuralNet> {
        let layers = self.layers.iter().map(LayerSpec::to_layer).collect();
        let net = NeuralNet::with_initializer(self.input_size, layers, self.loss, generator)?;
        Ok(net.with_loss_derivative(self.loss_derivative.unwrap_or(self.loss)))
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<NetworkSpec> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
