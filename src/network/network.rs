use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{NnetError, Result};
use crate::io::TokenReader;
use crate::layers::{read_layer, write_layer, Layer};
use crate::loss::Loss;
use crate::math::random::default_random;
use crate::registry::FunctionCode;

/// An ordered stack of layers trained against one loss function.
///
/// Construction runs size negotiation once: every layer is told its input size
/// and initialised, and its output size becomes the next layer's input size.
#[derive(Debug, Clone)]
pub struct NeuralNet {
    layers: Vec<Box<dyn Layer>>,
    input_size: usize,
    output_size: usize,
    loss: Loss,
    loss_derivative: Loss,
}

impl NeuralNet {
    /// Builds a network whose parameters are drawn uniformly from `[-1, 1)`.
    pub fn new(input_size: usize, layers: Vec<Box<dyn Layer>>, loss: Loss) -> Result<NeuralNet> {
        NeuralNet::with_initializer(input_size, layers, loss, default_random)
    }

    /// Builds a network, filling every learnable tensor from `generator`.
    pub fn with_initializer(
        input_size: usize,
        mut layers: Vec<Box<dyn Layer>>,
        loss: Loss,
        mut generator: impl FnMut() -> f64,
    ) -> Result<NeuralNet> {
        let mut size = input_size;
        for (index, layer) in layers.iter_mut().enumerate() {
            layer.set_input_size(size)?;
            layer.init_params(&mut generator);
            debug!(index, kind = %layer.kind(), in_size = size, out_size = layer.out_size(), "layer sized");
            size = layer.out_size();
        }

        Ok(NeuralNet {
            layers,
            input_size,
            output_size: size,
            loss,
            loss_derivative: loss,
        })
    }

    /// Pairs the network with a gradient function other than the loss's own.
    pub fn with_loss_derivative(mut self, derivative: Loss) -> NeuralNet {
        self.loss_derivative = derivative;
        self
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn loss(&self) -> Loss {
        self.loss
    }

    pub fn loss_derivative(&self) -> Loss {
        self.loss_derivative
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    /// Deep copy of every layer, detached from this network.
    pub fn layers_copy(&self) -> Vec<Box<dyn Layer>> {
        self.layers.clone()
    }

    /// Runs a forward pass. Every layer caches its input for the next backward.
    pub fn query(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_size {
            return Err(NnetError::size_mismatch("network input", self.input_size, input.len()));
        }
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    /// Back-propagates `grads` (with respect to the output) through every
    /// layer, updating parameters on the way. Returns the gradient with respect
    /// to the input of the last `query`.
    pub fn back_query(&mut self, grads: &[f64]) -> Result<Vec<f64>> {
        if grads.len() != self.output_size {
            return Err(NnetError::size_mismatch("network gradient", self.output_size, grads.len()));
        }
        let mut current = grads.to_vec();
        for layer in self.layers.iter_mut().rev() {
            current = layer.backward(&current)?;
        }
        Ok(current)
    }

    /// One step of online gradient descent on a single example. Returns the
    /// loss measured before the update; a NaN loss is returned, not rejected.
    pub fn fit(&mut self, input: &[f64], target: &[f64]) -> Result<f64> {
        if input.len() != self.input_size {
            return Err(NnetError::size_mismatch("network input", self.input_size, input.len()));
        }
        if target.len() != self.output_size {
            return Err(NnetError::size_mismatch("training target", self.output_size, target.len()));
        }

        let output = self.query(input)?;
        let loss = self.loss.loss(&output, target)?;
        let grads = self.loss_derivative.gradient(&output, target)?;
        self.back_query(&grads)?;
        Ok(loss)
    }

    /// Writes the header line followed by every tagged layer.
    pub fn save(&self, mut out: impl Write) -> Result<()> {
        writeln!(
            out,
            "{} {} {} {} {}",
            self.layers.len(),
            self.input_size,
            self.output_size,
            self.loss.code(),
            self.loss_derivative.code()
        )?;
        for layer in &self.layers {
            write_layer(layer.as_ref(), &mut out)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Replaces this network with the one stored in `reader`. On failure the
    /// network is left untouched.
    pub fn load(&mut self, reader: impl Read) -> Result<()> {
        *self = NeuralNet::from_reader(reader)?;
        Ok(())
    }

    pub fn from_reader(mut reader: impl Read) -> Result<NeuralNet> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        NeuralNet::decode(&text)
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.save(BufWriter::new(File::create(path)?))?;
        info!(path = %path.display(), layers = self.layers.len(), "network saved");
        Ok(())
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        *self = NeuralNet::from_file(path)?;
        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<NeuralNet> {
        let path = path.as_ref();
        let net = NeuralNet::from_reader(BufReader::new(File::open(path)?))?;
        info!(path = %path.display(), layers = net.layers.len(), "network loaded");
        Ok(net)
    }

    fn decode(text: &str) -> Result<NeuralNet> {
        let mut tokens = TokenReader::new(text);
        let layer_count = tokens.next_usize("layer count")?;
        let input_size = tokens.next_usize("network input size")?;
        let output_size = tokens.next_usize("network output size")?;
        let loss: Loss = tokens.next_code("loss")?;
        let loss_derivative: Loss = tokens.next_code("loss derivative")?;

        let layers = (0..layer_count)
            .map(|_| read_layer(&mut tokens))
            .collect::<Result<Vec<_>>>()?;

        let mut size = input_size;
        for (index, layer) in layers.iter().enumerate() {
            if layer.in_size() != size {
                return Err(NnetError::format(format!(
                    "layer {} ({}) expects {} inputs but receives {}",
                    index,
                    layer.kind(),
                    layer.in_size(),
                    size
                )));
            }
            size = layer.out_size();
        }
        if size != output_size {
            return Err(NnetError::format(format!(
                "header declares {} outputs but the layers produce {}",
                output_size, size
            )));
        }

        Ok(NeuralNet { layers, input_size, output_size, loss, loss_derivative })
    }
}
