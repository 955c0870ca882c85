pub mod activation;
pub mod conv;
pub mod dense;
pub mod pool;

pub use activation::ActivationLayer;
pub use conv::{ConvLayer, Padding};
pub use dense::DenseLayer;
pub use pool::PoolLayer;

use std::fmt;
use std::io::{self, Write};

use crate::error::{NnetError, Result};
use crate::io::TokenReader;

/// Scalar source used to fill learnable tensors.
pub type Generator<'a> = dyn FnMut() -> f64 + 'a;

/// One stage of a feed-forward network.
///
/// Calls must follow the order `set_input_size` → `init_params` → any number of
/// `forward`/`backward` pairs. Each layer caches exactly one forward pass, so a
/// `backward` always refers to the most recent `forward`.
pub trait Layer: fmt::Debug {
    fn kind(&self) -> LayerKind;

    fn learning_rate(&self) -> f64;

    /// Records the input size and derives any geometry that depends on it.
    fn set_input_size(&mut self, input_size: usize) -> Result<()>;

    fn init_params(&mut self, generator: &mut Generator<'_>);

    fn in_size(&self) -> usize;

    fn out_size(&self) -> usize;

    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>>;

    /// Returns the gradient with respect to the layer input and applies one
    /// gradient-descent step to the layer's own parameters.
    fn backward(&mut self, grads: &[f64]) -> Result<Vec<f64>>;

    /// Writes the layer payload (everything after the type tag).
    fn write(&self, out: &mut dyn Write) -> io::Result<()>;

    /// Independent deep copy; the forward cache is not carried over.
    fn clone_box(&self) -> Box<dyn Layer>;
}

impl Clone for Box<dyn Layer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Type tag written in front of every layer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Dense,
    Activation,
    Convolutional,
    Pooling,
}

impl LayerKind {
    pub fn tag(self) -> &'static str {
        match self {
            LayerKind::Dense => "Dense",
            LayerKind::Activation => "Act",
            LayerKind::Convolutional => "Conv",
            LayerKind::Pooling => "Pool",
        }
    }

    pub fn from_tag(tag: &str) -> Result<LayerKind> {
        match tag {
            "Dense" => Ok(LayerKind::Dense),
            "Act" => Ok(LayerKind::Activation),
            "Conv" => Ok(LayerKind::Convolutional),
            "Pool" => Ok(LayerKind::Pooling),
            other => Err(NnetError::format(format!("unknown layer tag {:?}", other))),
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.tag())
    }
}

/// Writes the type tag followed by the layer payload.
pub fn write_layer(layer: &dyn Layer, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", layer.kind().tag())?;
    layer.write(out)
}

/// Reads one tagged layer.
pub fn read_layer(tokens: &mut TokenReader<'_>) -> Result<Box<dyn Layer>> {
    let kind = LayerKind::from_tag(tokens.next_token("layer tag")?)?;
    let layer: Box<dyn Layer> = match kind {
        LayerKind::Dense => Box::new(DenseLayer::read(tokens)?),
        LayerKind::Activation => Box::new(ActivationLayer::read(tokens)?),
        LayerKind::Convolutional => Box::new(ConvLayer::read(tokens)?),
        LayerKind::Pooling => Box::new(PoolLayer::read(tokens)?),
    };
    Ok(layer)
}

pub(crate) fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(NnetError::size_mismatch(what, expected, actual));
    }
    Ok(())
}

/// Product of decoded dimensions; overflow means the stream is corrupt.
pub(crate) fn checked_volume(what: &str, dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| NnetError::format(format!("{} dimensions {:?} overflow", what, dims)))
}

pub(crate) fn no_forward(layer: LayerKind) -> NnetError {
    NnetError::Sequencing(format!("{} layer: backward called before forward", layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for kind in [
            LayerKind::Dense,
            LayerKind::Activation,
            LayerKind::Convolutional,
            LayerKind::Pooling,
        ] {
            assert_eq!(LayerKind::from_tag(kind.tag()).unwrap(), kind);
        }
        assert!(matches!(LayerKind::from_tag("Dropout"), Err(NnetError::Format(_))));
    }
}
