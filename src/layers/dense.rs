use std::io::{self, Write};

use tracing::trace;

use crate::error::Result;
use crate::io::{write_matrix, TokenReader};
use crate::layers::{check_len, no_forward, Generator, Layer, LayerKind};
use crate::math::matrix::Matrix;

/// Fully connected layer without bias: `y = W·x`.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    learning_rate: f64,
    in_size: usize,
    out_size: usize,
    weights: Matrix,  // out_size × in_size
    cache: Option<Vec<f64>>,  // last input, needed for the weight gradient
}

impl DenseLayer {
    pub fn new(learning_rate: f64, out_size: usize) -> DenseLayer {
        DenseLayer {
            learning_rate,
            in_size: 0,
            out_size,
            weights: Matrix::zeros(out_size, 0),
            cache: None,
        }
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// Payload: `inSize outSize learningRate`, then the weights row by row.
    pub fn read(tokens: &mut TokenReader<'_>) -> Result<DenseLayer> {
        let in_size = tokens.next_usize("dense input size")?;
        let out_size = tokens.next_usize("dense output size")?;
        let learning_rate = tokens.next_f64("dense learning rate")?;
        let weights = tokens.next_matrix(out_size, in_size, "dense weight")?;

        Ok(DenseLayer { learning_rate, in_size, out_size, weights, cache: None })
    }
}

impl Layer for DenseLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Dense
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_input_size(&mut self, input_size: usize) -> Result<()> {
        self.in_size = input_size;
        self.weights = Matrix::zeros(self.out_size, input_size);
        self.cache = None;
        Ok(())
    }

    fn init_params(&mut self, generator: &mut Generator<'_>) {
        self.weights = Matrix::from_fn(self.out_size, self.in_size, |_, _| generator());
    }

    fn in_size(&self) -> usize {
        self.in_size
    }

    fn out_size(&self) -> usize {
        self.out_size
    }

    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        check_len("dense layer input", self.in_size, input.len())?;
        let out = self.weights.mul_vec(input);
        self.cache = Some(input.to_vec());
        Ok(out)
    }

    fn backward(&mut self, grads: &[f64]) -> Result<Vec<f64>> {
        check_len("dense layer gradient", self.out_size, grads.len())?;
        let input = self.cache.as_ref().ok_or_else(|| no_forward(LayerKind::Dense))?;

        // Propagate through the pre-update weights.
        let ret = self.weights.transpose_mul_vec(grads);

        // Column i of W moves by lr * x_i * g.
        for (i, &x) in input.iter().enumerate() {
            for (row, &g) in self.weights.data.iter_mut().zip(grads) {
                row[i] -= self.learning_rate * x * g;
            }
        }
        trace!(in_size = self.in_size, out_size = self.out_size, "dense layer updated");

        Ok(ret)
    }

    fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} {} {}", self.in_size, self.out_size, self.learning_rate)?;
        write_matrix(out, &self.weights)
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(DenseLayer { cache: None, ..self.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NnetError;

    fn layer_with(weights: Vec<Vec<f64>>, learning_rate: f64) -> DenseLayer {
        let mut layer = DenseLayer::new(learning_rate, weights.len());
        layer.set_input_size(weights[0].len()).unwrap();
        let flat: Vec<f64> = weights.into_iter().flatten().collect();
        let mut it = flat.into_iter();
        layer.init_params(&mut || it.next().unwrap());
        layer
    }

    #[test]
    fn forward_is_matrix_vector_product() {
        let mut layer = layer_with(vec![vec![1.0, 2.0, 3.0], vec![0.0, -1.0, 0.5]], 0.1);
        assert_eq!(layer.forward(&[1.0, 1.0, 2.0]).unwrap(), vec![9.0, 0.0]);
    }

    #[test]
    fn backward_returns_transposed_product_and_updates_columns() {
        let mut layer = layer_with(vec![vec![1.0, 2.0], vec![3.0, 4.0]], 0.5);
        layer.forward(&[1.0, 2.0]).unwrap();
        let grad_in = layer.backward(&[1.0, -1.0]).unwrap();
        assert_eq!(grad_in, vec![-2.0, -2.0]);
        // W[r][i] -= 0.5 * x[i] * g[r]
        assert_eq!(layer.weights().data, vec![vec![0.5, 1.0], vec![3.5, 5.0]]);
    }

    #[test]
    fn wrong_sizes_are_rejected_before_mutation() {
        let mut layer = layer_with(vec![vec![1.0, 2.0]], 0.5);
        assert!(matches!(layer.forward(&[1.0]), Err(NnetError::SizeMismatch { .. })));
        layer.forward(&[1.0, 1.0]).unwrap();
        assert!(matches!(layer.backward(&[1.0, 2.0]), Err(NnetError::SizeMismatch { .. })));
        assert_eq!(layer.weights().data, vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn backward_before_forward_is_a_sequencing_error() {
        let mut layer = layer_with(vec![vec![1.0]], 0.5);
        assert!(matches!(layer.backward(&[1.0]), Err(NnetError::Sequencing(_))));
    }

    #[test]
    fn write_then_read_preserves_parameters() {
        let layer = layer_with(vec![vec![0.1, -0.2, 0.3], vec![1e-9, 2.0, -3.5]], 0.01);
        let mut buf = Vec::new();
        layer.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let back = DenseLayer::read(&mut TokenReader::new(&text)).unwrap();
        assert_eq!(back.weights(), layer.weights());
        assert_eq!((back.in_size(), back.out_size()), (3, 2));
        assert_eq!(back.learning_rate(), 0.01);
    }
}
