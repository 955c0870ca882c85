use std::io::{self, Write};

use crate::activation::Activation;
use crate::error::Result;
use crate::io::{write_vec, TokenReader};
use crate::layers::{check_len, no_forward, Generator, Layer, LayerKind};
use crate::registry::FunctionCode;

/// Elementwise nonlinearity with a trainable bias: `y = f(x + b)`.
///
/// `function` and `derivative` are usually the same built-in; they may differ,
/// e.g. a Softmax output trained through the identity Jacobian.
#[derive(Debug, Clone)]
pub struct ActivationLayer {
    learning_rate: f64,
    size: usize,
    function: Activation,
    derivative: Activation,
    bias: Vec<f64>,
    cache: Option<Vec<f64>>,
}

impl ActivationLayer {
    pub fn new(learning_rate: f64, function: Activation) -> ActivationLayer {
        ActivationLayer {
            learning_rate,
            size: 0,
            function,
            derivative: function,
            bias: Vec::new(),
            cache: None,
        }
    }

    pub fn with_derivative(mut self, derivative: Activation) -> ActivationLayer {
        self.derivative = derivative;
        self
    }

    pub fn function(&self) -> Activation {
        self.function
    }

    pub fn derivative(&self) -> Activation {
        self.derivative
    }

    pub fn bias(&self) -> &[f64] {
        &self.bias
    }

    /// Payload: `inSize learningRate activationCode derivativeCode`, then the bias.
    pub fn read(tokens: &mut TokenReader<'_>) -> Result<ActivationLayer> {
        let size = tokens.next_usize("activation size")?;
        let learning_rate = tokens.next_f64("activation learning rate")?;
        let function = tokens.next_code("activation function")?;
        let derivative = tokens.next_code("activation derivative")?;
        let bias = tokens.next_vec(size, "activation bias")?;

        Ok(ActivationLayer { learning_rate, size, function, derivative, bias, cache: None })
    }

    fn biased(&self, x: &[f64]) -> Vec<f64> {
        x.iter().zip(&self.bias).map(|(a, b)| a + b).collect()
    }
}

impl Layer for ActivationLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Activation
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_input_size(&mut self, input_size: usize) -> Result<()> {
        self.size = input_size;
        self.bias = vec![0.0; input_size];
        self.cache = None;
        Ok(())
    }

    /// Bias always starts at zero; the generator is not consulted.
    fn init_params(&mut self, _generator: &mut Generator<'_>) {
        self.bias = vec![0.0; self.size];
    }

    fn in_size(&self) -> usize {
        self.size
    }

    fn out_size(&self) -> usize {
        self.size
    }

    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        check_len("activation layer input", self.size, input.len())?;
        let out = self.function.apply(&self.biased(input));
        self.cache = Some(input.to_vec());
        Ok(out)
    }

    fn backward(&mut self, grads: &[f64]) -> Result<Vec<f64>> {
        check_len("activation layer gradient", self.size, grads.len())?;
        let input = self.cache.as_ref().ok_or_else(|| no_forward(LayerKind::Activation))?;

        let jacobian = self.derivative.jacobian(&self.biased(input));
        let ret = jacobian.mul_vec(grads);

        for (b, g) in self.bias.iter_mut().zip(&ret) {
            *b -= self.learning_rate * g;
        }

        Ok(ret)
    }

    fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            "{} {} {} {}",
            self.size,
            self.learning_rate,
            self.function.code(),
            self.derivative.code()
        )?;
        write_vec(out, &self.bias)
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(ActivationLayer { cache: None, ..self.clone() })
    }
}
