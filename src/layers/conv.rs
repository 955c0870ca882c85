use std::io::{self, Write};

use serde::{Serialize, Deserialize};

use crate::error::{NnetError, Result};
use crate::io::{write_matrix, TokenReader};
use crate::layers::{check_len, checked_volume, no_forward, Generator, Layer, LayerKind};
use crate::math::fft::convolve2d;
use crate::math::matrix::Matrix;
use crate::math::tensor::{three_d_to_vec, vec_to_3d};

/// How a convolution result is cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Only positions where the kernel fully overlaps the input.
    Valid = 0,
    /// Output keeps the input's height and width.
    Same = 1,
}

impl Padding {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Result<Padding> {
        match code {
            0 => Ok(Padding::Valid),
            1 => Ok(Padding::Same),
            other => Err(NnetError::format(format!("unknown padding code {}", other))),
        }
    }
}

/// 2-D convolution layer computed through the FFT.
///
/// The flat input is read as `in_depth` planes of `in_height × in_width`. Each
/// plane is convolved with every kernel, so the output holds
/// `in_depth * kernel_count` planes ordered `(plane 0, kernel 0), (plane 0,
/// kernel 1), ...`.
#[derive(Debug, Clone)]
pub struct ConvLayer {
    learning_rate: f64,
    in_depth: usize,
    in_height: usize,
    in_width: usize,
    kernel_height: usize,
    kernel_width: usize,
    padding: Padding,
    kernels: Vec<Matrix>,
    out_height: usize,
    out_width: usize,
    cache: Option<Vec<Matrix>>,
}

impl ConvLayer {
    pub fn new(
        learning_rate: f64,
        in_height: usize,
        in_width: usize,
        kernel_count: usize,
        kernel_height: usize,
        kernel_width: usize,
        padding: Padding,
    ) -> ConvLayer {
        ConvLayer {
            learning_rate,
            in_depth: 0,
            in_height,
            in_width,
            kernel_height,
            kernel_width,
            padding,
            kernels: vec![Matrix::zeros(kernel_height, kernel_width); kernel_count],
            out_height: 0,
            out_width: 0,
            cache: None,
        }
    }

    pub fn kernels(&self) -> &[Matrix] {
        &self.kernels
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn in_depth(&self) -> usize {
        self.in_depth
    }

    fn out_depth(&self) -> usize {
        self.in_depth * self.kernels.len()
    }

    /// Validates the kernel against the input plane and derives output sizes.
    fn calc_out_sizes(&mut self) -> Result<()> {
        if self.kernel_height == 0 || self.kernel_height > self.in_height {
            return Err(NnetError::size_mismatch(
                "convolution kernel height (1..=input height)",
                self.in_height,
                self.kernel_height,
            ));
        }
        if self.kernel_width == 0 || self.kernel_width > self.in_width {
            return Err(NnetError::size_mismatch(
                "convolution kernel width (1..=input width)",
                self.in_width,
                self.kernel_width,
            ));
        }

        (self.out_height, self.out_width) = match self.padding {
            Padding::Same => (self.in_height, self.in_width),
            Padding::Valid => (
                self.in_height - self.kernel_height + 1,
                self.in_width - self.kernel_width + 1,
            ),
        };
        Ok(())
    }

    /// Payload:
    /// `inDepth inHeight inWidth`, `kernelCount kernelHeight kernelWidth`,
    /// `paddingCode learningRate`, then every kernel row by row.
    ///
    /// The learning-rate token is part of this layout. Streams written without
    /// it (kernel dimensions as `count width height`, no rate) are a different
    /// format and cannot be read by this function.
    pub fn read(tokens: &mut TokenReader<'_>) -> Result<ConvLayer> {
        let in_depth = tokens.next_usize("convolution input depth")?;
        let in_height = tokens.next_usize("convolution input height")?;
        let in_width = tokens.next_usize("convolution input width")?;
        let kernel_count = tokens.next_usize("convolution kernel count")?;
        let kernel_height = tokens.next_usize("convolution kernel height")?;
        let kernel_width = tokens.next_usize("convolution kernel width")?;
        let padding = Padding::from_code(tokens.next_u32("convolution padding")?)?;
        let learning_rate = tokens.next_f64("convolution learning rate")?;

        // Output volume bounds the input volume, so one check covers both sizes.
        checked_volume("convolution", &[in_depth, kernel_count, in_height, in_width])?;

        let mut layer = ConvLayer {
            learning_rate,
            in_depth,
            in_height,
            in_width,
            kernel_height,
            kernel_width,
            padding,
            kernels: Vec::new(),
            out_height: 0,
            out_width: 0,
            cache: None,
        };
        layer
            .calc_out_sizes()
            .map_err(|e| NnetError::format(format!("inconsistent convolution geometry: {}", e)))?;

        for _ in 0..kernel_count {
            let kernel = tokens.next_matrix(kernel_height, kernel_width, "convolution kernel")?;
            layer.kernels.push(kernel);
        }

        Ok(layer)
    }

    fn crop_output(&self, full: &Matrix) -> Matrix {
        match self.padding {
            Padding::Same => full.block(
                (self.kernel_height - 1) / 2,
                (self.kernel_width - 1) / 2,
                self.out_height,
                self.out_width,
            ),
            Padding::Valid => full.block(
                self.kernel_height - 1,
                self.kernel_width - 1,
                self.out_height,
                self.out_width,
            ),
        }
    }

    fn crop_input_grad(&self, full: Matrix) -> Matrix {
        match self.padding {
            // Adjoint of the forward crop: offset k - 1 - (k - 1) / 2 == k / 2.
            Padding::Same => full.block(
                self.kernel_height / 2,
                self.kernel_width / 2,
                self.in_height,
                self.in_width,
            ),
            Padding::Valid => full,
        }
    }
}

impl Layer for ConvLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Convolutional
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_input_size(&mut self, input_size: usize) -> Result<()> {
        let plane = self.in_height * self.in_width;
        if plane == 0 || input_size % plane != 0 {
            return Err(NnetError::size_mismatch(
                format!(
                    "convolution input (must be a multiple of {}x{})",
                    self.in_height, self.in_width
                ),
                plane * (input_size / plane.max(1)).max(1),
                input_size,
            ));
        }
        self.in_depth = input_size / plane;
        self.cache = None;
        self.calc_out_sizes()
    }

    fn init_params(&mut self, generator: &mut Generator<'_>) {
        let (h, w) = (self.kernel_height, self.kernel_width);
        for kernel in &mut self.kernels {
            *kernel = Matrix::from_fn(h, w, |_, _| generator());
        }
    }

    fn in_size(&self) -> usize {
        self.in_depth * self.in_height * self.in_width
    }

    fn out_size(&self) -> usize {
        self.out_depth() * self.out_height * self.out_width
    }

    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        check_len("convolution input", self.in_size(), input.len())?;
        let planes = vec_to_3d(input, self.in_depth, self.in_height, self.in_width)?;

        let mut out = Vec::with_capacity(self.out_depth());
        for plane in &planes {
            for kernel in &self.kernels {
                out.push(self.crop_output(&convolve2d(plane, kernel)));
            }
        }

        self.cache = Some(planes);
        Ok(three_d_to_vec(&out))
    }

    fn backward(&mut self, grads: &[f64]) -> Result<Vec<f64>> {
        check_len("convolution gradient", self.out_size(), grads.len())?;
        let cache = self.cache.as_ref().ok_or_else(|| no_forward(LayerKind::Convolutional))?;
        let g = vec_to_3d(grads, self.out_depth(), self.out_height, self.out_width)?;
        let count = self.kernels.len();

        // Input gradient, computed with the pre-update kernels.
        let mut ret = Vec::with_capacity(self.in_depth);
        for i in 0..self.in_depth {
            let mut acc = Matrix::zeros(self.in_height, self.in_width);
            for (j, kernel) in self.kernels.iter().enumerate() {
                let full = convolve2d(&g[i * count + j], &kernel.reversed());
                acc = acc + self.crop_input_grad(full);
            }
            ret.push(acc);
        }

        // Kernel update: centered kernel-sized crop of (output grad ⊛ input plane).
        let mut steps = Vec::with_capacity(count);
        for j in 0..count {
            let mut step = Matrix::zeros(self.kernel_height, self.kernel_width);
            for (i, plane) in cache.iter().enumerate() {
                let full = convolve2d(&g[i * count + j], plane);
                let row = full.rows / 2 - self.kernel_height / 2;
                let col = full.cols / 2 - self.kernel_width / 2;
                step = step + full.block(row, col, self.kernel_height, self.kernel_width);
            }
            steps.push(step);
        }
        let lr = self.learning_rate;
        for (kernel, step) in self.kernels.iter_mut().zip(steps) {
            *kernel = std::mem::take(kernel) - step.map(|x| x * lr);
        }

        Ok(three_d_to_vec(&ret))
    }

    fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} {} {}", self.in_depth, self.in_height, self.in_width)?;
        writeln!(out, "{} {} {}", self.kernels.len(), self.kernel_height, self.kernel_width)?;
        writeln!(out, "{} {}", self.padding.code(), self.learning_rate)?;
        for kernel in &self.kernels {
            write_matrix(out, kernel)?;
        }
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(ConvLayer { cache: None, ..self.clone() })
    }
}
