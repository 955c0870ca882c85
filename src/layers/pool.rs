use std::io::{self, Write};

use crate::error::{NnetError, Result};
use crate::io::TokenReader;
use crate::layers::{check_len, checked_volume, no_forward, Generator, Layer, LayerKind};
use crate::math::matrix::Matrix;
use crate::math::tensor::{three_d_to_vec, vec_to_3d};
use crate::pool::PoolFunction;
use crate::registry::FunctionCode;

/// Non-overlapping pooling over every plane of the input.
///
/// Windows tile each `in_height × in_width` plane with a stride equal to the
/// window size; windows on the right/bottom border are clipped when the plane
/// does not divide evenly.
#[derive(Debug, Clone)]
pub struct PoolLayer {
    depth: usize,
    in_height: usize,
    in_width: usize,
    window_height: usize,
    window_width: usize,
    function: PoolFunction,
    derivative: PoolFunction,
    cache: Option<Vec<Matrix>>,
}

impl PoolLayer {
    pub fn new(
        in_height: usize,
        in_width: usize,
        window_height: usize,
        window_width: usize,
        function: PoolFunction,
    ) -> PoolLayer {
        PoolLayer {
            depth: 0,
            in_height,
            in_width,
            window_height,
            window_width,
            function,
            derivative: function,
            cache: None,
        }
    }

    pub fn with_derivative(mut self, derivative: PoolFunction) -> PoolLayer {
        self.derivative = derivative;
        self
    }

    pub fn function(&self) -> PoolFunction {
        self.function
    }

    fn out_height(&self) -> usize {
        self.in_height.div_ceil(self.window_height)
    }

    fn out_width(&self) -> usize {
        self.in_width.div_ceil(self.window_width)
    }

    fn check_window(&self) -> Result<()> {
        if self.window_height == 0 || self.window_width == 0 {
            return Err(NnetError::size_mismatch(
                "pooling window area",
                1,
                self.window_height * self.window_width,
            ));
        }
        Ok(())
    }

    /// Top-left corners and clipped sizes of every window of one plane, in
    /// output order.
    fn windows(&self) -> impl Iterator<Item = (usize, usize, usize, usize)> + '_ {
        (0..self.in_height).step_by(self.window_height).flat_map(move |i| {
            (0..self.in_width).step_by(self.window_width).map(move |j| {
                let h = self.window_height.min(self.in_height - i);
                let w = self.window_width.min(self.in_width - j);
                (i, j, h, w)
            })
        })
    }

    /// Payload: `depth inHeight inWidth`, `windowHeight windowWidth`,
    /// `poolCode poolDerivativeCode`.
    pub fn read(tokens: &mut TokenReader<'_>) -> Result<PoolLayer> {
        let depth = tokens.next_usize("pool depth")?;
        let in_height = tokens.next_usize("pool input height")?;
        let in_width = tokens.next_usize("pool input width")?;
        let window_height = tokens.next_usize("pool window height")?;
        let window_width = tokens.next_usize("pool window width")?;
        let function = tokens.next_code("pool function")?;
        let derivative = tokens.next_code("pool derivative")?;
        checked_volume("pooling", &[depth, in_height, in_width])?;

        let layer = PoolLayer {
            depth,
            in_height,
            in_width,
            window_height,
            window_width,
            function,
            derivative,
            cache: None,
        };
        layer
            .check_window()
            .map_err(|e| NnetError::format(format!("inconsistent pooling geometry: {}", e)))?;
        Ok(layer)
    }
}

impl Layer for PoolLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Pooling
    }

    /// Pooling has nothing to learn.
    fn learning_rate(&self) -> f64 {
        0.0
    }

    fn set_input_size(&mut self, input_size: usize) -> Result<()> {
        self.check_window()?;
        let plane = self.in_height * self.in_width;
        if plane == 0 || input_size % plane != 0 {
            return Err(NnetError::size_mismatch(
                format!(
                    "pooling input (must be a multiple of {}x{})",
                    self.in_height, self.in_width
                ),
                plane * (input_size / plane.max(1)).max(1),
                input_size,
            ));
        }
        self.depth = input_size / plane;
        self.cache = None;
        Ok(())
    }

    fn init_params(&mut self, _generator: &mut Generator<'_>) {}

    fn in_size(&self) -> usize {
        self.depth * self.in_height * self.in_width
    }

    fn out_size(&self) -> usize {
        self.depth * self.out_height() * self.out_width()
    }

    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        check_len("pooling input", self.in_size(), input.len())?;
        let planes = vec_to_3d(input, self.depth, self.in_height, self.in_width)?;

        let out: Vec<Matrix> = planes
            .iter()
            .map(|plane| {
                let mut pooled = Matrix::zeros(self.out_height(), self.out_width());
                for (i, j, h, w) in self.windows() {
                    pooled.data[i / self.window_height][j / self.window_width] =
                        self.function.reduce(&plane.block(i, j, h, w));
                }
                pooled
            })
            .collect();

        self.cache = Some(planes);
        Ok(three_d_to_vec(&out))
    }

    fn backward(&mut self, grads: &[f64]) -> Result<Vec<f64>> {
        check_len("pooling gradient", self.out_size(), grads.len())?;
        let cache = self.cache.as_ref().ok_or_else(|| no_forward(LayerKind::Pooling))?;
        let g = vec_to_3d(grads, self.depth, self.out_height(), self.out_width())?;

        let ret: Vec<Matrix> = cache
            .iter()
            .zip(&g)
            .map(|(plane, plane_grad)| {
                let mut spread = Matrix::zeros(self.in_height, self.in_width);
                for (i, j, h, w) in self.windows() {
                    let upstream = plane_grad.data[i / self.window_height][j / self.window_width];
                    let window = self.derivative.distribute(&plane.block(i, j, h, w), upstream);
                    spread.set_block(i, j, &window);
                }
                spread
            })
            .collect();

        Ok(three_d_to_vec(&ret))
    }

    fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} {} {}", self.depth, self.in_height, self.in_width)?;
        writeln!(out, "{} {}", self.window_height, self.window_width)?;
        writeln!(out, "{} {}", self.function.code(), self.derivative.code())
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(PoolLayer { cache: None, ..self.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(in_h: usize, in_w: usize, win: (usize, usize), f: PoolFunction, depth: usize) -> PoolLayer {
        let mut layer = PoolLayer::new(in_h, in_w, win.0, win.1, f);
        layer.set_input_size(depth * in_h * in_w).unwrap();
        layer
    }

    #[test]
    fn max_pool_backward_routes_to_argmax() {
        let mut layer = sized(2, 2, (2, 2), PoolFunction::Max, 1);
        assert_eq!(layer.forward(&[1.0, 9.0, 3.0, 2.0]).unwrap(), vec![9.0]);
        assert_eq!(layer.backward(&[0.5]).unwrap(), vec![0.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn border_windows_are_clipped() {
        let mut layer = sized(3, 3, (2, 2), PoolFunction::Max, 1);
        assert_eq!(layer.out_size(), 4);
        let input = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert_eq!(layer.forward(&input).unwrap(), vec![5.0, 6.0, 8.0, 9.0]);

        let back = layer.backward(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(back, vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 3.0, 4.0]);
    }

    #[test]
    fn average_pool_spreads_raw_gradient_per_plane() {
        let mut layer = sized(2, 2, (1, 2), PoolFunction::Average, 2);
        let out = layer.forward(&[1.0, 3.0, 5.0, 7.0, 0.0, 2.0, -2.0, 2.0]).unwrap();
        assert_eq!(out, vec![2.0, 6.0, 1.0, 0.0]);
        let back = layer.backward(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(back, vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn checks_sizes_and_sequence() {
        let mut layer = sized(2, 2, (2, 2), PoolFunction::Max, 1);
        assert!(matches!(layer.backward(&[1.0]), Err(NnetError::Sequencing(_))));
        assert!(matches!(layer.forward(&[1.0; 5]), Err(NnetError::SizeMismatch { .. })));

        let mut bad = PoolLayer::new(3, 3, 2, 2, PoolFunction::Max);
        assert!(matches!(bad.set_input_size(10), Err(NnetError::SizeMismatch { .. })));
        let mut empty_window = PoolLayer::new(3, 3, 0, 2, PoolFunction::Max);
        assert!(matches!(empty_window.set_input_size(9), Err(NnetError::SizeMismatch { .. })));
    }

    #[test]
    fn read_rejects_overflowing_geometry() {
        let err = PoolLayer::read(&mut TokenReader::new("4294967296 4294967296 1 1 1 1 1")).unwrap_err();
        assert!(matches!(err, NnetError::Format(_)));
    }

    #[test]
    fn read_rejects_reserved_code() {
        let err = PoolLayer::read(&mut TokenReader::new("1 2 2 2 2 0 1")).unwrap_err();
        assert!(matches!(err, NnetError::Format(_)));
    }
}
