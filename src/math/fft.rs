use std::f64::consts::PI;

use num_complex::Complex64;

use crate::math::matrix::Matrix;

/// Row-major complex matrix used by the 2-D transform.
pub type ComplexMatrix = Vec<Vec<Complex64>>;

/// Transform direction. `Forward` uses `exp(+2πi/m)` twiddles and `Inverse`
/// uses the conjugate ones plus a `1/n` normalization, so the pair is exact
/// inverses of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Inverse,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Inverse => -1.0,
        }
    }
}

/// Smallest power of two that is `>= n` (and at least 1).
pub fn padded_len(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Iterative radix-2 Cooley-Tukey transform of `v`, zero-padded on the right
/// up to the next power of two.
pub fn fft(v: &[Complex64], direction: Direction) -> Vec<Complex64> {
    let n = padded_len(v.len());
    let bits = n.trailing_zeros();

    // Bit-reversal permutation.
    let mut r = vec![Complex64::default(); n];
    for k in 0..n {
        let b = if bits == 0 { 0 } else { k.reverse_bits() >> (usize::BITS - bits) };
        r[b] = v.get(k).copied().unwrap_or_default();
    }

    let mut m = 2;
    while m <= n {
        let wm = Complex64::from_polar(1.0, direction.sign() * 2.0 * PI / m as f64);
        let half = m / 2;
        for k in (0..n).step_by(m) {
            let mut w = Complex64::new(1.0, 0.0);
            for j in 0..half {
                let a = r[k + j];
                let b = w * r[k + j + half];
                r[k + j] = a + b;
                r[k + j + half] = a - b;
                w *= wm;
            }
        }
        m *= 2;
    }

    if direction == Direction::Inverse {
        let len = n as f64;
        for x in &mut r {
            *x /= len;
        }
    }

    r
}

/// 2-D transform: pads both dimensions to powers of two, then transforms every
/// row followed by every column.
pub fn fft2(mat: &ComplexMatrix, direction: Direction) -> ComplexMatrix {
    let rows = padded_len(mat.len());
    let cols = padded_len(mat.first().map_or(0, |row| row.len()));

    // Every row, including the zero rows added below the input, is exactly
    // `cols` long before it is transformed.
    let mut r: ComplexMatrix = (0..rows)
        .map(|i| {
            let mut row = vec![Complex64::default(); cols];
            if let Some(src) = mat.get(i) {
                for (slot, &x) in row.iter_mut().zip(src) {
                    *slot = x;
                }
            }
            fft(&row, direction)
        })
        .collect();

    let mut column = vec![Complex64::default(); rows];
    for j in 0..cols {
        for (i, slot) in column.iter_mut().enumerate() {
            *slot = r[i][j];
        }
        for (i, value) in fft(&column, direction).into_iter().enumerate() {
            r[i][j] = value;
        }
    }

    r
}

/// Full 2-D convolution of `signal` with `kernel`, computed in the frequency
/// domain. The result has shape
/// `(signal.rows + kernel.rows - 1) × (signal.cols + kernel.cols - 1)`.
pub fn convolve2d(signal: &Matrix, kernel: &Matrix) -> Matrix {
    if signal.is_empty() || kernel.is_empty() {
        return Matrix::default();
    }

    let rows = signal.rows + kernel.rows - 1;
    let cols = signal.cols + kernel.cols - 1;

    let sig = fft2(&padded_complex(signal, rows, cols), Direction::Forward);
    let ker = fft2(&padded_complex(kernel, rows, cols), Direction::Forward);

    let product: ComplexMatrix = sig
        .iter()
        .zip(&ker)
        .map(|(a, b)| a.iter().zip(b).map(|(x, y)| x * y).collect())
        .collect();

    let res = fft2(&product, Direction::Inverse);
    Matrix::from_fn(rows, cols, |i, j| res[i][j].re)
}

fn padded_complex(m: &Matrix, rows: usize, cols: usize) -> ComplexMatrix {
    (0..rows)
        .map(|i| {
            (0..cols)
                .map(|j| {
                    if i < m.rows && j < m.cols {
                        Complex64::new(m.data[i][j], 0.0)
                    } else {
                        Complex64::default()
                    }
                })
                .collect()
        })
        .collect()
}
