use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

type ReduceFn = fn(&Matrix) -> f64;
type DistributeFn = fn(&Matrix, f64) -> Matrix;

/// Built-in pooling reducers.
///
/// Discriminants are the persisted codes; code 0 is reserved and never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolFunction {
    Max = 1,
    Average = 2,
}

const REDUCERS: [ReduceFn; 2] = [max_pool, average_pool];
const DISTRIBUTORS: [DistributeFn; 2] = [max_pool_gradient, average_pool_gradient];

impl PoolFunction {
    pub const ALL: [PoolFunction; 2] = [PoolFunction::Max, PoolFunction::Average];

    fn slot(self) -> usize {
        self as usize - 1
    }

    /// Collapses one window to a scalar.
    pub fn reduce(self, window: &Matrix) -> f64 {
        REDUCERS[self.slot()](window)
    }

    /// Spreads the upstream gradient `grad` of one pooled value back over the
    /// window it was computed from.
    pub fn distribute(self, window: &Matrix, grad: f64) -> Matrix {
        DISTRIBUTORS[self.slot()](window, grad)
    }
}

fn max_pool(window: &Matrix) -> f64 {
    window.iter().fold(f64::NEG_INFINITY, f64::max)
}

/// Routes the whole gradient to the first maximal cell in row-major order.
fn max_pool_gradient(window: &Matrix, grad: f64) -> Matrix {
    let mut res = Matrix::zeros(window.rows, window.cols);
    let mut best: Option<(usize, f64)> = None;
    for (k, v) in window.iter().enumerate() {
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((k, v));
        }
    }
    if let Some((k, _)) = best {
        res.data[k / window.cols][k % window.cols] = grad;
    }
    res
}

fn average_pool(window: &Matrix) -> f64 {
    window.sum() / window.len() as f64
}

/// Every cell receives the raw upstream gradient, not `grad / len`, so this is
/// `len` times the exact derivative of `average_pool`.
fn average_pool_gradient(window: &Matrix, grad: f64) -> Matrix {
    Matrix::from_fn(window.rows, window.cols, |_, _| grad)
}
