use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

type ActivationFn = fn(&[f64]) -> Vec<f64>;
type JacobianFn = fn(&[f64]) -> Matrix;

/// Built-in activation functions.
///
/// The discriminant doubles as the index into the dispatch tables below and
/// as the persisted code (see `registry`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Pass-through; an activation layer using it is a pure bias add.
    Identity = 0,
    Sigmoid = 1,
    Tanh = 2,
    #[serde(rename = "relu")]
    ReLU = 3,
    /// Vector-valued; its Jacobian is dense rather than diagonal.
    Softmax = 4,
}

const FUNCTIONS: [ActivationFn; 5] = [identity, sigmoid, tanh, relu, softmax];
const JACOBIANS: [JacobianFn; 5] = [
    identity_jacobian,
    sigmoid_jacobian,
    tanh_jacobian,
    relu_jacobian,
    softmax_jacobian,
];

impl Activation {
    pub const ALL: [Activation; 5] = [
        Activation::Identity,
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::ReLU,
        Activation::Softmax,
    ];

    pub fn apply(self, x: &[f64]) -> Vec<f64> {
        FUNCTIONS[self as usize](x)
    }

    /// Jacobian of the activation evaluated at the pre-activation `x`.
    pub fn jacobian(self, x: &[f64]) -> Matrix {
        JACOBIANS[self as usize](x)
    }
}

fn identity(x: &[f64]) -> Vec<f64> {
    x.to_vec()
}

fn sigmoid_scalar(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn sigmoid(x: &[f64]) -> Vec<f64> {
    x.iter().map(|&v| sigmoid_scalar(v)).collect()
}

fn tanh(x: &[f64]) -> Vec<f64> {
    x.iter().map(|v| v.tanh()).collect()
}

fn relu(x: &[f64]) -> Vec<f64> {
    x.iter().map(|&v| if v > 0.0 { v } else { 0.0 }).collect()
}

fn softmax(x: &[f64]) -> Vec<f64> {
    // Shifting by the max leaves the result unchanged and keeps exp() finite.
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = x.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn diagonal(values: impl Iterator<Item = f64>, n: usize) -> Matrix {
    let mut res = Matrix::zeros(n, n);
    for (i, v) in values.enumerate() {
        res.data[i][i] = v;
    }
    res
}

fn identity_jacobian(x: &[f64]) -> Matrix {
    diagonal(std::iter::repeat(1.0).take(x.len()), x.len())
}

fn sigmoid_jacobian(x: &[f64]) -> Matrix {
    diagonal(sigmoid(x).into_iter().map(|s| s * (1.0 - s)), x.len())
}

fn tanh_jacobian(x: &[f64]) -> Matrix {
    diagonal(tanh(x).into_iter().map(|t| 1.0 - t * t), x.len())
}

fn relu_jacobian(x: &[f64]) -> Matrix {
    diagonal(x.iter().map(|&v| if v > 0.0 { 1.0 } else { 0.0 }), x.len())
}

fn softmax_jacobian(x: &[f64]) -> Matrix {
    let s = softmax(x);
    Matrix::from_fn(s.len(), s.len(), |i, j| {
        if i == j { s[i] * (1.0 - s[i]) } else { -s[i] * s[j] }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_jacobian_is_identity_matrix() {
        let j = Activation::Identity.jacobian(&[0.3, -2.0, 5.0]);
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(j.data[r][c], if r == c { 1.0 } else { 0.0 });
            }
        }
        assert_eq!(Activation::Identity.apply(&[0.3, -2.0]), vec![0.3, -2.0]);
    }

    #[test]
    fn softmax_sums_to_one() {
        let s = Activation::Softmax.apply(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(s.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(s[2] > s[1] && s[1] > s[0]);

        let huge = Activation::Softmax.apply(&[1000.0, 1000.0]);
        assert_abs_diff_eq!(huge[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn softmax_jacobian_is_symmetric_with_zero_row_sums() {
        let j = Activation::Softmax.jacobian(&[0.1, -0.4, 0.7]);
        for r in 0..3 {
            assert_abs_diff_eq!(j.data[r].iter().sum::<f64>(), 0.0, epsilon = 1e-12);
            for c in 0..3 {
                assert_abs_diff_eq!(j.data[r][c], j.data[c][r], epsilon = 1e-15);
            }
        }
    }

    #[test]
    fn diagonal_jacobians_match_finite_differences() {
        let h = 1e-6;
        for act in [Activation::Sigmoid, Activation::Tanh, Activation::ReLU] {
            for &x in &[-1.3, 0.4, 2.2] {
                let numeric = (act.apply(&[x + h])[0] - act.apply(&[x - h])[0]) / (2.0 * h);
                let analytic = act.jacobian(&[x]).data[0][0];
                assert_abs_diff_eq!(numeric, analytic, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn relu_clamps_negatives() {
        assert_eq!(Activation::ReLU.apply(&[-1.0, 0.0, 2.5]), vec![0.0, 0.0, 2.5]);
    }
}
