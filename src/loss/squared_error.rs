pub struct SquaredErrorLoss;

impl SquaredErrorLoss {
    /// Scalar loss: sum((predicted - expected)²)
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum()
    }

    /// Per-output gradient: predicted - expected
    ///
    /// The factor 2 of the exact derivative is folded into the learning rates.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| a - b)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_squared_differences() {
        assert_eq!(SquaredErrorLoss::loss(&[1.0, 2.0], &[0.0, 4.0]), 5.0);
        assert_eq!(SquaredErrorLoss::derivative(&[1.0, 2.0], &[0.0, 4.0]), vec![1.0, -2.0]);
    }
}
