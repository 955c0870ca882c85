/// Categorical cross-entropy, meant to follow a Softmax activation layer.
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss:
    ///   L = -sum(expected[i] * ln(predicted[i]))   over expected[i] != 0
    ///
    /// Zero targets are skipped so a one-hot target never evaluates `0 * ln(0)`.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .filter(|(_, &e)| e != 0.0)
            .map(|(p, e)| -e * p.ln())
            .sum()
    }

    /// Gradient with respect to the predicted probabilities:
    ///   ∂L/∂p_i = -expected[i] / predicted[i]   (0 where expected[i] == 0)
    ///
    /// The Softmax layer's Jacobian is applied afterwards by the activation
    /// layer's backward pass.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(p, &e)| if e != 0.0 { -e / p } else { 0.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn one_hot_target_picks_the_labelled_probability() {
        let p = [0.2, 0.5, 0.3];
        let t = [0.0, 1.0, 0.0];
        assert_abs_diff_eq!(CrossEntropyLoss::loss(&p, &t), -(0.5f64).ln(), epsilon = 1e-12);
        assert_eq!(CrossEntropyLoss::derivative(&p, &t), vec![0.0, -2.0, 0.0]);
    }

    #[test]
    fn zero_probability_on_unlabelled_class_is_finite() {
        assert_eq!(CrossEntropyLoss::loss(&[0.0, 1.0], &[0.0, 1.0]), 0.0);
    }
}
