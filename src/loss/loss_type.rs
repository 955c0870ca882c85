use serde::{Serialize, Deserialize};

use crate::error::{NnetError, Result};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::squared_error::SquaredErrorLoss;

type LossFn = fn(&[f64], &[f64]) -> f64;
type GradientFn = fn(&[f64], &[f64]) -> Vec<f64>;

/// Built-in loss functions a network can be trained against.
///
/// - `SquaredError` — sum of squared differences; pair with Tanh/Sigmoid/Identity output.
/// - `CrossEntropy` — categorical cross-entropy; pair with Softmax output.
///
/// Discriminants are the persisted codes; code 0 is reserved and never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    SquaredError = 1,
    CrossEntropy = 2,
}

const LOSSES: [LossFn; 2] = [SquaredErrorLoss::loss, CrossEntropyLoss::loss];
const GRADIENTS: [GradientFn; 2] = [SquaredErrorLoss::derivative, CrossEntropyLoss::derivative];

impl Loss {
    pub const ALL: [Loss; 2] = [Loss::SquaredError, Loss::CrossEntropy];

    fn slot(self) -> usize {
        self as usize - 1
    }

    pub fn loss(self, predicted: &[f64], expected: &[f64]) -> Result<f64> {
        check_sizes(predicted, expected)?;
        Ok(LOSSES[self.slot()](predicted, expected))
    }

    pub fn gradient(self, predicted: &[f64], expected: &[f64]) -> Result<Vec<f64>> {
        check_sizes(predicted, expected)?;
        Ok(GRADIENTS[self.slot()](predicted, expected))
    }
}

fn check_sizes(predicted: &[f64], expected: &[f64]) -> Result<()> {
    if predicted.len() != expected.len() {
        return Err(NnetError::size_mismatch("loss target", predicted.len(), expected.len()));
    }
    Ok(())
}
