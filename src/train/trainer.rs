use crate::error::{NnetError, Result};
use crate::network::network::NeuralNet;

/// Fits every sample once, in order. Returns the mean pre-update loss.
pub fn train_network(net: &mut NeuralNet, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<f64> {
    check_dataset(inputs, targets)?;

    let mut total_loss = 0.0;
    for (input, target) in inputs.iter().zip(targets) {
        total_loss += net.fit(input, target)?;
    }

    Ok(total_loss / inputs.len() as f64)
}

pub(crate) fn check_dataset(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<()> {
    if inputs.len() != targets.len() {
        return Err(NnetError::size_mismatch("training targets", inputs.len(), targets.len()));
    }
    if inputs.is_empty() {
        return Err(NnetError::Domain("training set is empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::DenseLayer;
    use crate::loss::Loss;

    fn identity_net() -> NeuralNet {
        NeuralNet::with_initializer(1, vec![Box::new(DenseLayer::new(0.1, 1))], Loss::SquaredError, || 1.0)
            .unwrap()
    }

    #[test]
    fn returns_mean_loss_of_the_pass() {
        let mut net = identity_net();
        // w = 1 fits the first sample exactly; the second misses by 1.
        let loss = train_network(&mut net, &[vec![1.0], vec![1.0]], &[vec![1.0], vec![0.0]]).unwrap();
        assert_eq!(loss, 0.5);
    }

    #[test]
    fn rejects_bad_datasets() {
        let mut net = identity_net();
        assert!(matches!(train_network(&mut net, &[vec![1.0]], &[]), Err(NnetError::SizeMismatch { .. })));
        assert!(matches!(train_network(&mut net, &[], &[]), Err(NnetError::Domain(_))));
    }
}
