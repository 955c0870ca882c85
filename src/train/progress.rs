use serde::{Deserialize, Serialize};

/// Rolling training statistics emitted by `train_loop`.
///
/// One report covers the `report_every` samples fitted since the previous
/// report, which may include the tail of the previous epoch. When a
/// `progress_tx` channel is configured in `TrainConfig`, every report is also
/// sent there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Samples fitted so far in this epoch.
    pub samples_seen: usize,
    /// Samples per epoch.
    pub total_samples: usize,
    /// Samples fitted since the run started.
    pub run_samples_seen: usize,
    /// Mean loss over the samples of this report window.
    pub window_loss: f64,
    /// Wall-clock time since the epoch started, in milliseconds.
    pub elapsed_ms: u64,
}

/// How a `train_loop` run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainOutcome {
    /// Every requested epoch ran.
    Completed { epochs: usize, loss: f64 },
    /// The stop flag was raised or the progress receiver went away.
    Stopped { epochs: usize, loss: f64 },
    /// The loss became NaN; training was abandoned mid-epoch.
    Diverged { epoch: usize, samples_seen: usize },
}

impl TrainOutcome {
    /// Mean loss of the last fully completed epoch, if any.
    pub fn last_loss(&self) -> Option<f64> {
        match *self {
            TrainOutcome::Completed { epochs, loss } | TrainOutcome::Stopped { epochs, loss } if epochs > 0 => {
                Some(loss)
            }
            _ => None,
        }
    }
}
