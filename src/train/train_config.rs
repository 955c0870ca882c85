use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{atomic::AtomicBool, Arc};

use crate::train::progress::ProgressReport;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`       — total number of full passes over the training data
/// - `report_every` — samples per progress report, counted over the whole run;
///                    `0` disables reporting
/// - `save_every`   — samples between checkpoints; `0` saves only at epoch end
/// - `model_path`   — checkpoint destination; no saving when `None`
/// - `progress_tx`  — optional channel sender; one `ProgressReport` is sent per
///                    report window. If the receiver is dropped the loop stops.
/// - `stop_flag`    — optional atomic flag; when set to `true` from another
///                    thread the loop stops before the next sample.
pub struct TrainConfig {
    pub epochs: usize,
    pub report_every: usize,
    pub save_every: usize,
    pub model_path: Option<PathBuf>,
    pub progress_tx: Option<mpsc::Sender<ProgressReport>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig`: no reports, no checkpoints, no channel
    /// and no stop flag.
    pub fn new(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            report_every: 0,
            save_every: 0,
            model_path: None,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn report_every(mut self, samples: usize) -> Self {
        self.report_every = samples;
        self
    }

    /// Checkpoints to `path` every `samples` samples and at every epoch end.
    pub fn save_to(mut self, path: impl Into<PathBuf>, samples: usize) -> Self {
        self.model_path = Some(path.into());
        self.save_every = samples;
        self
    }
}
