pub mod loop_fn;
pub mod progress;
pub mod train_config;
pub mod trainer;

pub use loop_fn::{evaluate_accuracy, train_loop};
pub use progress::{ProgressReport, TrainOutcome};
pub use train_config::TrainConfig;
pub use trainer::train_network;
