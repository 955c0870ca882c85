pub mod cross_entropy;
pub mod loss_type;
pub mod squared_error;

pub use cross_entropy::CrossEntropyLoss;
pub use loss_type::Loss;
pub use squared_error::SquaredErrorLoss;
