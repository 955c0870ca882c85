use thiserror::Error;

/// Every failure the engine can report.
#[derive(Debug, Error)]
pub enum NnetError {
    /// A vector or matrix does not have the length/shape the receiver expects.
    #[error("{what}: expected size {expected}, got {actual}")]
    SizeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// A persisted stream could not be decoded.
    #[error("format error: {0}")]
    Format(String),

    /// `backward` was called before any `forward`.
    #[error("sequencing error: {0}")]
    Sequencing(String),

    /// A numeric helper received arguments outside its domain.
    #[error("domain error: {0}")]
    Domain(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid network description: {0}")]
    Config(#[from] serde_json::Error),
}

impl NnetError {
    pub fn size_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        NnetError::SizeMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        NnetError::Format(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, NnetError>;
