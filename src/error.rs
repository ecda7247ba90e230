use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied a value the model cannot accept (bad macroPer, negative quantity, duplicate id).
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("meal index {0} out of range (expected 0..=3)")]
    OutOfRange(usize),

    /// Mutation attempted before the initial load finished.
    #[error("session is not ready")]
    NotReady,

    #[error("persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),

    #[error("malformed persisted data: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
