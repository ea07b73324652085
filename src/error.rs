use thiserror::Error;

pub type Result<T> = std::result::Result<T, OptimizeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    /// The margin leaves no usable area on the board.
    #[error("invalid board: {0}")]
    InvalidBoard(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("optimization cancelled")]
    Cancelled,

    #[error("optimization timed out after {0}ms")]
    Timeout(u64),

    #[error("no strategy could optimize the pieces: {0}")]
    AllStrategiesFailed(String),
}

impl OptimizeError {
    /// Cancellation and timeouts abort the whole run instead of a single strategy.
    pub fn is_abort(&self) -> bool {
        matches!(self, OptimizeError::Cancelled | OptimizeError::Timeout(_))
    }
}
