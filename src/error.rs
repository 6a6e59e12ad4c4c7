use thiserror::Error;

/// Main error type for cuttle operations
#[derive(Error, Debug)]
pub enum CuttleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index corruption: {0}")]
    Corrupt(String),

    #[error("Invalid index file {file}: {reason}")]
    InvalidIndexFile { file: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for cuttle operations
pub type Result<T> = std::result::Result<T, CuttleError>;

impl CuttleError {
    /// Check if this error signals on-disk index corruption (fatal for the query,
    /// not for the process)
    pub fn is_corruption(&self) -> bool {
        matches!(self, CuttleError::Corrupt(_) | CuttleError::InvalidIndexFile { .. })
    }
}
