//! Pipeline error types
//!
//! Error types for the replica store, change streams and pipeline startup.

use thiserror::Error;

/// Replica store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database driver error (connection lost, constraint violation, ...)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Replica store could not be opened
    #[error("replica store: {0}")]
    Store(#[from] StoreError),

    /// Change stream could not be created or subscribed
    #[error("change stream: {0}")]
    Stream(String),
}

impl PipelineError {
    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(err.to_string().starts_with("database error:"));

        let err = PipelineError::from(StoreError::from(sqlx::Error::PoolClosed));
        assert!(err.to_string().contains("replica store"));

        let err = PipelineError::stream("no brokers");
        assert_eq!(err.to_string(), "change stream: no brokers");
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: StoreError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
