//! Error types for batchpool
//!
//! Only construction-time and usage errors surface through [`Error`]. Failures
//! raised by a processing function stay typed as the caller's own error and are
//! delivered through the error callback, never through this enum.

use thiserror::Error;

/// Result type alias for batchpool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for batchpool
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "MAX_WORKERS")
        key: Option<String>,
    },

    /// The task source cannot be dispatched (detected before any unit is scheduled)
    #[error("invalid task source: {0}")]
    InvalidSource(String),

    /// I/O error while reading a task source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown in progress - not accepting new batches
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// The worker runtime could not be started
    #[error("failed to start worker runtime: {0}")]
    Runtime(String),
}

impl Error {
    /// Build a configuration error tied to a specific option name
    pub(crate) fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Returns the offending configuration key, if this is a keyed config error
    pub fn config_key(&self) -> Option<&str> {
        match self {
            Error::Config { key, .. } => key.as_deref(),
            _ => None,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_carries_key_and_message() {
        let err = Error::config("MAX_WORKERS", "must be at least 1");
        assert_eq!(err.config_key(), Some("MAX_WORKERS"));
        assert_eq!(
            err.to_string(),
            "configuration error: must be at least 1"
        );
    }

    #[test]
    fn non_config_errors_have_no_key() {
        assert_eq!(Error::ShuttingDown.config_key(), None);
        assert_eq!(
            Error::InvalidSource("empty separator".into()).config_key(),
            None
        );
    }

    #[test]
    fn io_error_converts_via_question_mark() {
        fn read() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        let err = read().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: gone");
    }
}
