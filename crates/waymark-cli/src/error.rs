//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// One or more replayed chains failed
    #[error("{failed} of {total} chain(s) failed")]
    ChainsFailed {
        /// Failed chains
        failed: usize,
        /// Chains replayed
        total: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Waymark library error
    #[error("{0}")]
    Waymark(#[from] waymark::WaymarkError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_chains_failed_message() {
        let err = CliError::ChainsFailed { failed: 1, total: 2 };
        assert_eq!(err.to_string(), "1 of 2 chain(s) failed");
    }

    #[test]
    fn test_from_waymark_error_keeps_message() {
        let err: CliError = waymark::WaymarkError::script("no chain named 'x'").into();
        assert_eq!(err.to_string(), "Script error: no chain named 'x'");
    }

    #[test]
    fn test_constructors() {
        assert!(matches!(CliError::config("x"), CliError::Config { .. }));
        assert!(matches!(
            CliError::invalid_argument("y"),
            CliError::InvalidArgument { .. }
        ));
    }
}
