//! Result and error types for Waymark.

use crate::driver::DriverError;
use thiserror::Error;

/// Result type for Waymark operations
pub type WaymarkResult<T> = Result<T, WaymarkError>;

/// Errors that can occur in Waymark
#[derive(Debug, Error)]
pub enum WaymarkError {
    /// A screen descriptor was built without probes or without a primary probe
    #[error("Invalid screen descriptor '{screen}': {reason}")]
    InvalidDescriptor {
        /// Screen identifier
        screen: String,
        /// Why the descriptor was rejected
        reason: String,
    },

    /// A probe definition is malformed (e.g. an unparsable text pattern)
    #[error("Invalid probe '{probe}': {message}")]
    InvalidProbe {
        /// Probe name
        probe: String,
        /// Error message
        message: String,
    },

    /// Navigation exhausted its attempts without reaching the screen
    #[error("Navigation to '{screen}' failed after {attempts} attempt(s)")]
    NavigationFailed {
        /// Target screen identifier
        screen: String,
        /// Attempts performed
        attempts: u32,
    },

    /// A probe did not report the expected value
    #[error("Assertion failed at step {step_index}: probe '{probe}' expected {expected}, got {actual}")]
    AssertionFailed {
        /// Index of the failing step
        step_index: usize,
        /// Probe name
        probe: String,
        /// Expected probe value
        expected: bool,
        /// Observed probe value
        actual: bool,
    },

    /// A scripted UI action could not be performed
    #[error("Action failed at step {step_index}: {action}: {message}")]
    ActionFailed {
        /// Index of the failing step
        step_index: usize,
        /// Description of the action
        action: String,
        /// Error message
        message: String,
    },

    /// Error reported by the UI driver outside of probe evaluation
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Session bootstrap failed
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Chain script error
    #[error("Script error: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WaymarkError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a script error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Check if this error is a critical chain failure
    #[must_use]
    pub const fn is_chain_failure(&self) -> bool {
        matches!(
            self,
            Self::NavigationFailed { .. } | Self::AssertionFailed { .. } | Self::ActionFailed { .. }
        )
    }
}
