//! Error types for the CLI

use staywalk::{StaywalkError, SUITE_TIMEOUT_EXIT_CODE};
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Exit code for a failed scenario
pub const SCENARIO_FAILURE_EXIT_CODE: u8 = 1;
/// Exit code for configuration and usage problems
pub const CONFIG_EXIT_CODE: u8 = 2;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Test data file missing or malformed
    #[error("Test data error in {path}: {message}")]
    TestData {
        /// File that was read
        path: String,
        /// Error message
        message: String,
    },

    /// Scenario assertion did not hold
    #[error("Scenario assertion failed: {message}")]
    Assertion {
        /// Error message
        message: String,
    },

    /// Writing a result artifact failed
    #[error("Failed to write artifact {path}: {message}")]
    Artifact {
        /// Target path
        path: String,
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Staywalk library error
    #[error("{0}")]
    Staywalk(#[from] StaywalkError),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a test data error
    #[must_use]
    pub fn test_data(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TestData {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Create an artifact error
    #[must_use]
    pub fn artifact(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Artifact {
            path: path.into(),
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

    /// Process exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config { .. } | Self::TestData { .. } | Self::InvalidArgument { .. } => {
                CONFIG_EXIT_CODE
            }
            Self::Staywalk(StaywalkError::Config { .. } | StaywalkError::Selectors { .. }) => {
                CONFIG_EXIT_CODE
            }
            Self::Staywalk(StaywalkError::SuiteTimeoutExceeded { .. }) => {
                SUITE_TIMEOUT_EXIT_CODE as u8
            }
            _ => SCENARIO_FAILURE_EXIT_CODE,
        }
    }
}
