//! Result and error types for Staywalk.

use thiserror::Error;

/// Result type for Staywalk operations
pub type StaywalkResult<T> = Result<T, StaywalkError>;

/// Errors that can occur while driving the booking site
#[derive(Debug, Error)]
pub enum StaywalkError {
    /// Browser executable not found or failed to start
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page-level error reported by the driver
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A bounded wait ran out
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was waited for
        waited_for: String,
    },

    /// No element matched the locator
    #[error("No element matches {locator}")]
    ElementNotFound {
        /// Locator description
        locator: String,
    },

    /// Element exists but cannot receive the action
    #[error("Element {locator} is not interactable: {reason}")]
    NotInteractable {
        /// Locator description
        locator: String,
        /// Why the element rejected the action
        reason: String,
    },

    /// The driver rejected an action on an element
    #[error("Action on {locator} failed: {message}")]
    Action {
        /// Locator description
        locator: String,
        /// Error message
        message: String,
    },

    /// A UI action could not be completed after exhausting retries
    #[error("Interaction '{action}' failed after {attempts} attempt(s): {source}")]
    InteractionFailed {
        /// Description of the interaction
        action: String,
        /// Number of attempts made
        attempts: u32,
        /// Last failure
        #[source]
        source: Box<StaywalkError>,
    },

    /// A post-action assertion about UI or URL state did not hold
    #[error("Validation of {field} failed: expected '{expected}', got '{actual}'")]
    ValidationFailed {
        /// What was validated
        field: String,
        /// Expected value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// The scan finished without a single usable listing
    #[error("No listings found after scanning {pages} result page(s)")]
    NoListingsFound {
        /// Number of result pages walked
        pages: usize,
    },

    /// The selected listing has no absolute URL to navigate to
    #[error("Listing URL is not absolute: '{url}'")]
    InvalidListingUrl {
        /// Offending URL
        url: String,
    },

    /// The whole run exceeded its wall-clock budget
    #[error("Test suite exceeded timeout of {budget_secs} seconds (elapsed: {elapsed_secs:.2})")]
    SuiteTimeoutExceeded {
        /// Elapsed wall-clock seconds
        elapsed_secs: f64,
        /// Configured budget in seconds
        budget_secs: u64,
    },

    /// Configuration value missing or malformed
    #[error("Configuration error for {key}: {message}")]
    Config {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// Selector table could not be loaded
    #[error("Selector table error: {message}")]
    Selectors {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl StaywalkError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create a validation failure
    #[must_use]
    pub fn validation(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ValidationFailed {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this error came out of the interaction retrier
    #[must_use]
    pub const fn is_interaction_failure(&self) -> bool {
        matches!(self, Self::InteractionFailed { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_interaction_failed_keeps_cause() {
        let err = StaywalkError::InteractionFailed {
            action: "click css=#reserve".into(),
            attempts: 5,
            source: Box::new(StaywalkError::ElementNotFound {
                locator: "css=#reserve".into(),
            }),
        };
        let display = err.to_string();
        assert!(display.contains("5 attempt(s)"));
        assert!(display.contains("No element matches css=#reserve"));
        assert!(err.source().is_some());
        assert!(err.is_interaction_failure());
    }

    #[test]
    fn test_validation_message() {
        let err = StaywalkError::validation("url param 'adults'", "2", "3");
        assert_eq!(
            err.to_string(),
            "Validation of url param 'adults' failed: expected '2', got '3'"
        );
        assert!(!err.is_interaction_failure());
    }

    #[test]
    fn test_suite_timeout_message() {
        let err = StaywalkError::SuiteTimeoutExceeded {
            elapsed_secs: 901.456,
            budget_secs: 900,
        };
        assert_eq!(
            err.to_string(),
            "Test suite exceeded timeout of 900 seconds (elapsed: 901.46)"
        );
    }
}
