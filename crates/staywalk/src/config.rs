//! Suite configuration loaded from the process environment.
//!
//! Recognised variables:
//!
//! | Variable               | Default                  |
//! |------------------------|--------------------------|
//! | `BASE_URL`             | `https://www.airbnb.com` |
//! | `WAIT_AFTER_ACTION_MS` | `4000`                   |
//! | `SUITE_TIMEOUT_SEC`    | `900`                    |
//!
//! A `.env` file in the working directory is loaded first when present.
//! Variables that are set but malformed are reported, never defaulted.

use crate::result::{StaywalkError, StaywalkResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Environment variable naming the site root
pub const BASE_URL_VAR: &str = "BASE_URL";
/// Environment variable naming the settle delay after actions
pub const WAIT_AFTER_ACTION_VAR: &str = "WAIT_AFTER_ACTION_MS";
/// Environment variable naming the suite budget
pub const SUITE_TIMEOUT_VAR: &str = "SUITE_TIMEOUT_SEC";

/// Default site root
pub const DEFAULT_BASE_URL: &str = "https://www.airbnb.com";
/// Default settle delay after actions
pub const DEFAULT_WAIT_AFTER_ACTION_MS: u64 = 4000;
/// Default suite budget
pub const DEFAULT_SUITE_TIMEOUT_SECS: u64 = 900;

/// Upper bound for waiting on result cards after a search
const RESULTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Top-level suite configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Site root the scenario starts from
    pub base_url: String,
    /// Settle delay after page-changing actions
    pub wait_after_action: Duration,
    /// Wall-clock budget for the whole run
    pub suite_timeout: Duration,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            wait_after_action: Duration::from_millis(DEFAULT_WAIT_AFTER_ACTION_MS),
            suite_timeout: Duration::from_secs(DEFAULT_SUITE_TIMEOUT_SECS),
        }
    }
}

impl SuiteConfig {
    /// Load `.env` (if any) and then read the process environment
    pub fn from_env() -> StaywalkResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(StaywalkError::config(".env", e.to_string())),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> StaywalkResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(BASE_URL_VAR) {
            config = config.with_base_url(raw)?;
        }
        if let Some(ms) = parse_u64(&lookup, WAIT_AFTER_ACTION_VAR)? {
            config.wait_after_action = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(&lookup, SUITE_TIMEOUT_VAR)? {
            config.suite_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Replace the base URL, validating it is absolute
    pub fn with_base_url(mut self, raw: impl Into<String>) -> StaywalkResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .map_err(|e| StaywalkError::config(BASE_URL_VAR, format!("'{raw}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StaywalkError::config(
                BASE_URL_VAR,
                format!("'{raw}' is not an http(s) URL"),
            ));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    /// Replace the settle delay
    #[must_use]
    pub const fn with_wait_after_action(mut self, wait: Duration) -> Self {
        self.wait_after_action = wait;
        self
    }

    /// Replace the suite budget
    #[must_use]
    pub const fn with_suite_timeout(mut self, budget: Duration) -> Self {
        self.suite_timeout = budget;
        self
    }

    /// Host part of the base URL
    #[must_use]
    pub fn base_host(&self) -> Option<String> {
        Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }

    /// Timing derived for page objects
    #[must_use]
    pub const fn timing(&self) -> Timing {
        Timing {
            settle: self.wait_after_action,
            wait_timeout: self.wait_after_action,
            results_timeout: RESULTS_TIMEOUT,
        }
    }
}

fn parse_u64<F>(lookup: &F, key: &str) -> StaywalkResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|e| {
                StaywalkError::config(key, format!("'{raw}' is not a non-negative integer: {e}"))
            })
        })
        .transpose()
}

/// Delays and bounds used while driving pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Pause after page-changing actions
    pub settle: Duration,
    /// Bound for each element wait inside an interaction
    pub wait_timeout: Duration,
    /// Bound for result cards to appear after searching
    pub results_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        SuiteConfig::default().timing()
    }
}

impl Timing {
    /// No settling and short waits, for scripted drivers
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            settle: Duration::ZERO,
            wait_timeout: Duration::from_millis(20),
            results_timeout: Duration::from_millis(20),
        }
    }
}
