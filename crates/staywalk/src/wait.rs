//! Wait mechanisms for element synchronization.
//!
//! Every wait is bounded: it polls the driver at a fixed interval and gives
//! up with [`StaywalkError::Timeout`] once the timeout passes.

use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::result::{StaywalkError, StaywalkResult};
use std::future::Future;
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT STATE
// =============================================================================

/// Element states a wait can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WaitState {
    /// Element is present in the DOM
    Attached,
    /// Element is present and rendered visible
    #[default]
    Visible,
}

impl WaitState {
    /// Name used in messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Attached => "attached",
            Self::Visible => "visible",
        }
    }
}

impl std::fmt::Display for WaitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `check` until it yields `true` or the timeout passes.
///
/// The check always runs at least once, so a zero timeout still observes
/// an already-satisfied condition. Errors from `check` abort the wait.
pub async fn poll_until<F, Fut>(
    mut check: F,
    options: &WaitOptions,
    waited_for: &str,
) -> StaywalkResult<Duration>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StaywalkResult<bool>>,
{
    let start = Instant::now();
    loop {
        if check().await? {
            return Ok(start.elapsed());
        }
        if start.elapsed() >= options.timeout() {
            return Err(StaywalkError::Timeout {
                ms: options.timeout_ms,
                waited_for: waited_for.to_string(),
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Wait for the addressed element to reach `state`
pub async fn wait_for_state<D>(
    driver: &D,
    locator: &Locator,
    state: WaitState,
    options: &WaitOptions,
) -> StaywalkResult<Duration>
where
    D: PageDriver + ?Sized,
{
    let waited_for = format!("{locator} to be {state}");
    poll_until(
        || async {
            match state {
                WaitState::Attached => driver.exists(locator).await,
                WaitState::Visible => driver.is_visible(locator).await,
            }
        },
        options,
        &waited_for,
    )
    .await
}

// =============================================================================
// TESTS
// =============================================================================
