//! Suite timeout guard.
//!
//! A single wall-clock session is started when the run begins. The guard is
//! advisory while the run is in progress; at session end its verdict
//! decides whether the process exits with [`SUITE_TIMEOUT_EXIT_CODE`].

use crate::result::StaywalkError;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Process exit code used when the run outlived its budget
pub const SUITE_TIMEOUT_EXIT_CODE: i32 = 3;

/// Outcome of checking elapsed time against the budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardVerdict {
    /// Finished inside the budget
    WithinBudget {
        /// Elapsed wall-clock time
        elapsed: Duration,
    },
    /// Ran past the budget
    Exceeded {
        /// Elapsed wall-clock time
        elapsed: Duration,
        /// Configured budget
        budget: Duration,
    },
}

impl GuardVerdict {
    /// Whether the run must be aborted
    #[must_use]
    pub const fn is_exceeded(&self) -> bool {
        matches!(self, Self::Exceeded { .. })
    }

    /// Exit code the verdict demands, if any
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::WithinBudget { .. } => None,
            Self::Exceeded { .. } => Some(SUITE_TIMEOUT_EXIT_CODE),
        }
    }

    /// Error describing an exceeded budget
    #[must_use]
    pub fn into_error(self) -> Option<StaywalkError> {
        match self {
            Self::WithinBudget { .. } => None,
            Self::Exceeded { elapsed, budget } => Some(StaywalkError::SuiteTimeoutExceeded {
                elapsed_secs: elapsed.as_secs_f64(),
                budget_secs: budget.as_secs(),
            }),
        }
    }
}

/// Wall-clock timer for one run
#[derive(Debug, Clone, Copy)]
pub struct SuiteGuard {
    started: Instant,
    budget: Duration,
}

impl SuiteGuard {
    /// Start timing now
    #[must_use]
    pub fn start(budget: Duration) -> Self {
        Self::started_at(Instant::now(), budget)
    }

    /// Guard whose session began at `started`
    #[must_use]
    pub const fn started_at(started: Instant, budget: Duration) -> Self {
        Self { started, budget }
    }

    /// Configured budget
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.budget
    }

    /// Time since the session started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Verdict for a given elapsed time; only strictly more than the
    /// budget counts as exceeded
    #[must_use]
    pub fn verdict_at(&self, elapsed: Duration) -> GuardVerdict {
        if elapsed > self.budget {
            GuardVerdict::Exceeded {
                elapsed,
                budget: self.budget,
            }
        } else {
            GuardVerdict::WithinBudget { elapsed }
        }
    }

    /// Verdict for the session so far
    #[must_use]
    pub fn verdict(&self) -> GuardVerdict {
        self.verdict_at(self.elapsed())
    }

    /// Close the session and log the verdict
    #[must_use]
    pub fn finish(&self) -> GuardVerdict {
        let verdict = self.verdict();
        match verdict {
            GuardVerdict::WithinBudget { elapsed } => tracing::info!(
                elapsed_secs = elapsed.as_secs_f64(),
                budget_secs = self.budget.as_secs(),
                "suite finished within budget"
            ),
            GuardVerdict::Exceeded { elapsed, budget } => tracing::error!(
                elapsed_secs = elapsed.as_secs_f64(),
                budget_secs = budget.as_secs(),
                "suite exceeded its time budget"
            ),
        }
        verdict
    }
}

static SESSION: OnceLock<SuiteGuard> = OnceLock::new();

/// Start the process-wide session; later calls return the first guard
pub fn begin_session(budget: Duration) -> SuiteGuard {
    *SESSION.get_or_init(|| {
        tracing::debug!(budget_secs = budget.as_secs(), "suite session started");
        SuiteGuard::start(budget)
    })
}

/// The process-wide session, if started
#[must_use]
pub fn session() -> Option<SuiteGuard> {
    SESSION.get().copied()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_within_budget_does_not_abort() {
        let guard = SuiteGuard::start(Duration::from_secs(900));
        let verdict = guard.verdict_at(Duration::from_secs(899));
        assert!(!verdict.is_exceeded());
        assert_eq!(verdict.exit_code(), None);
        assert!(verdict.into_error().is_none());
        assert!(!guard.verdict_at(Duration::from_secs(900)).is_exceeded());
    }

    #[test]
    fn test_exceeded_budget_aborts_with_message() {
        let guard = SuiteGuard::start(Duration::from_secs(900));
        let verdict = guard.verdict_at(Duration::from_millis(901_456));
        assert_eq!(verdict.exit_code(), Some(SUITE_TIMEOUT_EXIT_CODE));
        assert_eq!(
            verdict.into_error().unwrap().to_string(),
            "Test suite exceeded timeout of 900 seconds (elapsed: 901.46)"
        );
    }

    #[test]
    fn test_zero_budget_is_exceeded_after_any_time() {
        let started = Instant::now() - Duration::from_millis(5);
        let guard = SuiteGuard::started_at(started, Duration::ZERO);
        assert!(guard.finish().is_exceeded());
        assert!(guard.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_session_is_initialized_once() {
        let first = begin_session(Duration::from_secs(60));
        let second = begin_session(Duration::from_secs(1));
        assert_eq!(second.budget(), first.budget());
        assert_eq!(session().unwrap().budget(), first.budget());
    }
}
