//! Interaction retrier for flaky UI actions.
//!
//! Each attempt runs: precondition probe, bounded wait for the target,
//! the action itself, then a bounded wait for the post-condition. Any
//! failure along the way counts as a failed attempt; the page is optionally
//! reloaded and the retrier sleeps a fixed delay before the next one.

use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::result::{StaywalkError, StaywalkResult};
use crate::wait::WaitState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of attempts per interaction
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default pause between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Default bound for waits inside one attempt
pub const DEFAULT_INTERACTION_TIMEOUT: Duration = Duration::from_secs(4);

/// Retry behavior for one interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts before giving up (at least 1)
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
    /// Reload the page after a failed attempt
    pub reload_on_failure: bool,
    /// Element whose visibility means the action already took effect
    #[serde(skip)]
    pub success_precondition: Option<Locator>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
            reload_on_failure: false,
            success_precondition: None,
        }
    }
}

impl RetryPolicy {
    /// Default policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt budget; values below 1 are raised to 1
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the pause between attempts
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reload the page after each failed attempt
    #[must_use]
    pub const fn with_reload(mut self, reload: bool) -> Self {
        self.reload_on_failure = reload;
        self
    }

    /// Skip the action when `locator` is already visible, and wait for it
    /// after acting
    #[must_use]
    pub fn with_precondition(mut self, locator: Locator) -> Self {
        self.success_precondition = Some(locator);
        self
    }

    /// Policy with no pause, for scripted drivers
    #[must_use]
    pub fn immediate() -> Self {
        Self::default().with_delay(Duration::ZERO)
    }
}

/// A single UI action the retrier can perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Click the element (a role locator makes this a role-based click)
    Click(Locator),
    /// Replace the value of an input
    Fill(Locator, String),
    /// Read the rendered text of an element
    ReadText(Locator),
}

impl Interaction {
    /// Target element
    #[must_use]
    pub const fn target(&self) -> &Locator {
        match self {
            Self::Click(l) | Self::Fill(l, _) | Self::ReadText(l) => l,
        }
    }

    /// State the target must reach before acting
    #[must_use]
    pub const fn ready_state(&self) -> WaitState {
        match self {
            Self::Click(_) | Self::Fill(..) => WaitState::Visible,
            Self::ReadText(_) => WaitState::Attached,
        }
    }

    /// Human-readable description for logs and errors
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Click(l) => format!("click {l}"),
            Self::Fill(l, text) => format!("fill {l} with '{text}'"),
            Self::ReadText(l) => format!("read text of {l}"),
        }
    }
}

/// What a successful [`Retrier::perform`] observed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionOutcome {
    /// Attempts made (0 when skipped)
    pub attempts: u32,
    /// The precondition held, so nothing was done
    pub skipped: bool,
    /// Text read by [`Interaction::ReadText`]
    pub text: Option<String>,
}

/// Runs interactions under a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    wait_timeout: Duration,
}

impl Default for Retrier {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl Retrier {
    /// Retrier with the default per-attempt wait bound
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            wait_timeout: DEFAULT_INTERACTION_TIMEOUT,
        }
    }

    /// Set the bound for waits inside one attempt
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Active policy
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Same bounds, different policy
    #[must_use]
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            policy,
            wait_timeout: self.wait_timeout,
        }
    }

    /// Perform `interaction`, retrying per the policy.
    ///
    /// # Errors
    ///
    /// Returns [`StaywalkError::InteractionFailed`] carrying the last cause
    /// once `max_attempts` attempts have failed.
    pub async fn perform<D>(
        &self,
        driver: &mut D,
        interaction: &Interaction,
    ) -> StaywalkResult<InteractionOutcome>
    where
        D: PageDriver + ?Sized,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if let Some(pre) = &self.policy.success_precondition {
                if driver.is_visible(pre).await.unwrap_or(false) {
                    tracing::debug!(
                        action = %interaction.describe(),
                        precondition = %pre,
                        "precondition already satisfied, skipping"
                    );
                    return Ok(InteractionOutcome {
                        attempts: attempt - 1,
                        skipped: attempt == 1,
                        text: None,
                    });
                }
            }

            match self.attempt(driver, interaction).await {
                Ok(text) => {
                    tracing::debug!(action = %interaction.describe(), attempt, "interaction succeeded");
                    return Ok(InteractionOutcome {
                        attempts: attempt,
                        skipped: false,
                        text,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        action = %interaction.describe(),
                        attempt,
                        max_attempts,
                        error = %e,
                        "interaction attempt failed"
                    );
                    last_error = Some(e);
                }
            }

            if attempt < max_attempts {
                if self.policy.reload_on_failure {
                    if let Err(e) = driver.reload().await {
                        tracing::warn!(error = %e, "reload between attempts failed");
                    }
                }
                if !self.policy.delay.is_zero() {
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }

        Err(StaywalkError::InteractionFailed {
            action: interaction.describe(),
            attempts: max_attempts,
            source: Box::new(last_error.unwrap_or_else(|| StaywalkError::page("no attempt made"))),
        })
    }

    async fn attempt<D>(
        &self,
        driver: &mut D,
        interaction: &Interaction,
    ) -> StaywalkResult<Option<String>>
    where
        D: PageDriver + ?Sized,
    {
        let target = interaction.target();
        driver
            .wait_for(target, interaction.ready_state(), self.wait_timeout)
            .await?;

        let text = match interaction {
            Interaction::Click(l) => {
                driver.click(l).await?;
                None
            }
            Interaction::Fill(l, value) => {
                driver.fill(l, value).await?;
                None
            }
            Interaction::ReadText(l) => Some(driver.inner_text(l).await?),
        };

        if let Some(post) = &self.policy.success_precondition {
            driver
                .wait_for(post, WaitState::Visible, self.wait_timeout)
                .await?;
        }

        Ok(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDom, MockDriver, MockEffect, MockElement};

    fn fast(policy: RetryPolicy) -> Retrier {
        Retrier::new(policy.with_delay(Duration::ZERO)).with_wait_timeout(Duration::from_millis(5))
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let policy = RetryPolicy::default();
            assert_eq!(policy.max_attempts, 5);
            assert_eq!(policy.delay, Duration::from_secs(1));
            assert!(!policy.reload_on_failure);
            assert!(policy.success_precondition.is_none());
        }

        #[test]
        fn test_max_attempts_floor() {
            assert_eq!(RetryPolicy::new().with_max_attempts(0).max_attempts, 1);
        }

        #[test]
        fn test_describe() {
            let button = Locator::role("button", "Reserve");
            assert_eq!(
                Interaction::Click(button.clone()).describe(),
                "click role=button[name=\"Reserve\"]"
            );
            assert_eq!(Interaction::ReadText(button).ready_state(), WaitState::Attached);
        }
    }

    mod perform_tests {
        use super::*;

        #[tokio::test]
        async fn test_satisfied_precondition_performs_nothing() {
            let button = Locator::css("#search");
            let results = Locator::css(".card");
            let mut driver = MockDriver::new().with_dom(
                MockDom::new()
                    .with(&button, MockElement::new())
                    .with(&results, MockElement::new()),
            );
            let retrier = fast(RetryPolicy::new().with_precondition(results.first()));

            let outcome = retrier
                .perform(&mut driver, &Interaction::Click(button))
                .await
                .unwrap();

            assert!(outcome.skipped);
            assert_eq!(outcome.attempts, 0);
            assert!(driver.history().is_empty());
        }

        #[tokio::test]
        async fn test_k_failures_then_success() {
            for k in 0..4_usize {
                let button = Locator::css("#go");
                let mut driver = MockDriver::new().with_dom(
                    MockDom::new().with(&button, MockElement::new().failing_clicks(k)),
                );
                let outcome = fast(RetryPolicy::new())
                    .perform(&mut driver, &Interaction::Click(button))
                    .await
                    .unwrap();
                assert_eq!(outcome.attempts as usize, k + 1);
                assert_eq!(driver.calls("click:"), k + 1);
            }
        }

        #[tokio::test]
        async fn test_always_failing_exhausts_attempts() {
            let button = Locator::css("#go");
            let mut driver = MockDriver::new().with_dom(
                MockDom::new().with(&button, MockElement::new().failing_clicks(usize::MAX)),
            );
            let err = fast(RetryPolicy::new().with_max_attempts(3))
                .perform(&mut driver, &Interaction::Click(button))
                .await
                .unwrap_err();

            match err {
                StaywalkError::InteractionFailed {
                    attempts, source, ..
                } => {
                    assert_eq!(attempts, 3);
                    assert!(matches!(*source, StaywalkError::Action { .. }));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(driver.calls("click:"), 3);
        }

        #[tokio::test]
        async fn test_missing_target_times_out_each_attempt() {
            let mut driver = MockDriver::new();
            let err = fast(RetryPolicy::new().with_max_attempts(2))
                .perform(&mut driver, &Interaction::Click(Locator::css("#absent")))
                .await
                .unwrap_err();
            match err {
                StaywalkError::InteractionFailed { source, .. } => {
                    assert!(matches!(*source, StaywalkError::Timeout { .. }));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(driver.calls("click:"), 0);
        }

        #[tokio::test]
        async fn test_reload_between_attempts() {
            let button = Locator::css("#go");
            let mut driver = MockDriver::new().with_dom(
                MockDom::new().with(&button, MockElement::new().failing_clicks(2)),
            );
            fast(RetryPolicy::new().with_reload(true))
                .perform(&mut driver, &Interaction::Click(button))
                .await
                .unwrap();
            assert_eq!(driver.calls("reload"), 2);
        }

        #[tokio::test]
        async fn test_post_condition_must_appear() {
            let button = Locator::css("#reserve");
            let form = Locator::css("#form");
            let mut driver = MockDriver::new().with_dom(MockDom::new().with(
                &button,
                MockElement::new().on_click(MockEffect::Show(form.to_string(), MockElement::new())),
            ));
            let outcome = fast(RetryPolicy::new().with_precondition(form.clone()))
                .perform(&mut driver, &Interaction::Click(button.clone()))
                .await
                .unwrap();
            assert_eq!(outcome.attempts, 1);
            assert!(!outcome.skipped);

            // Clicking without the form ever appearing fails every attempt.
            let mut stuck =
                MockDriver::new().with_dom(MockDom::new().with(&button, MockElement::new()));
            let err = fast(RetryPolicy::new().with_max_attempts(2).with_precondition(form))
                .perform(&mut stuck, &Interaction::Click(button))
                .await
                .unwrap_err();
            assert!(err.is_interaction_failure());
            assert_eq!(stuck.calls("click:"), 2);
        }

        #[tokio::test]
        async fn test_read_text_and_fill() {
            let summary = Locator::css("#summary");
            let input = Locator::css("#dest");
            let mut driver = MockDriver::new().with_dom(
                MockDom::new()
                    .with(&summary, MockElement::with_text("Paris").hidden())
                    .with(&input, MockElement::new()),
            );
            let retrier = fast(RetryPolicy::new());

            let outcome = retrier
                .perform(&mut driver, &Interaction::ReadText(summary))
                .await
                .unwrap();
            assert_eq!(outcome.text.as_deref(), Some("Paris"));

            retrier
                .perform(&mut driver, &Interaction::Fill(input.clone(), "Rome".into()))
                .await
                .unwrap();
            assert_eq!(driver.input_value(&input).await.unwrap(), "Rome");
        }
    }
}
