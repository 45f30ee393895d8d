//! Page Object Model support.
//!
//! A page object borrows the shared driver for as long as it works on the
//! page, together with the selector table and timing it should use. The
//! borrow is released when the page object is dropped, so the next page
//! object in the flow can take the same driver.

use crate::config::Timing;
use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::result::StaywalkResult;
use crate::retry::{Interaction, InteractionOutcome, Retrier, RetryPolicy};
use crate::selectors::{SelectorKey, SelectorTable};
use crate::wait::WaitState;

/// A page or component of the site under test
pub trait PageObject {
    /// Page name for logging
    fn page_name(&self) -> &'static str;

    /// Element whose presence means the page is usable
    fn ready_marker(&self) -> Option<SelectorKey> {
        None
    }
}

/// Driver, selectors and timing borrowed by one page object
pub struct PageContext<'a, D: PageDriver + ?Sized> {
    driver: &'a mut D,
    selectors: &'a SelectorTable,
    retrier: Retrier,
    timing: Timing,
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for PageContext<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageContext")
            .field("retrier", &self.retrier)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

impl<'a, D: PageDriver + ?Sized> PageContext<'a, D> {
    /// Borrow `driver` with the default retry policy, backing off by the
    /// settle delay between attempts
    pub fn new(driver: &'a mut D, selectors: &'a SelectorTable, timing: Timing) -> Self {
        let policy = RetryPolicy::default().with_delay(timing.settle);
        Self {
            driver,
            selectors,
            retrier: Retrier::new(policy).with_wait_timeout(timing.wait_timeout),
            timing,
        }
    }

    /// Replace the base retry policy
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.retrier = self.retrier.with_policy(policy);
        self
    }

    /// Base retry policy for this page's interactions
    pub const fn policy(&self) -> &RetryPolicy {
        self.retrier.policy()
    }

    /// The borrowed driver
    pub fn driver(&mut self) -> &mut D {
        &mut *self.driver
    }

    /// The borrowed driver, read-only
    pub fn driver_ref(&self) -> &D {
        &*self.driver
    }

    /// Selector table in use
    #[must_use]
    pub const fn selectors(&self) -> &SelectorTable {
        self.selectors
    }

    /// Timing in use
    #[must_use]
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// Locator for a semantic key
    pub fn locator(&self, key: SelectorKey) -> StaywalkResult<Locator> {
        self.selectors.locator(key)
    }

    /// Retried click on a keyed element
    pub async fn click(&mut self, key: SelectorKey) -> StaywalkResult<InteractionOutcome> {
        let locator = self.locator(key)?.first();
        self.click_locator(locator).await
    }

    /// Retried click on an explicit locator
    pub async fn click_locator(&mut self, locator: Locator) -> StaywalkResult<InteractionOutcome> {
        self.retrier
            .perform(&mut *self.driver, &Interaction::Click(locator))
            .await
    }

    /// Retried click that is skipped when `done` is already visible and
    /// waits for `done` afterwards
    pub async fn click_guarded(
        &mut self,
        key: SelectorKey,
        done: SelectorKey,
    ) -> StaywalkResult<InteractionOutcome> {
        let target = self.locator(key)?.first();
        let marker = self.locator(done)?.first();
        let retrier = self
            .retrier
            .with_policy(self.retrier.policy().clone().with_precondition(marker));
        retrier
            .perform(&mut *self.driver, &Interaction::Click(target))
            .await
    }

    /// Retried fill of a keyed input
    pub async fn fill(&mut self, key: SelectorKey, text: &str) -> StaywalkResult<()> {
        let locator = self.locator(key)?.first();
        self.retrier
            .perform(&mut *self.driver, &Interaction::Fill(locator, text.to_string()))
            .await?;
        Ok(())
    }

    /// Retried text read of a keyed element
    pub async fn read_text(&mut self, key: SelectorKey) -> StaywalkResult<String> {
        let locator = self.locator(key)?.first();
        let outcome = self
            .retrier
            .perform(&mut *self.driver, &Interaction::ReadText(locator))
            .await?;
        Ok(outcome.text.unwrap_or_default())
    }

    /// Non-failing visibility probe
    pub async fn is_visible(&self, key: SelectorKey) -> bool {
        match self.locator(key) {
            Ok(l) => self.driver.is_visible(&l.first()).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Non-failing enabled probe
    pub async fn is_enabled(&self, key: SelectorKey) -> bool {
        match self.locator(key) {
            Ok(l) => self.driver.is_enabled(&l.first()).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Pause for the configured settle delay
    pub async fn settle(&self) {
        if !self.timing.settle.is_zero() {
            tokio::time::sleep(self.timing.settle).await;
        }
    }

    /// Wait for a page object's ready marker, if it has one
    pub async fn wait_until_ready<P: PageObject + ?Sized>(&self, page: &P) -> StaywalkResult<()> {
        if let Some(key) = page.ready_marker() {
            tracing::debug!(page = page.page_name(), marker = ?key, "waiting for page");
            let marker = self.locator(key)?.first();
            self.driver
                .wait_for(&marker, WaitState::Visible, self.timing.results_timeout)
                .await?;
        }
        Ok(())
    }
}
