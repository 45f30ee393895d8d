//! Staywalk: end-to-end browser automation for a booking site.
//!
//! Drives the search → select → reserve journey through page objects that
//! share one [`PageDriver`], retrying flaky interactions and guarding the
//! whole run with a wall-clock budget.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     STAYWALK Architecture                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌──────────┐ │
//! │  │ SearchPage │──►│ Listing    │──►│Reservation │──►│ Result   │ │
//! │  │ submit +   │   │ Scanner    │   │ Page       │   │ records  │ │
//! │  │ validate   │   │            │   │            │   │          │ │
//! │  └─────┬──────┘   └─────┬──────┘   └─────┬──────┘   └──────────┘ │
//! │        └────────────────┼────────────────┘                       │
//! │                 ┌───────▼────────┐        ┌─────────────────┐    │
//! │                 │ Retrier + Wait │        │ SuiteGuard      │    │
//! │                 └───────┬────────┘        │ (whole session) │    │
//! │                 ┌───────▼────────┐        └─────────────────┘    │
//! │                 │ PageDriver     │  CdpPage | MockDriver         │
//! │                 └────────────────┘                               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[allow(clippy::missing_errors_doc)]
mod browser;
mod config;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
#[allow(clippy::missing_errors_doc)]
mod listing;
mod locator;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod page_object;
#[allow(clippy::missing_errors_doc)]
mod reservation;
mod result;
mod retry;
#[allow(clippy::missing_errors_doc)]
mod scanner;
#[allow(clippy::missing_errors_doc)]
mod search;
#[allow(clippy::missing_errors_doc)]
mod selectors;
mod suite;
#[allow(clippy::missing_errors_doc)]
mod wait;

#[cfg(feature = "browser")]
pub use browser::{Browser, CdpPage};
pub use browser::{BrowserConfig, DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH};
pub use config::{
    SuiteConfig, Timing, BASE_URL_VAR, DEFAULT_BASE_URL, DEFAULT_SUITE_TIMEOUT_SECS,
    DEFAULT_WAIT_AFTER_ACTION_MS, SUITE_TIMEOUT_VAR, WAIT_AFTER_ACTION_VAR,
};
pub use driver::{MockDom, MockDriver, MockEffect, MockElement, PageDriver};
pub use listing::{parse_price, parse_rating, resolve_listing_url, select_best, Listing};
pub use locator::{Locator, Selector};
pub use page_object::{PageContext, PageObject};
pub use reservation::{parse_date_range, parse_guest_counts, ReservationPage, ReservationResult};
pub use result::{StaywalkError, StaywalkResult};
pub use retry::{
    Interaction, InteractionOutcome, Retrier, RetryPolicy, DEFAULT_INTERACTION_TIMEOUT,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
pub use scanner::{ListingScanner, ScanReport, DEFAULT_MAX_PAGES};
pub use search::{GuestCounts, SearchCriteria, SearchPage};
pub use selectors::{SelectorKey, SelectorTable, DATE_PLACEHOLDER};
pub use suite::{begin_session, session, GuardVerdict, SuiteGuard, SUITE_TIMEOUT_EXIT_CODE};
pub use wait::{
    poll_until, wait_for_state, WaitOptions, WaitState, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::listing::*;
    pub use super::locator::*;
    pub use super::page_object::*;
    pub use super::reservation::*;
    pub use super::result::*;
    pub use super::retry::*;
    pub use super::scanner::*;
    pub use super::search::*;
    pub use super::selectors::*;
    pub use super::suite::*;
    pub use super::wait::*;
}
