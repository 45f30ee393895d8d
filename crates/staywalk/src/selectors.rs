//! Selector table: semantic UI roles mapped to locators.
//!
//! Page objects never embed selector strings; they ask the table for the
//! locator playing a role ([`SelectorKey`]). The built-in table targets the
//! live booking site and can be overridden key by key from a YAML or JSON
//! file when the site's markup drifts.

use crate::locator::{Locator, Selector};
use crate::result::{StaywalkError, StaywalkResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Placeholder replaced by the ISO date in [`SelectorKey::CalendarDay`]
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Semantic role of a UI element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKey {
    /// Destination text input
    DestinationInput,
    /// Control opening the date picker
    CheckinOpener,
    /// Calendar day cell; its selector contains [`DATE_PLACEHOLDER`]
    CalendarDay,
    /// Control opening the guest selector
    GuestsOpener,
    /// "+" stepper for adults
    AdultsIncrement,
    /// "+" stepper for children
    ChildrenIncrement,
    /// Search submit button
    SearchButton,
    /// Location summary shown after searching
    LocationSummary,
    /// Guest summary shown after searching
    GuestsSummary,
    /// One result card
    ListingCards,
    /// Rating text inside a card
    ListingRating,
    /// Price text inside a card
    ListingPrice,
    /// Anchor inside a card
    ListingAnchor,
    /// Pagination "next" control
    NextPage,
    /// Close button of the optional interstitial popup
    PopupClose,
    /// Reserve button on the listing page
    ReserveButton,
    /// Guest summary on the reservation form
    ReservationGuests,
    /// Date range summary on the reservation form
    ReservationDates,
    /// Button advancing the reservation form
    ReservationNext,
    /// Phone number input
    PhoneInput,
    /// Final confirm/continue button
    FinalContinue,
}

impl SelectorKey {
    /// Every key, in declaration order
    pub const ALL: [Self; 21] = [
        Self::DestinationInput,
        Self::CheckinOpener,
        Self::CalendarDay,
        Self::GuestsOpener,
        Self::AdultsIncrement,
        Self::ChildrenIncrement,
        Self::SearchButton,
        Self::LocationSummary,
        Self::GuestsSummary,
        Self::ListingCards,
        Self::ListingRating,
        Self::ListingPrice,
        Self::ListingAnchor,
        Self::NextPage,
        Self::PopupClose,
        Self::ReserveButton,
        Self::ReservationGuests,
        Self::ReservationDates,
        Self::ReservationNext,
        Self::PhoneInput,
        Self::FinalContinue,
    ];

    /// Whether the selector is evaluated relative to a result card
    #[must_use]
    pub const fn is_card_scoped(self) -> bool {
        matches!(
            self,
            Self::ListingRating | Self::ListingPrice | Self::ListingAnchor
        )
    }
}

/// Lookup table from [`SelectorKey`] to [`Selector`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorTable {
    entries: BTreeMap<SelectorKey, Selector>,
}

const HEADER_FORM: &str = "body > div:nth-child(6) > div > div > div > div > div > div > div > div > div > header > form > div > div > div:nth-child(2)";
const RESERVATION_PANEL: &str = "#site-content > div > div > div > div:nth-child(1) > div > div:nth-child(2) > div > div > div > div > div > div > div > div > div > div > div:nth-child(1) > div:nth-child(2)";

impl Default for SelectorTable {
    fn default() -> Self {
        use SelectorKey as K;

        let entries = BTreeMap::from([
            (K::DestinationInput, Selector::css("#bigsearch-query-location-input")),
            (
                K::CheckinOpener,
                Selector::css(format!("{HEADER_FORM} > div:nth-child(2) > div:nth-child(3) > div > div:nth-child(2)")),
            ),
            (
                K::CalendarDay,
                Selector::css(format!("button[data-state--date-string=\"{DATE_PLACEHOLDER}\"]")),
            ),
            (
                K::GuestsOpener,
                Selector::css(format!("{HEADER_FORM} > div:nth-child(2) > div:nth-child(7) > div > div > div > div")),
            ),
            (K::AdultsIncrement, Selector::css("#stepper-adults > button:nth-child(3)")),
            (K::ChildrenIncrement, Selector::css("#stepper-children > button:nth-child(3)")),
            (
                K::SearchButton,
                Selector::css(format!("{HEADER_FORM} > div:nth-child(3) > button")),
            ),
            (
                K::LocationSummary,
                Selector::css("body > div:nth-child(6) > div > div > div > div > div > div:nth-child(2) > header > div > div > div > div > div > form > div > div > div:nth-child(2) > div > div:nth-child(3) > button:nth-child(1) > div:nth-child(3)"),
            ),
            (
                K::GuestsSummary,
                Selector::css("#react-application > div > div > div:nth-child(1) > div > div > div > header > div > div > div > div > div > form > div > div > div:nth-child(2) > div:nth-child(1) > div:nth-child(3) > button:nth-child(5) > div:nth-child(3)"),
            ),
            (K::ListingCards, Selector::xpath("//div[@data-testid=\"card-container\"]")),
            (
                K::ListingRating,
                Selector::xpath(".//span[@aria-hidden=\"true\" and contains(text(), \" (\")]"),
            ),
            (K::ListingPrice, Selector::xpath(".//span[contains(text(), \" per night\")]")),
            (K::ListingAnchor, Selector::css("a")),
            (
                K::NextPage,
                Selector::css("#site-content > div > div > div > div > div > nav > div > a:last-child"),
            ),
            (
                K::PopupClose,
                Selector::css("div > div > section > div > div > div:nth-child(2) > div > div > button"),
            ),
            (
                K::ReserveButton,
                Selector::css("#site-content > div > div:nth-child(1) > div:nth-child(3) > div > div > div > div > div:nth-child(1) > div > div > div > div:nth-child(2) > div > div > div > div > div > button"),
            ),
            (K::ReservationGuests, Selector::css(format!("{RESERVATION_PANEL} > div:nth-child(2)"))),
            (K::ReservationDates, Selector::css(format!("{RESERVATION_PANEL} > div:nth-child(1)"))),
            (
                K::ReservationNext,
                Selector::css("#site-content > div > div > div > div:nth-child(1) > div > div:nth-child(2) > div > div > div:nth-child(1) > div > div > button"),
            ),
            (K::PhoneInput, Selector::css("#phoneInputphone-login")),
            (
                K::FinalContinue,
                Selector::css("body > div:nth-child(16) > div > section > div > div > div > div > div > div > form > div > div > button"),
            ),
        ]);

        Self { entries }
    }
}

impl SelectorTable {
    /// Built-in table for the live site
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with no entries; lookups fail until keys are set
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Set one entry
    #[must_use]
    pub fn with(mut self, key: SelectorKey, selector: Selector) -> Self {
        self.set(key, selector);
        self
    }

    /// Set one entry
    pub fn set(&mut self, key: SelectorKey, selector: Selector) {
        let _ = self.entries.insert(key, selector);
    }

    /// Selector for a key
    pub fn selector(&self, key: SelectorKey) -> StaywalkResult<&Selector> {
        self.entries
            .get(&key)
            .ok_or_else(|| StaywalkError::Selectors {
                message: format!("no selector configured for {key:?}"),
            })
    }

    /// Top-level locator for a key
    pub fn locator(&self, key: SelectorKey) -> StaywalkResult<Locator> {
        Ok(Locator::new(self.selector(key)?.clone()))
    }

    /// Locator for a card-scoped key inside `card`
    pub fn within(&self, card: &Locator, key: SelectorKey) -> StaywalkResult<Locator> {
        Ok(card.locator(self.selector(key)?.clone()))
    }

    /// Calendar cell for an ISO date
    pub fn calendar_day(&self, date: &str) -> StaywalkResult<Locator> {
        let selector = match self.selector(SelectorKey::CalendarDay)? {
            Selector::Css(s) => Selector::css(s.replace(DATE_PLACEHOLDER, date)),
            Selector::Xpath(s) => Selector::xpath(s.replace(DATE_PLACEHOLDER, date)),
            Selector::Role { role, name } => {
                Selector::role(role.clone(), name.replace(DATE_PLACEHOLDER, date))
            }
            Selector::Text(t) => Selector::text(t.replace(DATE_PLACEHOLDER, date)),
        };
        Ok(Locator::new(selector))
    }

    /// Overlay `overrides` onto this table, replacing matching keys
    pub fn merge(&mut self, overrides: Self) {
        self.entries.extend(overrides.entries);
    }

    /// Number of configured keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse an override table from YAML (JSON is accepted too)
    pub fn from_yaml(text: &str) -> StaywalkResult<Self> {
        serde_yaml_ng::from_str(text).map_err(|e| StaywalkError::Selectors {
            message: e.to_string(),
        })
    }

    /// Built-in table with the overrides in `path` applied on top
    pub fn load_overrides(path: &Path) -> StaywalkResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| StaywalkError::Selectors {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let overrides = Self::from_yaml(&text)?;
        let mut table = Self::default();
        table.merge(overrides);
        tracing::debug!(path = %path.display(), "applied selector overrides");
        Ok(table)
    }

    /// Render the table as YAML
    pub fn to_yaml(&self) -> StaywalkResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}
