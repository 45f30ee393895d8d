//! Reservation page object: walks the multi-step reservation form.

use crate::driver::PageDriver;
use crate::page_object::{PageContext, PageObject};
use crate::result::{StaywalkError, StaywalkResult};
use crate::search::GuestCounts;
use crate::selectors::SelectorKey;
use serde::{Deserialize, Serialize};

/// What the reservation form showed after it was completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationResult {
    /// Guests as read back from the form
    pub guest_counts: GuestCounts,
    /// Check-in as displayed
    pub checkin: String,
    /// Check-out as displayed
    pub checkout: String,
    /// Page URL once the form was confirmed
    pub url: String,
}

/// Listing page with the reservation panel
pub struct ReservationPage<'a, D: PageDriver + ?Sized> {
    ctx: PageContext<'a, D>,
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for ReservationPage<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationPage").field("ctx", &self.ctx).finish()
    }
}

impl<D: PageDriver + ?Sized> PageObject for ReservationPage<'_, D> {
    fn page_name(&self) -> &'static str {
        "reservation"
    }

    fn ready_marker(&self) -> Option<SelectorKey> {
        Some(SelectorKey::ReserveButton)
    }
}

impl<'a, D: PageDriver + ?Sized> ReservationPage<'a, D> {
    /// Reservation page over `ctx`
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self { ctx }
    }

    /// Complete the reservation form.
    ///
    /// The phone number is typed only when the field is shown and empty.
    ///
    /// # Errors
    ///
    /// [`StaywalkError::ValidationFailed`] when the guests shown on the form
    /// differ from `expected_guests`; [`StaywalkError::InteractionFailed`]
    /// when a required control never responds.
    pub async fn reserve(
        &mut self,
        phone: &str,
        expected_guests: GuestCounts,
    ) -> StaywalkResult<ReservationResult> {
        self.ctx.settle().await;
        self.dismiss_popup().await;

        self.ctx
            .click_guarded(SelectorKey::ReserveButton, SelectorKey::ReservationGuests)
            .await?;
        self.ctx.settle().await;

        let guest_text = self.ctx.read_text(SelectorKey::ReservationGuests).await?;
        let dates_text = self.ctx.read_text(SelectorKey::ReservationDates).await?;
        let guest_counts = parse_guest_counts(&guest_text)?;
        let (checkin, checkout) = parse_date_range(&dates_text);
        tracing::info!(
            guests = %guest_counts,
            checkin = %checkin,
            checkout = %checkout,
            "reservation summary"
        );

        if guest_counts != expected_guests {
            return Err(StaywalkError::validation(
                "reservation guests",
                expected_guests.to_string(),
                guest_counts.to_string(),
            ));
        }

        if self.click_if_ready(SelectorKey::ReservationNext).await? {
            self.ctx.settle().await;
        }
        self.fill_phone_if_empty(phone).await?;
        self.click_if_ready(SelectorKey::FinalContinue).await?;

        let url = self.ctx.driver_ref().current_url().await?;
        tracing::info!(url = %url, "reservation form completed");
        Ok(ReservationResult {
            guest_counts,
            checkin,
            checkout,
            url,
        })
    }

    /// Close the interstitial popup when it is showing
    async fn dismiss_popup(&mut self) {
        if !self.ctx.is_visible(SelectorKey::PopupClose).await {
            tracing::debug!("no popup to dismiss");
            return;
        }
        let Ok(close) = self.ctx.locator(SelectorKey::PopupClose) else {
            return;
        };
        match self.ctx.driver().click(&close.first()).await {
            Ok(()) => {
                tracing::info!("dismissed popup");
                self.ctx.settle().await;
            }
            Err(e) => tracing::debug!(error = %e, "popup vanished before it could be closed"),
        }
    }

    async fn click_if_ready(&mut self, key: SelectorKey) -> StaywalkResult<bool> {
        if !(self.ctx.is_visible(key).await && self.ctx.is_enabled(key).await) {
            tracing::debug!(control = ?key, "control not shown, skipping");
            return Ok(false);
        }
        let target = self.ctx.locator(key)?.first();
        self.ctx.click_locator(target).await?;
        Ok(true)
    }

    async fn fill_phone_if_empty(&mut self, phone: &str) -> StaywalkResult<()> {
        if !self.ctx.is_visible(SelectorKey::PhoneInput).await {
            tracing::debug!("phone field not shown");
            return Ok(());
        }
        let input = self.ctx.locator(SelectorKey::PhoneInput)?.first();
        let current = self.ctx.driver_ref().input_value(&input).await?;
        if current.trim().is_empty() {
            self.ctx.fill(SelectorKey::PhoneInput, phone).await?;
            tracing::info!("filled phone number");
            self.ctx.settle().await;
        } else {
            tracing::debug!("phone number already present");
        }
        Ok(())
    }
}

/// Guests from text like `"2 adults, 1 child"`.
///
/// Each count is the number right before the word "adult" or "child";
/// a missing word counts as zero.
pub fn parse_guest_counts(text: &str) -> StaywalkResult<GuestCounts> {
    let lower = text.to_lowercase();
    let count_before = |word: &str| -> StaywalkResult<u32> {
        let Some(pos) = lower.find(word) else {
            return Ok(0);
        };
        lower[..pos]
            .split_whitespace()
            .last()
            .and_then(|token| token.trim_matches(|c: char| !c.is_ascii_digit()).parse().ok())
            .ok_or_else(|| {
                StaywalkError::validation(
                    format!("{word} count"),
                    format!("a number before '{word}'"),
                    text,
                )
            })
    };
    Ok(GuestCounts::new(count_before("adult")?, count_before("child")?))
}

/// Split a displayed date range like `"Jun 1 – 5"` into its two ends.
///
/// Without a range separator the whole text is used for both.
#[must_use]
pub fn parse_date_range(text: &str) -> (String, String) {
    let text = text.trim();
    for sep in ['–', '—'] {
        if let Some((a, b)) = text.split_once(sep) {
            return (a.trim().to_string(), b.trim().to_string());
        }
    }
    if let Some((a, b)) = text.split_once(" - ") {
        return (a.trim().to_string(), b.trim().to_string());
    }
    (text.to_string(), text.to_string())
}
