//! Search page object: submits a search and validates what the site shows.

use crate::driver::PageDriver;
use crate::page_object::{PageContext, PageObject};
use crate::result::{StaywalkError, StaywalkResult};
use crate::selectors::SelectorKey;
use crate::wait::WaitState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Guests on a booking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestCounts {
    /// Adults
    pub adults: u32,
    /// Children
    pub children: u32,
}

impl GuestCounts {
    /// Create guest counts
    #[must_use]
    pub const fn new(adults: u32, children: u32) -> Self {
        Self { adults, children }
    }

    /// Adults plus children
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.adults + self.children
    }
}

impl std::fmt::Display for GuestCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} adult(s), {} child(ren)", self.adults, self.children)
    }
}

/// What to search for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Destination as typed into the search box
    pub location: String,
    /// Check-in date, `YYYY-MM-DD`
    pub checkin: String,
    /// Check-out date, `YYYY-MM-DD`
    pub checkout: String,
    /// Guests
    pub guests: GuestCounts,
}

/// Landing page with the search form
pub struct SearchPage<'a, D: PageDriver + ?Sized> {
    ctx: PageContext<'a, D>,
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for SearchPage<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchPage").field("ctx", &self.ctx).finish()
    }
}

impl<D: PageDriver + ?Sized> PageObject for SearchPage<'_, D> {
    fn page_name(&self) -> &'static str {
        "search"
    }

    fn ready_marker(&self) -> Option<SelectorKey> {
        Some(SelectorKey::DestinationInput)
    }
}

impl<'a, D: PageDriver + ?Sized> SearchPage<'a, D> {
    /// Search page over `ctx`
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self { ctx }
    }

    /// Navigate to the site root and wait for the search form
    pub async fn open(&mut self, base_url: &str) -> StaywalkResult<()> {
        tracing::info!(url = base_url, "opening search page");
        self.ctx.driver().navigate(base_url).await?;
        self.ctx.wait_until_ready(&*self).await
    }

    /// Fill the search form, submit it and wait for result cards
    pub async fn submit(&mut self, criteria: &SearchCriteria) -> StaywalkResult<()> {
        tracing::info!(
            location = %criteria.location,
            checkin = %criteria.checkin,
            checkout = %criteria.checkout,
            guests = %criteria.guests,
            "submitting search"
        );

        self.ctx.click(SelectorKey::DestinationInput).await?;
        self.ctx
            .fill(SelectorKey::DestinationInput, &criteria.location)
            .await?;
        self.ctx.settle().await;

        self.ctx.click(SelectorKey::CheckinOpener).await?;
        self.ctx.settle().await;
        for date in [&criteria.checkin, &criteria.checkout] {
            let day = self.ctx.selectors().calendar_day(date)?.first();
            self.ctx.click_locator(day).await?;
            self.ctx.settle().await;
        }

        self.ctx.click(SelectorKey::GuestsOpener).await?;
        self.ctx.settle().await;
        for _ in 0..criteria.guests.adults {
            self.ctx.click(SelectorKey::AdultsIncrement).await?;
        }
        self.ctx.settle().await;
        for _ in 0..criteria.guests.children {
            self.ctx.click(SelectorKey::ChildrenIncrement).await?;
        }

        self
            .ctx
            .click_guarded(SelectorKey::SearchButton, SelectorKey::ListingCards)
            .await?;

        let cards = self.ctx.locator(SelectorKey::ListingCards)?.first();
        self.ctx
            .driver_ref()
            .wait_for(&cards, WaitState::Attached, self.ctx.timing().results_timeout)
            .await?;
        tracing::info!(location = %criteria.location, "search results loaded");
        Ok(())
    }

    /// Check the summary texts and URL parameters against `criteria`
    ///
    /// # Errors
    ///
    /// [`StaywalkError::ValidationFailed`] naming the first mismatch.
    pub async fn validate(&mut self, criteria: &SearchCriteria) -> StaywalkResult<()> {
        let location_text = self.ctx.read_text(SelectorKey::LocationSummary).await?;
        if !location_text.trim_end().ends_with(&criteria.location) {
            return Err(StaywalkError::validation(
                "location summary",
                format!("ends with '{}'", criteria.location),
                location_text,
            ));
        }

        let guests_text = self.ctx.read_text(SelectorKey::GuestsSummary).await?;
        let total = criteria.guests.total().to_string();
        if !guests_text.contains(&total) {
            return Err(StaywalkError::validation(
                "guest summary",
                format!("contains '{total}'"),
                guests_text,
            ));
        }

        let current = self.ctx.driver_ref().current_url().await?;
        let params = query_params(&current)?;
        let expected = [
            ("adults", criteria.guests.adults.to_string()),
            ("children", criteria.guests.children.to_string()),
            ("checkin", criteria.checkin.clone()),
            ("checkout", criteria.checkout.clone()),
        ];
        for (name, want) in expected {
            let got = params.get(name).map_or("<missing>", String::as_str);
            if got != want {
                return Err(StaywalkError::validation(
                    format!("url param '{name}'"),
                    want,
                    got,
                ));
            }
        }

        tracing::info!(location = %criteria.location, "search validated");
        Ok(())
    }
}

/// First value of every query parameter
fn query_params(raw: &str) -> StaywalkResult<HashMap<String, String>> {
    let url = Url::parse(raw)
        .map_err(|e| StaywalkError::validation("results url", "an absolute URL", format!("{raw} ({e})")))?;
    let mut params = HashMap::new();
    for (k, v) in url.query_pairs() {
        let _ = params.entry(k.into_owned()).or_insert_with(|| v.into_owned());
    }
    Ok(params)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Timing;
    use crate::driver::{MockDom, MockDriver, MockEffect, MockElement};
    use crate::retry::RetryPolicy;
    use crate::selectors::SelectorTable;

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            location: "Tel Aviv".into(),
            checkin: "2025-06-01".into(),
            checkout: "2025-06-05".into(),
            guests: GuestCounts::new(2, 1),
        }
    }

    const RESULTS_URL: &str = "https://www.airbnb.com/s/Tel-Aviv/homes?adults=2&children=1&checkin=2025-06-01&checkout=2025-06-05";

    fn search_form(table: &SelectorTable) -> MockDom {
        let mut dom = MockDom::new();
        for key in [
            SelectorKey::DestinationInput,
            SelectorKey::CheckinOpener,
            SelectorKey::GuestsOpener,
            SelectorKey::AdultsIncrement,
            SelectorKey::ChildrenIncrement,
        ] {
            dom.add(&table.locator(key).unwrap(), MockElement::new());
        }
        for date in ["2025-06-01", "2025-06-05"] {
            dom.add(&table.calendar_day(date).unwrap(), MockElement::new());
        }
        dom.add(
            &table.locator(SelectorKey::SearchButton).unwrap(),
            MockElement::new()
                .on_click(MockEffect::SetUrl(RESULTS_URL.into()))
                .on_click(MockEffect::Show(
                    table.locator(SelectorKey::ListingCards).unwrap().to_string(),
                    MockElement::new(),
                )),
        );
        dom
    }

    fn results(table: &SelectorTable, location: &str, guests: &str) -> MockDom {
        MockDom::new()
            .with(
                &table.locator(SelectorKey::LocationSummary).unwrap(),
                MockElement::with_text(location),
            )
            .with(
                &table.locator(SelectorKey::GuestsSummary).unwrap(),
                MockElement::with_text(guests),
            )
    }

    mod guest_tests {
        use super::*;

        #[test]
        fn test_total() {
            assert_eq!(GuestCounts::new(2, 1).total(), 3);
            assert_eq!(GuestCounts::default().total(), 0);
        }

        #[test]
        fn test_criteria_json_shape() {
            let json = serde_json::to_value(criteria()).unwrap();
            assert_eq!(json["guests"]["adults"], 2);
            assert_eq!(json["checkin"], "2025-06-01");
        }
    }

    mod submit_tests {
        use super::*;

        #[tokio::test]
        async fn test_open_navigates_and_waits() {
            let table = SelectorTable::default();
            let mut driver = MockDriver::new().with_dom(search_form(&table));
            let mut page = SearchPage::new(PageContext::new(&mut driver, &table, Timing::instant()));
            page.open("https://www.airbnb.com").await.unwrap();
            assert_eq!(driver.history(), ["navigate:https://www.airbnb.com"]);
        }

        #[tokio::test]
        async fn test_steps_run_in_order_with_exact_increments() {
            let table = SelectorTable::default();
            let mut driver = MockDriver::new().with_dom(search_form(&table));
            let mut page = SearchPage::new(
                PageContext::new(&mut driver, &table, Timing::instant())
                    .with_policy(RetryPolicy::immediate()),
            );
            page.submit(&criteria()).await.unwrap();

            let loc = |k| table.locator(k).unwrap().first().to_string();
            let day = |d| table.calendar_day(d).unwrap().first().to_string();
            let expected = vec![
                format!("click:{}", loc(SelectorKey::DestinationInput)),
                format!("fill:{}=Tel Aviv", loc(SelectorKey::DestinationInput)),
                format!("click:{}", loc(SelectorKey::CheckinOpener)),
                format!("click:{}", day("2025-06-01")),
                format!("click:{}", day("2025-06-05")),
                format!("click:{}", loc(SelectorKey::GuestsOpener)),
                format!("click:{}", loc(SelectorKey::AdultsIncrement)),
                format!("click:{}", loc(SelectorKey::AdultsIncrement)),
                format!("click:{}", loc(SelectorKey::ChildrenIncrement)),
                format!("click:{}", loc(SelectorKey::SearchButton)),
            ];
            assert_eq!(driver.history(), expected.as_slice());
            assert_eq!(driver.current_url, RESULTS_URL);
        }

        #[tokio::test]
        async fn test_zero_children_never_touches_stepper() {
            let table = SelectorTable::default();
            let mut driver = MockDriver::new().with_dom(search_form(&table));
            let mut search = criteria();
            search.guests = GuestCounts::new(1, 0);
            SearchPage::new(
                PageContext::new(&mut driver, &table, Timing::instant())
                    .with_policy(RetryPolicy::immediate()),
            )
            .submit(&search)
            .await
            .unwrap();
            let children = table
                .locator(SelectorKey::ChildrenIncrement)
                .unwrap()
                .first()
                .to_string();
            assert_eq!(driver.calls(&format!("click:{children}")), 0);
        }
    }

    mod validate_tests {
        use super::*;

        async fn validate(dom: MockDom, url: &str) -> StaywalkResult<()> {
            let table = SelectorTable::default();
            let mut driver = MockDriver::new().with_url(url).with_dom(dom);
            SearchPage::new(
                PageContext::new(&mut driver, &table, Timing::instant())
                    .with_policy(RetryPolicy::immediate().with_max_attempts(1)),
            )
            .validate(&criteria())
            .await
        }

        #[tokio::test]
        async fn test_matching_results_pass() {
            let table = SelectorTable::default();
            validate(results(&table, "Stays in Tel Aviv", "3 guests"), RESULTS_URL)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_location_mismatch() {
            let table = SelectorTable::default();
            let err = validate(results(&table, "Stays in Haifa", "3 guests"), RESULTS_URL)
                .await
                .unwrap_err();
            match err {
                StaywalkError::ValidationFailed { field, actual, .. } => {
                    assert_eq!(field, "location summary");
                    assert_eq!(actual, "Stays in Haifa");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_guest_total_mismatch() {
            let table = SelectorTable::default();
            let err = validate(results(&table, "Tel Aviv", "2 guests"), RESULTS_URL)
                .await
                .unwrap_err();
            assert!(matches!(err, StaywalkError::ValidationFailed { ref field, .. } if field == "guest summary"));
        }

        #[tokio::test]
        async fn test_url_param_mismatch_and_missing() {
            let table = SelectorTable::default();
            let wrong = RESULTS_URL.replace("children=1", "children=0");
            let err = validate(results(&table, "Tel Aviv", "3 guests"), &wrong)
                .await
                .unwrap_err();
            match err {
                StaywalkError::ValidationFailed {
                    field,
                    expected,
                    actual,
                } => {
                    assert_eq!(field, "url param 'children'");
                    assert_eq!(expected, "1");
                    assert_eq!(actual, "0");
                }
                other => panic!("unexpected error: {other}"),
            }

            let missing = "https://www.airbnb.com/s/Tel-Aviv/homes?adults=2&children=1";
            let err = validate(results(&table, "Tel Aviv", "3 guests"), missing)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("<missing>"));
        }

        #[test]
        fn test_query_params_first_value_wins() {
            let params = query_params("https://x.test/s?a=1&a=2&b=%32").unwrap();
            assert_eq!(params["a"], "1");
            assert_eq!(params["b"], "2");
        }
    }
}
