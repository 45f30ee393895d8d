//! Booking scenario runner: search, pick the best listing, reserve

use crate::artifacts::{ArtifactWriter, BEST_LISTING_FILE, RESERVATION_FILE};
use crate::error::{CliError, CliResult};
use crate::test_data::TestData;
use serde::Serialize;
use staywalk::{
    Listing, ListingScanner, PageContext, PageDriver, ReservationPage, ReservationResult,
    RetryPolicy, SearchPage, SelectorTable, SuiteConfig, Timing,
};
use std::path::PathBuf;

/// Default scenario name
pub const DEFAULT_SCENARIO: &str = "booking_search_reserve";

/// What a successful run produced
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Listing chosen across all result pages
    pub best: Listing,
    /// Reservation form as completed
    pub reservation: ReservationResult,
    /// Where the listing record was written
    pub best_listing_path: PathBuf,
    /// Where the reservation record was written
    pub reservation_path: PathBuf,
}

/// Runs the scenario against any [`PageDriver`]
#[derive(Debug)]
pub struct ScenarioRunner {
    suite: SuiteConfig,
    selectors: SelectorTable,
    data: TestData,
    artifacts: ArtifactWriter,
    scenario: String,
    timing: Timing,
    policy: Option<RetryPolicy>,
}

impl ScenarioRunner {
    /// Runner with timing derived from `suite`
    #[must_use]
    pub fn new(
        suite: SuiteConfig,
        selectors: SelectorTable,
        data: TestData,
        artifacts: ArtifactWriter,
    ) -> Self {
        let timing = suite.timing();
        Self {
            suite,
            selectors,
            data,
            artifacts,
            scenario: DEFAULT_SCENARIO.to_string(),
            timing,
            policy: None,
        }
    }

    /// Name used for the failure screenshot
    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// Replace page timing
    #[must_use]
    pub const fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Replace the retry policy for every page
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Scenario name
    #[must_use]
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Run the scenario, capturing a screenshot if any step fails
    pub async fn run<D: PageDriver + ?Sized>(&self, driver: &mut D) -> CliResult<ScenarioReport> {
        tracing::info!(
            scenario = %self.scenario,
            base_url = %self.suite.base_url,
            location = %self.data.location,
            "scenario started"
        );
        match self.drive(driver).await {
            Ok(report) => {
                tracing::info!(scenario = %self.scenario, "scenario passed");
                Ok(report)
            }
            Err(e) => {
                tracing::error!(scenario = %self.scenario, error = %e, "scenario failed");
                let _ = self.artifacts.capture_failure(&*driver, &self.scenario).await;
                Err(e)
            }
        }
    }

    async fn drive<D: PageDriver + ?Sized>(&self, driver: &mut D) -> CliResult<ScenarioReport> {
        let criteria = self.data.criteria();

        let mut search = SearchPage::new(self.context(driver));
        search.open(&self.suite.base_url).await?;
        search.submit(&criteria).await?;
        search.validate(&criteria).await?;

        let best = ListingScanner::new(self.context(driver))
            .scan_all_pages()
            .await?;
        if best.price == 0 {
            return Err(CliError::assertion(format!(
                "best listing {} has no price",
                best.url
            )));
        }
        let best_listing_path = self.artifacts.write_json(BEST_LISTING_FILE, &best)?;

        let reservation = ReservationPage::new(self.context(driver))
            .reserve(&self.data.phone, criteria.guests)
            .await?;
        let reservation_path = self.artifacts.write_json(RESERVATION_FILE, &reservation)?;
        self.check_reservation(&reservation)?;

        Ok(ScenarioReport {
            best,
            reservation,
            best_listing_path,
            reservation_path,
        })
    }

    fn context<'a, D: PageDriver + ?Sized>(&'a self, driver: &'a mut D) -> PageContext<'a, D> {
        let ctx = PageContext::new(driver, &self.selectors, self.timing);
        match &self.policy {
            Some(policy) => ctx.with_policy(policy.clone()),
            None => ctx,
        }
    }

    fn check_reservation(&self, reservation: &ReservationResult) -> CliResult<()> {
        let expected = self.data.guests();
        if reservation.guest_counts != expected {
            return Err(CliError::assertion(format!(
                "reservation shows {} but {} were requested",
                reservation.guest_counts, expected
            )));
        }
        let host = self.suite.base_host().ok_or_else(|| {
            CliError::config(format!("base URL {} has no host", self.suite.base_url))
        })?;
        if !reservation.url.contains(&host) {
            return Err(CliError::assertion(format!(
                "reservation ended on {} which is not on {host}",
                reservation.url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use staywalk::{MockDom, MockDriver, MockEffect, MockElement, SelectorKey, StaywalkError};
    use tempfile::TempDir;

    const RESULTS_URL: &str =
        "https://www.airbnb.com/s/Rome/homes?checkin=2025-06-01&checkout=2025-06-05&adults=2&children=0";
    const LISTING_URL: &str = "https://www.airbnb.com/rooms/7";

    fn data() -> TestData {
        TestData {
            location: "Rome".to_string(),
            checkin: "2025-06-01".to_string(),
            checkout: "2025-06-05".to_string(),
            adults: 2,
            children: 0,
            phone: "+390612345678".to_string(),
        }
    }

    fn site(table: &SelectorTable, guests_text: &str, final_url: &str) -> MockDriver {
        let loc = |k| table.locator(k).unwrap();

        let mut home = MockDom::new();
        for key in [
            SelectorKey::DestinationInput,
            SelectorKey::CheckinOpener,
            SelectorKey::GuestsOpener,
            SelectorKey::AdultsIncrement,
            SelectorKey::ChildrenIncrement,
        ] {
            home.add(&loc(key), MockElement::new());
        }
        home.add(&table.calendar_day("2025-06-01").unwrap(), MockElement::new());
        home.add(&table.calendar_day("2025-06-05").unwrap(), MockElement::new());
        home.add(
            &loc(SelectorKey::SearchButton),
            MockElement::new()
                .on_click(MockEffect::SetUrl(RESULTS_URL.to_string()))
                .on_click(MockEffect::NextFrame),
        );

        let cards = loc(SelectorKey::ListingCards);
        let mut results = MockDom::new()
            .with(&loc(SelectorKey::LocationSummary), MockElement::with_text("Rome"))
            .with(&loc(SelectorKey::GuestsSummary), MockElement::with_text("2 guests"));
        for (i, (rating, price, href)) in [("4.7 (10)", "$80", "/rooms/6"), ("4.95 (3)", "$95", "/rooms/7")]
            .into_iter()
            .enumerate()
        {
            let card = cards.nth(i);
            results.add(&cards, MockElement::with_text(format!("Stay {i}")));
            results.add(
                &table.within(&card, SelectorKey::ListingRating).unwrap(),
                MockElement::with_text(rating),
            );
            results.add(
                &table.within(&card, SelectorKey::ListingPrice).unwrap(),
                MockElement::with_text(price),
            );
            results.add(
                &table.within(&card, SelectorKey::ListingAnchor).unwrap(),
                MockElement::new().attr("href", href),
            );
        }

        let listing = MockDom::new()
            .with(
                &loc(SelectorKey::ReserveButton),
                MockElement::new()
                    .on_click(MockEffect::Show(
                        loc(SelectorKey::ReservationGuests).to_string(),
                        MockElement::with_text(guests_text),
                    ))
                    .on_click(MockEffect::Show(
                        loc(SelectorKey::ReservationDates).to_string(),
                        MockElement::with_text("Jun 1 - Jun 5"),
                    )),
            )
            .with(
                &loc(SelectorKey::FinalContinue),
                MockElement::new().on_click(MockEffect::SetUrl(final_url.to_string())),
            );

        MockDriver::new()
            .with_dom(home)
            .with_frame(results)
            .with_route(LISTING_URL, listing)
            .with_screenshot(vec![0x89, b'P', b'N', b'G'])
    }

    fn runner(dir: &TempDir) -> ScenarioRunner {
        ScenarioRunner::new(
            SuiteConfig::default(),
            SelectorTable::default(),
            data(),
            ArtifactWriter::new(dir.path().join("temp"), dir.path().join("reports")),
        )
        .with_timing(Timing::instant())
        .with_policy(RetryPolicy::immediate().with_max_attempts(2))
    }

    #[tokio::test]
    async fn test_successful_run_writes_both_records() {
        let dir = TempDir::new().unwrap();
        let table = SelectorTable::default();
        let mut driver = site(&table, "2 adults", "https://www.airbnb.com/book/stays/7");

        let report = runner(&dir).run(&mut driver).await.unwrap();
        assert_eq!(report.best.url, LISTING_URL);
        assert_eq!(report.best.price, 95);
        assert_eq!(report.reservation.checkin, "Jun 1");
        assert_eq!(report.reservation.checkout, "Jun 5");

        let best: Listing =
            serde_json::from_str(&std::fs::read_to_string(&report.best_listing_path).unwrap())
                .unwrap();
        assert_eq!(best, report.best);
        assert!(report.reservation_path.ends_with(RESERVATION_FILE));
        assert!(!dir.path().join("reports").exists());
    }

    #[tokio::test]
    async fn test_guest_mismatch_fails_and_screenshots() {
        let dir = TempDir::new().unwrap();
        let table = SelectorTable::default();
        let mut driver = site(&table, "3 adults", "https://www.airbnb.com/book/stays/7");

        let err = runner(&dir).run(&mut driver).await.unwrap_err();
        assert!(matches!(
            err,
            CliError::Staywalk(StaywalkError::ValidationFailed { .. })
        ));
        assert_eq!(err.exit_code(), 1);

        let shot = dir
            .path()
            .join("reports/screenshots")
            .join(format!("{DEFAULT_SCENARIO}.png"));
        assert_eq!(std::fs::read(shot).unwrap(), vec![0x89, b'P', b'N', b'G']);
        assert!(dir.path().join("temp").join(BEST_LISTING_FILE).exists());
        assert!(!dir.path().join("temp").join(RESERVATION_FILE).exists());
    }

    #[tokio::test]
    async fn test_reservation_off_site_is_assertion_failure() {
        let dir = TempDir::new().unwrap();
        let table = SelectorTable::default();
        let mut driver = site(&table, "2 adults", "https://payments.example.net/checkout");

        let err = runner(&dir)
            .with_scenario("off_site")
            .run(&mut driver)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Assertion { .. }));
        assert!(dir.path().join("temp").join(RESERVATION_FILE).exists());
        assert!(dir.path().join("reports/screenshots/off_site.png").exists());
    }
}
