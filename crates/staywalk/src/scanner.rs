//! Listing scanner: walks paginated results and picks the best listing.
//!
//! ```text
//! SCANNING_PAGE ──(next present & enabled)──► SCANNING_PAGE
//!       │
//!       └──(no next)──► DONE ──► SELECTING ──► NAVIGATED
//! ```

use crate::driver::PageDriver;
use crate::listing::{parse_price, parse_rating, resolve_listing_url, select_best, Listing};
use crate::locator::Locator;
use crate::page_object::{PageContext, PageObject};
use crate::result::{StaywalkError, StaywalkResult};
use crate::selectors::SelectorKey;
use crate::wait::WaitState;
use url::Url;

/// Upper bound on result pages walked in one scan
pub const DEFAULT_MAX_PAGES: usize = 50;

/// Everything one scan observed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Listings in discovery order
    pub listings: Vec<Listing>,
    /// Result pages walked
    pub pages: usize,
    /// Cards skipped because extraction failed
    pub skipped: usize,
}

/// Why a card was skipped
#[derive(Debug)]
enum CardSkip {
    Rating(String),
    Price(String),
    MissingHref,
    Url(StaywalkError),
    Driver(StaywalkError),
}

impl std::fmt::Display for CardSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rating(text) => write!(f, "unparseable rating '{text}'"),
            Self::Price(text) => write!(f, "unparseable price '{text}'"),
            Self::MissingHref => f.write_str("no href on first anchor"),
            Self::Url(e) | Self::Driver(e) => write!(f, "{e}"),
        }
    }
}

impl From<StaywalkError> for CardSkip {
    fn from(e: StaywalkError) -> Self {
        Self::Driver(e)
    }
}

/// Search results page object
pub struct ListingScanner<'a, D: PageDriver + ?Sized> {
    ctx: PageContext<'a, D>,
    max_pages: usize,
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for ListingScanner<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingScanner")
            .field("ctx", &self.ctx)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl<D: PageDriver + ?Sized> PageObject for ListingScanner<'_, D> {
    fn page_name(&self) -> &'static str {
        "search results"
    }

    fn ready_marker(&self) -> Option<SelectorKey> {
        Some(SelectorKey::ListingCards)
    }
}

impl<'a, D: PageDriver + ?Sized> ListingScanner<'a, D> {
    /// Scanner over the page currently loaded in `ctx`
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self {
            ctx,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Stop after `max_pages` result pages
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Walk every result page and collect the usable listings
    pub async fn collect_listings(&mut self) -> StaywalkResult<ScanReport> {
        let cards = self.ctx.locator(SelectorKey::ListingCards)?;
        let next = self.ctx.locator(SelectorKey::NextPage)?.first();
        let mut report = ScanReport::default();

        loop {
            self.ctx.settle().await;
            report.pages += 1;
            let count = self.ctx.driver_ref().count(&cards).await?;
            tracing::info!(page = report.pages, cards = count, "scanning result page");

            for index in 0..count {
                let card = cards.nth(index);
                match self.extract(&card).await {
                    Ok((rating, price, url, title)) => {
                        let listing = Listing {
                            rank: report.listings.len() + 1,
                            index,
                            rating,
                            price,
                            url,
                            title,
                        };
                        tracing::debug!(
                            rank = listing.rank,
                            rating = listing.rating,
                            price = listing.price,
                            "recorded listing"
                        );
                        report.listings.push(listing);
                    }
                    Err(reason) => {
                        report.skipped += 1;
                        tracing::warn!(page = report.pages, index, %reason, "skipping card");
                    }
                }
            }

            if !self.has_next_page(&next).await {
                break;
            }
            if report.pages >= self.max_pages {
                tracing::warn!(pages = report.pages, "page limit reached, stopping scan");
                break;
            }
            self.ctx.click_locator(next.clone()).await?;
        }

        tracing::info!(
            pages = report.pages,
            listings = report.listings.len(),
            skipped = report.skipped,
            "scan finished"
        );
        Ok(report)
    }

    /// Scan, select the best listing and navigate to it
    ///
    /// # Errors
    ///
    /// [`StaywalkError::NoListingsFound`] when no card yielded a listing.
    pub async fn scan_all_pages(&mut self) -> StaywalkResult<Listing> {
        let report = self.collect_listings().await?;
        let best = select_best(&report.listings)
            .cloned()
            .ok_or(StaywalkError::NoListingsFound {
                pages: report.pages,
            })?;

        let absolute = Url::parse(&best.url)
            .ok()
            .filter(|u| u.has_host() && matches!(u.scheme(), "http" | "https"));
        if absolute.is_none() {
            return Err(StaywalkError::InvalidListingUrl { url: best.url });
        }

        tracing::info!(
            rank = best.rank,
            rating = best.rating,
            price = best.price,
            url = %best.url,
            "selected best listing"
        );
        self.ctx.driver().navigate(&best.url).await?;
        self.ctx.settle().await;
        Ok(best)
    }

    async fn has_next_page(&self, next: &Locator) -> bool {
        let driver = self.ctx.driver_ref();
        driver.exists(next).await.unwrap_or(false) && driver.is_enabled(next).await.unwrap_or(false)
    }

    async fn extract(&self, card: &Locator) -> Result<(f64, u64, String, String), CardSkip> {
        let selectors = self.ctx.selectors();
        let rating_text = self
            .card_text(&selectors.within(card, SelectorKey::ListingRating)?.first())
            .await?;
        let price_text = self
            .card_text(&selectors.within(card, SelectorKey::ListingPrice)?.first())
            .await?;

        let rating = parse_rating(&rating_text).ok_or(CardSkip::Rating(rating_text))?;
        let price = parse_price(&price_text).ok_or(CardSkip::Price(price_text))?;

        let driver = self.ctx.driver_ref();
        let anchor = selectors.within(card, SelectorKey::ListingAnchor)?.first();
        let href = if driver.exists(&anchor).await? {
            driver.attribute(&anchor, "href").await?
        } else {
            None
        };
        let href = href
            .filter(|h| !h.trim().is_empty())
            .ok_or(CardSkip::MissingHref)?;

        let current = driver.current_url().await?;
        let url = resolve_listing_url(&current, &href).map_err(CardSkip::Url)?;
        let title = driver.inner_text(card).await?.trim().to_string();

        Ok((rating, price, url, title))
    }

    async fn card_text(&self, locator: &Locator) -> StaywalkResult<String> {
        let driver = self.ctx.driver_ref();
        driver
            .wait_for(locator, WaitState::Attached, self.ctx.timing().wait_timeout)
            .await?;
        driver.inner_text(locator).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::Timing;
    use crate::driver::{MockDom, MockDriver, MockEffect, MockElement};
    use crate::selectors::SelectorTable;

    const RESULTS_URL: &str = "https://www.airbnb.com/s/Tel-Aviv/homes?adults=2&children=1";

    struct Card<'s> {
        rating: &'s str,
        price: &'s str,
        href: Option<&'s str>,
    }

    fn card(rating: &'static str, price: &'static str, href: &'static str) -> Card<'static> {
        Card {
            rating,
            price,
            href: Some(href),
        }
    }

    fn page(table: &SelectorTable, cards: &[Card<'_>], has_next: bool) -> MockDom {
        let card_loc = table.locator(SelectorKey::ListingCards).unwrap();
        let mut dom = MockDom::new();
        for (i, c) in cards.iter().enumerate() {
            let this = card_loc.nth(i);
            dom.add(&card_loc, MockElement::with_text(format!("  Card {i}\n")));
            dom.add(
                &table.within(&this, SelectorKey::ListingRating).unwrap(),
                MockElement::with_text(c.rating),
            );
            dom.add(
                &table.within(&this, SelectorKey::ListingPrice).unwrap(),
                MockElement::with_text(c.price),
            );
            if let Some(href) = c.href {
                dom.add(
                    &table.within(&this, SelectorKey::ListingAnchor).unwrap(),
                    MockElement::new().attr("href", href),
                );
            }
        }
        if has_next {
            dom.add(
                &table.locator(SelectorKey::NextPage).unwrap(),
                MockElement::new().on_click(MockEffect::NextFrame),
            );
        }
        dom
    }

    #[tokio::test]
    async fn test_selects_highest_rating_then_lowest_price() {
        let table = SelectorTable::default();
        let mut driver = MockDriver::new().with_url(RESULTS_URL).with_dom(page(
            &table,
            &[
                card("4.8 (10)", "$120 per night", "/rooms/1"),
                card("4.9 (22)", "$200 per night", "/rooms/2"),
                card("4.9 (31)", "$150 per night", "/rooms/3"),
            ],
            false,
        ));

        let best = ListingScanner::new(PageContext::new(&mut driver, &table, Timing::instant()))
            .scan_all_pages()
            .await
            .unwrap();

        assert_eq!(best.rank, 3);
        assert_eq!(best.rating, 4.9);
        assert_eq!(best.price, 150);
        assert_eq!(best.url, "https://www.airbnb.com/rooms/3");
        assert_eq!(best.title, "Card 2");
        assert_eq!(driver.current_url, "https://www.airbnb.com/rooms/3");
    }

    #[tokio::test]
    async fn test_malformed_card_is_skipped() {
        let table = SelectorTable::default();
        let mut driver = MockDriver::new().with_url(RESULTS_URL).with_dom(page(
            &table,
            &[
                card("New", "$90 per night", "/rooms/1"),
                Card {
                    rating: "5.0 (3)",
                    price: "$80 per night",
                    href: None,
                },
                card("4.7 (9)", "per night", "/rooms/3"),
                card("4.5 (40)", "$300 per night", "/rooms/4"),
            ],
            false,
        ));

        let mut scanner =
            ListingScanner::new(PageContext::new(&mut driver, &table, Timing::instant()));
        let report = scanner.collect_listings().await.unwrap();
        assert_eq!(report.skipped, 3);
        assert_eq!(report.listings.len(), 1);
        assert_eq!(report.listings[0].rank, 1);
        assert_eq!(report.listings[0].index, 3);
    }

    #[tokio::test]
    async fn test_walks_pagination() {
        let table = SelectorTable::default();
        let mut driver = MockDriver::new()
            .with_url(RESULTS_URL)
            .with_dom(page(&table, &[card("4.6 (5)", "$100", "/rooms/1")], true))
            .with_frame(page(&table, &[card("4.95 (7)", "$400", "/rooms/2")], true))
            .with_frame(page(&table, &[card("4.2 (1)", "$50", "/rooms/3")], false));

        let mut scanner =
            ListingScanner::new(PageContext::new(&mut driver, &table, Timing::instant()));
        let report = scanner.collect_listings().await.unwrap();
        assert_eq!(report.pages, 3);
        let ranks: Vec<_> = report.listings.iter().map(|l| l.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);

        let best = select_best(&report.listings).unwrap();
        assert_eq!(best.url, "https://www.airbnb.com/rooms/2");
        assert_eq!(driver.calls("click:"), 2);
    }

    #[tokio::test]
    async fn test_flaky_next_click_is_retried() {
        let table = SelectorTable::default();
        let mut first = page(&table, &[card("4.6 (5)", "$100", "/rooms/1")], false);
        first.add(
            &table.locator(SelectorKey::NextPage).unwrap(),
            MockElement::new()
                .failing_clicks(1)
                .on_click(MockEffect::NextFrame),
        );
        let mut driver = MockDriver::new()
            .with_url(RESULTS_URL)
            .with_dom(first)
            .with_frame(page(&table, &[card("4.9 (2)", "$80", "/rooms/2")], false));

        let mut scanner =
            ListingScanner::new(PageContext::new(&mut driver, &table, Timing::instant()));
        let report = scanner.collect_listings().await.unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.listings.len(), 2);
        assert_eq!(driver.calls("click:"), 2);
    }

    #[tokio::test]
    async fn test_disabled_next_ends_scan() {
        let table = SelectorTable::default();
        let mut dom = page(&table, &[card("4.6 (5)", "$100", "/rooms/1")], false);
        dom.add(
            &table.locator(SelectorKey::NextPage).unwrap(),
            MockElement::new().disabled(),
        );
        let mut driver = MockDriver::new().with_url(RESULTS_URL).with_dom(dom);
        let mut scanner =
            ListingScanner::new(PageContext::new(&mut driver, &table, Timing::instant()));
        assert_eq!(scanner.collect_listings().await.unwrap().pages, 1);
        assert!(!driver.was_called("click:"));
    }

    #[tokio::test]
    async fn test_page_limit() {
        let table = SelectorTable::default();
        let mut driver = MockDriver::new()
            .with_url(RESULTS_URL)
            .with_dom(page(&table, &[], true))
            .with_frame(page(&table, &[], true))
            .with_frame(page(&table, &[], true));
        let mut scanner =
            ListingScanner::new(PageContext::new(&mut driver, &table, Timing::instant()))
                .with_max_pages(2);
        assert_eq!(scanner.collect_listings().await.unwrap().pages, 2);
    }

    #[tokio::test]
    async fn test_no_listings_found() {
        let table = SelectorTable::default();
        let mut driver = MockDriver::new()
            .with_url(RESULTS_URL)
            .with_dom(page(&table, &[card("New", "$1", "/rooms/1")], false));

        let err = ListingScanner::new(PageContext::new(&mut driver, &table, Timing::instant()))
            .scan_all_pages()
            .await
            .unwrap_err();
        assert!(matches!(err, StaywalkError::NoListingsFound { pages: 1 }));
        assert!(!driver.was_called("navigate"));
    }

    #[test]
    fn test_page_object_identity() {
        let table = SelectorTable::default();
        let mut driver = MockDriver::new();
        let scanner = ListingScanner::new(PageContext::new(&mut driver, &table, Timing::instant()));
        assert_eq!(scanner.page_name(), "search results");
        assert_eq!(scanner.ready_marker(), Some(SelectorKey::ListingCards));
    }
}
