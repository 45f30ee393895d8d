//! Listing records and best-listing selection.

use crate::result::{StaywalkError, StaywalkResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// One result card as scraped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// 1-based position in discovery order across all pages
    pub rank: usize,
    /// Position of the card on its page
    pub index: usize,
    /// Star rating
    pub rating: f64,
    /// Price in whole currency units
    pub price: u64,
    /// Absolute URL of the listing page
    pub url: String,
    /// Card title
    pub title: String,
}

/// Price as an integer after removing every non-ASCII-digit character.
///
/// `"$1,234 per night"` is `1234`. Text without digits yields `None`.
/// Decimal separators are removed too, so `"$99.50"` reads as `9950`.
#[must_use]
pub fn parse_price(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Rating from the leading whitespace-separated token.
///
/// `"4.87 (123)"` is `4.87`. A non-numeric or non-finite token yields `None`.
#[must_use]
pub fn parse_rating(text: &str) -> Option<f64> {
    let token = text.split_whitespace().next()?;
    let token = token.trim_end_matches(|c: char| !c.is_ascii_digit());
    token.parse::<f64>().ok().filter(|r| r.is_finite())
}

/// Resolve a card's `href` against the page it was found on.
///
/// Absolute hrefs pass through. Relative ones are prefixed with everything
/// before `/s/` in the current URL, or the current URL's origin when there
/// is no `/s/` segment.
pub fn resolve_listing_url(current_url: &str, href: &str) -> StaywalkResult<String> {
    let href = href.trim();
    if href.is_empty() {
        return Err(StaywalkError::InvalidListingUrl {
            url: String::new(),
        });
    }
    if let Ok(absolute) = Url::parse(href) {
        return ensure_http(absolute);
    }

    let prefix = match current_url.split_once("/s/") {
        Some((prefix, _)) => prefix.to_string(),
        None => Url::parse(current_url)
            .map(|u| u.origin().ascii_serialization())
            .map_err(|_| StaywalkError::InvalidListingUrl {
                url: format!("{current_url} + {href}"),
            })?,
    };
    let joined = if href.starts_with('/') {
        format!("{prefix}{href}")
    } else {
        format!("{prefix}/{href}")
    };

    let parsed = Url::parse(&joined).map_err(|_| StaywalkError::InvalidListingUrl {
        url: joined.clone(),
    })?;
    ensure_http(parsed)
}

fn ensure_http(url: Url) -> StaywalkResult<String> {
    if matches!(url.scheme(), "http" | "https") && url.has_host() {
        Ok(url.to_string())
    } else {
        Err(StaywalkError::InvalidListingUrl {
            url: url.to_string(),
        })
    }
}

/// Highest rating, then lowest price; the earliest listing wins full ties
#[must_use]
pub fn select_best(listings: &[Listing]) -> Option<&Listing> {
    listings.iter().reduce(|best, candidate| {
        let better = candidate.rating > best.rating
            || (candidate.rating == best.rating && candidate.price < best.price);
        if better {
            candidate
        } else {
            best
        }
    })
}
