//! Scenario input loaded from a JSON file

use crate::error::{CliError, CliResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use staywalk::{GuestCounts, SearchCriteria};
use std::path::Path;

/// Default location of the test data file
pub const DEFAULT_TEST_DATA_PATH: &str = "config/test_data.json";

/// One booking scenario's input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestData {
    /// Destination typed into the search box
    pub location: String,
    /// Check-in date, `YYYY-MM-DD`
    pub checkin: String,
    /// Check-out date, `YYYY-MM-DD`
    pub checkout: String,
    /// Adult guests
    pub adults: u32,
    /// Child guests
    pub children: u32,
    /// Phone number for the reservation form
    pub phone: String,
}

impl TestData {
    /// Read and validate the file at `path`
    pub fn load(path: &Path) -> CliResult<Self> {
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::test_data(shown.clone(), e.to_string()))?;
        let data: Self =
            serde_json::from_str(&text).map_err(|e| CliError::test_data(shown.clone(), e.to_string()))?;
        data.check().map_err(|message| CliError::test_data(shown, message))?;
        tracing::debug!(path = %path.display(), location = %data.location, "test data loaded");
        Ok(data)
    }

    fn check(&self) -> Result<(), String> {
        if self.location.trim().is_empty() {
            return Err("location must not be empty".to_string());
        }
        let checkin = parse_date("checkin", &self.checkin)?;
        let checkout = parse_date("checkout", &self.checkout)?;
        if checkout <= checkin {
            return Err(format!(
                "checkout {} must be after checkin {}",
                self.checkout, self.checkin
            ));
        }
        if self.adults == 0 {
            return Err("at least one adult is required".to_string());
        }
        Ok(())
    }

    /// Guest counts requested
    #[must_use]
    pub const fn guests(&self) -> GuestCounts {
        GuestCounts::new(self.adults, self.children)
    }

    /// Search criteria for the search page
    #[must_use]
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            location: self.location.clone(),
            checkin: self.checkin.clone(),
            checkout: self.checkout.clone(),
            guests: self.guests(),
        }
    }
}

fn parse_date(name: &str, text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| format!("{name} '{text}' is not a valid YYYY-MM-DD date: {e}"))
}
