//! Result artifacts written during a run

use crate::error::{CliError, CliResult};
use serde::Serialize;
use staywalk::PageDriver;
use std::path::{Path, PathBuf};

/// Best listing record file name
pub const BEST_LISTING_FILE: &str = "best_listing.json";
/// Reservation record file name
pub const RESERVATION_FILE: &str = "post_reservation_details.json";

/// Writes JSON records and failure screenshots
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    reports_dir: PathBuf,
}

impl ArtifactWriter {
    /// Writer targeting `output_dir` for records and `reports_dir` for screenshots
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            reports_dir: reports_dir.into(),
        }
    }

    /// Directory for JSON records
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the failure screenshot for `scenario` goes
    #[must_use]
    pub fn screenshot_path(&self, scenario: &str) -> PathBuf {
        self.reports_dir
            .join("screenshots")
            .join(format!("{scenario}.png"))
    }

    /// Pretty-print `value` to `<output>/<name>`
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> CliResult<PathBuf> {
        let path = self.output_dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        write_file(&path, json.as_bytes())?;
        tracing::info!(path = %path.display(), "artifact written");
        Ok(path)
    }

    /// Store PNG bytes as the failure screenshot for `scenario`
    pub fn save_screenshot(&self, scenario: &str, png: &[u8]) -> CliResult<PathBuf> {
        let path = self.screenshot_path(scenario);
        write_file(&path, png)?;
        Ok(path)
    }

    /// Capture the current page after a failure. Never fails the caller.
    pub async fn capture_failure<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        scenario: &str,
    ) -> Option<PathBuf> {
        let png = match driver.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!(error = %e, "could not take failure screenshot");
                return None;
            }
        };
        match self.save_screenshot(scenario, &png) {
            Ok(path) => {
                tracing::error!(path = %path.display(), scenario, "failure screenshot saved");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not save failure screenshot");
                None
            }
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CliError::artifact(parent.display().to_string(), e.to_string()))?;
    }
    std::fs::write(path, bytes)
        .map_err(|e| CliError::artifact(path.display().to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use staywalk::{GuestCounts, MockDriver};
    use tempfile::TempDir;

    #[test]
    fn test_write_json_creates_directory() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("temp"), dir.path().join("reports"));

        let path = writer
            .write_json(RESERVATION_FILE, &GuestCounts::new(2, 1))
            .unwrap();
        assert_eq!(path, dir.path().join("temp").join(RESERVATION_FILE));

        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("\"adults\": 2"));
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_screenshot_path_layout() {
        let writer = ArtifactWriter::new("temp", "reports");
        assert_eq!(
            writer.screenshot_path("booking"),
            PathBuf::from("reports/screenshots/booking.png")
        );
    }

    #[tokio::test]
    async fn test_capture_failure_writes_png() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path(), dir.path().join("reports"));
        let driver = MockDriver::new();

        let path = writer.capture_failure(&driver, "booking").await.unwrap();
        assert!(path.ends_with("screenshots/booking.png"));
        assert!(path.exists());
    }
}
