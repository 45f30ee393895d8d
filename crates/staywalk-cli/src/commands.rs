//! CLI command definitions using clap

use crate::config::{ColorChoice, LogFormat};
use crate::error::CliResult;
use crate::test_data::DEFAULT_TEST_DATA_PATH;
use clap::{Parser, Subcommand, ValueEnum};
use staywalk::{BrowserConfig, SelectorTable, SuiteConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Staywalk: drives the search, listing selection and reservation journey
/// on a booking site in a real browser
#[derive(Parser, Debug)]
#[command(name = "staywalk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the booking scenario
    Run(RunArgs),

    /// Show the resolved suite configuration
    Config(ConfigArgs),

    /// Print the effective selector table as YAML
    Selectors(SelectorsArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Scenario input file
    #[arg(long, env = "STAYWALK_TEST_DATA", default_value = DEFAULT_TEST_DATA_PATH)]
    pub data: PathBuf,

    /// Site root, overriding BASE_URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Settle delay after actions in milliseconds, overriding WAIT_AFTER_ACTION_MS
    #[arg(long)]
    pub wait_ms: Option<u64>,

    /// Suite budget in seconds, overriding SUITE_TIMEOUT_SEC
    #[arg(long)]
    pub suite_timeout: Option<u64>,

    /// Run without a visible window (default)
    #[arg(long, conflicts_with = "headed")]
    pub headless: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium executable
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<String>,

    /// Disable the Chromium sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Directory for JSON result records
    #[arg(long, default_value = "temp")]
    pub output: PathBuf,

    /// Directory for failure screenshots
    #[arg(long, default_value = "reports")]
    pub reports: PathBuf,

    /// YAML or JSON file overriding built-in selectors
    #[arg(long)]
    pub selectors: Option<PathBuf>,

    /// Scenario name used for the failure screenshot
    #[arg(long, default_value = "booking_search_reserve")]
    pub scenario: String,
}

impl RunArgs {
    /// Apply command-line overrides on top of `base`
    pub fn suite_config(&self, base: SuiteConfig) -> CliResult<SuiteConfig> {
        let mut config = match &self.base_url {
            Some(url) => base.with_base_url(url.as_str())?,
            None => base,
        };
        if let Some(ms) = self.wait_ms {
            config = config.with_wait_after_action(Duration::from_millis(ms));
        }
        if let Some(secs) = self.suite_timeout {
            config = config.with_suite_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Browser launch settings
    #[must_use]
    pub fn browser_config(&self) -> BrowserConfig {
        let mut config = BrowserConfig::default().with_headless(!self.headed);
        if let Some(path) = &self.chromium_path {
            config = config.with_chromium_path(path.as_str());
        }
        if self.no_sandbox {
            config = config.with_no_sandbox();
        }
        config
    }

    /// Built-in selectors with any overrides file merged on top
    pub fn selector_table(&self) -> CliResult<SelectorTable> {
        load_selectors(self.selectors.as_ref())
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the selectors command
#[derive(Parser, Debug)]
pub struct SelectorsArgs {
    /// YAML or JSON file overriding built-in selectors
    #[arg(long)]
    pub selectors: Option<PathBuf>,
}

impl SelectorsArgs {
    /// Built-in selectors with any overrides file merged on top
    pub fn selector_table(&self) -> CliResult<SelectorTable> {
        load_selectors(self.selectors.as_ref())
    }
}

fn load_selectors(path: Option<&PathBuf>) -> CliResult<SelectorTable> {
    match path {
        Some(path) => {
            let table = SelectorTable::load_overrides(path)?;
            tracing::info!(path = %path.display(), "selector overrides applied");
            Ok(table)
        }
        None => Ok(SelectorTable::default()),
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}
