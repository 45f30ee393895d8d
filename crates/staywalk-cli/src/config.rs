//! CLI configuration and logging setup

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - warnings and errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Check if debug mode
    #[must_use]
    pub const fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }

    /// Filter directive used when `RUST_LOG` is unset
    #[must_use]
    pub const fn default_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "info,staywalk=debug,staywalk_cli=debug",
            Self::Debug => "debug,staywalk=trace,staywalk_cli=trace",
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Log line format
    pub log_format: LogFormat,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set log format
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Filter built from `RUST_LOG`, falling back to the verbosity default
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.verbosity.default_directive()))
    }

    /// Install the global tracing subscriber. Logs go to stderr.
    pub fn init_tracing(&self) -> CliResult<()> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_target(self.verbosity.is_verbose());

        let installed = match self.log_format {
            LogFormat::Text => builder.with_ansi(self.color.should_color()).try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        installed.map_err(|e| CliError::config(format!("cannot install logger: {e}")))
    }
}
