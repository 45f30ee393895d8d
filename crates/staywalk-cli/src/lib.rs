//! Staywalk CLI Library
//!
//! Command-line front end for the Staywalk booking scenario: argument
//! parsing, logging setup, test data, result artifacts and the scenario
//! runner used by the `staywalk` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod artifacts;
mod commands;
mod config;
mod error;
mod runner;
mod test_data;

pub use artifacts::{ArtifactWriter, BEST_LISTING_FILE, RESERVATION_FILE};
pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, LogFormatArg, RunArgs, SelectorsArgs,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult, CONFIG_EXIT_CODE, SCENARIO_FAILURE_EXIT_CODE};
pub use runner::{ScenarioReport, ScenarioRunner, DEFAULT_SCENARIO};
pub use test_data::{TestData, DEFAULT_TEST_DATA_PATH};
