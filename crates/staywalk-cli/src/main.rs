//! Staywalk CLI: runs the booking scenario in a real browser
//!
//! ## Usage
//!
//! ```bash
//! staywalk run                               # Run with config/test_data.json
//! staywalk run --data trips/rome.json --headed
//! staywalk -v --log-format json run          # Structured debug logs
//! staywalk config --json                     # Show resolved configuration
//! staywalk selectors --selectors site.yaml   # Show merged selector table
//! ```

use clap::Parser;
use console::style;
use staywalk::SuiteConfig;
use staywalk_cli::{
    ArtifactWriter, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, ConfigArgs,
    RunArgs, ScenarioReport, ScenarioRunner, SelectorsArgs, TestData, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", style("Error:").red().bold());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    console::set_colors_enabled(config.color.should_color());
    console::set_colors_enabled_stderr(config.color.should_color());
    config.init_tracing()?;

    match cli.command {
        Commands::Run(args) => run_booking(&config, &args),
        Commands::Config(args) => run_config(&args),
        Commands::Selectors(args) => run_selectors(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_log_format(cli.log_format.into())
        .with_color(color)
}

fn run_booking(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let suite = args.suite_config(SuiteConfig::from_env()?)?;
    let guard = staywalk::begin_session(suite.suite_timeout);

    let data = TestData::load(&args.data)?;
    let selectors = args.selector_table()?;
    let runner = ScenarioRunner::new(
        suite,
        selectors,
        data,
        ArtifactWriter::new(&args.output, &args.reports),
    )
    .with_scenario(args.scenario.as_str());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))?;
    let outcome = rt.block_on(drive_browser(&runner, args));

    if let Some(err) = guard.finish().into_error() {
        if let Err(e) = &outcome {
            tracing::error!(error = %e, "scenario had already failed");
        }
        return Err(err.into());
    }

    let report = outcome?;
    if !config.verbosity.is_quiet() {
        print_summary(&report);
    }
    Ok(())
}

#[cfg(feature = "browser")]
async fn drive_browser(runner: &ScenarioRunner, args: &RunArgs) -> CliResult<ScenarioReport> {
    let browser = staywalk::Browser::launch(args.browser_config()).await?;
    let outcome = match browser.new_page().await {
        Ok(mut page) => runner.run(&mut page).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }
    outcome
}

#[cfg(not(feature = "browser"))]
#[allow(clippy::unused_async)]
async fn drive_browser(_runner: &ScenarioRunner, _args: &RunArgs) -> CliResult<ScenarioReport> {
    Err(CliError::config(
        "browser support not enabled. Rebuild with --features browser",
    ))
}

fn print_summary(report: &ScenarioReport) {
    let best = &report.best;
    println!(
        "{} best listing #{}: rating {} at {} per night",
        style("✓").green().bold(),
        best.rank,
        best.rating,
        best.price
    );
    println!("  {}", style(&best.url).cyan());
    println!(
        "{} reserved for {} ({} → {})",
        style("✓").green().bold(),
        report.reservation.guest_counts,
        report.reservation.checkin,
        report.reservation.checkout
    );
    println!("  {}", style(&report.reservation.url).cyan());
    println!(
        "  records: {}, {}",
        report.best_listing_path.display(),
        report.reservation_path.display()
    );
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let suite = SuiteConfig::from_env()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&suite)?);
    } else {
        println!("{}", style("Suite configuration").bold());
        println!("  base_url:          {}", suite.base_url);
        println!(
            "  wait_after_action: {} ms",
            suite.wait_after_action.as_millis()
        );
        println!("  suite_timeout:     {} s", suite.suite_timeout.as_secs());
    }
    Ok(())
}

fn run_selectors(args: &SelectorsArgs) -> CliResult<()> {
    let table = args.selector_table()?;
    print!("{}", table.to_yaml()?);
    Ok(())
}
