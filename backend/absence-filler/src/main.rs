use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod absence_client;
mod calendar;
mod cli;
mod config;
mod filler;
mod hawk;
mod report;

mod absence_client_tests;
mod calendar_tests;

use absence_client::AbsenceClient;
use calendar::DayFilter;
use cli::Cli;
use config::FillerConfig;
use filler::WorkFiller;

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting tracing subscriber failed")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let config = FillerConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;
    info!("Configuration loaded.");

    let excluded = match cli.excluded_weekdays().context("Invalid --exclusion")? {
        Some(days) => days,
        None => config.skip_days.clone(),
    };
    let filter = DayFilter::new(excluded, config.bank_holidays.iter().copied());

    let today = Local::now().date_naive();
    let range = cli.date_range(today);
    let dates = range.dates(today);
    info!("Date range {:?} resolved to {} business day(s)", range, dates.len());

    let client = AbsenceClient::from_config(&config).context("Failed to build HTTP client")?;
    let filler = WorkFiller::new(client, filter, config.entry.clone());
    let summary = filler.run(&dates).await.context("Filling work time failed")?;

    if let Some(path) = &cli.report {
        report::save_report(&summary, path)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
    }
    Ok(())
}
