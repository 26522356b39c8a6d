//! ExRate CLI
//!
//! Resolves historical exchange rates against providers and pegs described by
//! a JSON fixture.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use exrate_common::{Currency, FixedClock, Frequency, Source};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod fixture;

use commands::ResolveRequest;
use config::CliConfig;
use fixture::Fixture;

/// ExRate CLI
#[derive(Parser, Debug)]
#[command(name = "exrate")]
#[command(about = "Resolve historical exchange rates")]
struct Args {
    /// Fixture file with providers, observations and pegs
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the rate converting one currency into another
    Resolve {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "ECB")]
        source: Source,
        #[arg(long, default_value = "daily")]
        frequency: Frequency,
        /// Also convert this amount
        #[arg(long)]
        amount: Option<Decimal>,
    },

    /// Load every month in a date range and set the lookback watermark
    Backfill {
        #[arg(long)]
        source: Source,
        #[arg(long, default_value = "daily")]
        frequency: Frequency,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },

    /// List registered providers
    Providers {
        /// Only the first provider quoting natively in this currency
        #[arg(long)]
        currency: Option<Currency>,
    },
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let mut config = CliConfig::from_env();
    if let Some(path) = args.fixture.clone() {
        config.fixture_path = Some(path);
    }
    if args.json_logs {
        config.log_json = true;
    }

    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let fixture_path = config
        .fixture_path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No fixture configured"))?;
    info!(fixture = %fixture_path.display(), "Starting ExRate");

    let mut resolver = Fixture::load(&fixture_path)?
        .into_resolver(config.resolver.clone())
        .await?;
    if let Some(today) = args.today {
        resolver = resolver.with_clock(Arc::new(FixedClock(today)));
    }

    match args.command {
        Command::Resolve {
            from,
            to,
            date,
            source,
            frequency,
            amount,
        } => {
            let report = commands::resolve(
                &resolver,
                ResolveRequest {
                    from,
                    to,
                    date,
                    source,
                    frequency,
                    amount,
                },
            )
            .await;
            print_json(&report)?;

            if !report.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Backfill {
            source,
            frequency,
            from,
            to,
        } => {
            let report = commands::backfill(&resolver, source, frequency, from, to).await;
            print_json(&report)?;

            if !report.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Providers { currency } => {
            print_json(&commands::providers(&resolver, currency))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
