use std::{
    io::{self, Write},
    sync::Arc,
};

use chrono::Utc;
use clap::Parser;
use kline_ingestor::{
    cli::commands::{Cli, Commands},
    config::IngestorConfig,
    providers::{
        bybit_rest::{BybitCredentials, BybitProvider},
        MarketDataClient,
    },
    Error, KlineHarvester,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => IngestorConfig::load(path)?,
        None => IngestorConfig::default(),
    };

    let credentials = BybitCredentials::discover(config.exchange.credentials_path.as_deref())?;
    let provider: Arc<dyn MarketDataClient> =
        Arc::new(BybitProvider::new(config.bybit_settings(), credentials.as_ref())?);

    match cli.command {
        Commands::Harvest(args) => {
            let plan = args.plan(config, Utc::now().date_naive())?;

            let symbols = match plan.symbols {
                Some(symbols) => symbols,
                None => provider.list_symbols(plan.config.category).await?,
            };

            let harvester = KlineHarvester::new(Arc::clone(&provider), plan.config);
            let harvest = harvester.harvest(symbols, plan.windows).await;

            let df = harvest.table.to_dataframe()?;
            writeln!(io::stdout().lock(), "{df}")?;

            // Summary goes to stderr so stdout stays the table only
            eprintln!("SUMMARY: {}", harvest.report);
            for symbol in harvest.report.failed_symbols() {
                eprintln!("FAILED: {symbol}");
            }
        }

        Commands::Symbols { category } => {
            let category = category.unwrap_or(config.harvest.category);
            let symbols = provider.list_symbols(category).await?;
            let mut out = io::stdout().lock();
            for symbol in symbols {
                writeln!(out, "{symbol}")?;
            }
        }
    }
    Ok(())
}
