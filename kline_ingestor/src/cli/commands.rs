use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::models::{category::Category, interval::KlineInterval};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the config file (kline_ingestor.toml). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch klines for many symbols and print the merged table
    Harvest(HarvestArgs),

    /// List every symbol in a category
    Symbols {
        /// spot, linear, inverse or option
        #[arg(long)]
        category: Option<Category>,
    },
}

#[derive(Args, Debug, Default)]
pub struct HarvestArgs {
    /// Comma-separated list of symbols (e.g. "BTCUSDT,ETHUSDT").
    /// Every symbol of the category is used when omitted.
    #[arg(long)]
    pub symbols: Option<String>,

    /// spot, linear, inverse or option
    #[arg(long)]
    pub category: Option<Category>,

    /// Exchange interval code: 1, 3, 5, 15, 30, 60, 120, 240, 360, 720, D, W or M
    #[arg(long)]
    pub interval: Option<KlineInterval>,

    /// Days of history to fetch
    #[arg(long)]
    pub days: Option<u32>,

    /// Hours covered by one page request
    #[arg(long)]
    pub hour_step: Option<NonZeroU32>,

    /// Number of concurrent workers
    #[arg(long)]
    pub concurrency: Option<NonZeroUsize>,

    /// Last date of the range (YYYY-MM-DD). Defaults to tomorrow (UTC).
    #[arg(long)]
    pub end: Option<NaiveDate>,
}
