pub mod dispatcher;
pub mod extractor;
pub mod merge;
pub mod page;
pub mod report;

pub use dispatcher::{split_shards, Dispatcher, ShardResult};
pub use extractor::{Extraction, RetryPolicy, RetryingExtractor, DEFAULT_ROW_LIMIT};
pub use merge::merge;
pub use page::fetch_page;
pub use report::{HarvestReport, SymbolOutcome};

use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use nonzero_ext::nonzero;
use tracing::info;

use crate::{
    models::{
        category::Category, interval::KlineInterval, table::MergedTable,
        windows::TimeWindowList,
    },
    providers::MarketDataClient,
};

/// Tuning knobs for a harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub category: Category,
    pub interval: KlineInterval,
    /// Number of concurrent workers (shards).
    pub concurrency: NonZeroUsize,
    pub row_limit: u32,
    pub retry: RetryPolicy,
    pub stagger: Duration,
    pub verbose: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            category: Category::Linear,
            interval: KlineInterval::MINUTE,
            concurrency: nonzero!(50usize),
            row_limit: DEFAULT_ROW_LIMIT,
            retry: RetryPolicy::default(),
            stagger: dispatcher::DEFAULT_STAGGER,
            verbose: true,
        }
    }
}

/// The merged table plus per-symbol outcomes.
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    pub table: MergedTable,
    pub report: HarvestReport,
}

/// Entry point for bulk kline retrieval against one client.
pub struct KlineHarvester {
    client: Arc<dyn MarketDataClient>,
    config: HarvestConfig,
}

impl KlineHarvester {
    pub fn new(client: Arc<dyn MarketDataClient>, config: HarvestConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Fetches `windows` for every symbol and outer-joins the results.
    ///
    /// Never fails: symbols that could not be fetched are missing from the
    /// table and marked [`SymbolOutcome::Failed`] in the report.
    pub async fn harvest(&self, symbols: Vec<String>, windows: TimeWindowList) -> Harvest {
        info!(
            symbols = symbols.len(),
            windows = windows.len(),
            interval = %self.config.interval,
            category = %self.config.category,
            concurrency = self.config.concurrency.get(),
            "starting kline harvest"
        );

        let extractor = RetryingExtractor::new(
            Arc::clone(&self.client),
            Arc::new(windows),
            self.config.category,
            self.config.interval,
        )
        .with_row_limit(self.config.row_limit)
        .with_retry_policy(self.config.retry.clone());

        let (table, report) = Dispatcher::new(extractor, self.config.concurrency)
            .with_stagger(self.config.stagger)
            .with_verbose(self.config.verbose)
            .run_all(symbols)
            .await;

        info!(
            rows = table.len(),
            extracted = report.extracted(),
            no_data = report.no_data(),
            failed = report.failed(),
            "kline harvest finished"
        );
        Harvest { table, report }
    }
}

/// Harvests `symbols` with default retry, pacing and row-limit settings and
/// returns only the merged table.
pub async fn run(
    client: Arc<dyn MarketDataClient>,
    symbols: Vec<String>,
    interval: KlineInterval,
    windows: TimeWindowList,
    category: Category,
    concurrency: NonZeroUsize,
) -> MergedTable {
    let config = HarvestConfig {
        category,
        interval,
        concurrency,
        ..HarvestConfig::default()
    };
    KlineHarvester::new(client, config)
        .harvest(symbols, windows)
        .await
        .table
}
