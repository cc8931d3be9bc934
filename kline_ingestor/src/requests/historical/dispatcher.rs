//! Fan-out of symbols across concurrent worker tasks.

use std::{num::NonZeroUsize, time::Duration};

use futures::future::join_all;
use rand::seq::SliceRandom;
use tracing::{debug, error, info, info_span, Instrument};

use crate::{
    models::table::MergedTable,
    requests::historical::{
        extractor::{Extraction, RetryingExtractor},
        merge::merge,
        report::{HarvestReport, SymbolOutcome},
    },
};

/// Delay between two worker launches.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(200);

/// Everything one worker produced for its shard.
#[derive(Debug, Clone, Default)]
pub struct ShardResult {
    pub shard: usize,
    pub table: MergedTable,
    pub report: HarvestReport,
}

/// Splits `items` into exactly `shards` contiguous runs whose lengths differ by
/// at most one; the first `len % shards` runs get the extra element.
pub fn split_shards<T>(items: Vec<T>, shards: NonZeroUsize) -> Vec<Vec<T>> {
    let shards = shards.get();
    let (base, extra) = (items.len() / shards, items.len() % shards);

    let mut rest = items.into_iter();
    (0..shards)
        .map(|i| {
            let size = base + usize::from(i < extra);
            rest.by_ref().take(size).collect()
        })
        .collect()
}

/// Runs one [`RetryingExtractor`] per shard on its own task.
pub struct Dispatcher {
    extractor: RetryingExtractor,
    concurrency: NonZeroUsize,
    stagger: Duration,
    verbose: bool,
}

impl Dispatcher {
    pub fn new(extractor: RetryingExtractor, concurrency: NonZeroUsize) -> Self {
        Self {
            extractor,
            concurrency,
            stagger: DEFAULT_STAGGER,
            verbose: true,
        }
    }

    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Whether each extracted symbol is announced at `info` level.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Shuffles `symbols`, shards them, waits for every worker and merges
    /// their tables.
    ///
    /// Per-symbol failures stay inside the workers. A worker task that panics
    /// is logged and its shard is left out.
    pub async fn run_all(&self, mut symbols: Vec<String>) -> (MergedTable, HarvestReport) {
        symbols.shuffle(&mut rand::rng());
        let shards = split_shards(symbols, self.concurrency);

        let mut handles = Vec::with_capacity(shards.len());
        for (shard, symbols) in shards.into_iter().enumerate() {
            if symbols.is_empty() {
                continue;
            }
            if !handles.is_empty() {
                tokio::time::sleep(self.stagger).await;
            }
            let extractor = self.extractor.clone();
            let verbose = self.verbose;
            let span = info_span!("shard", shard, symbols = symbols.len());
            handles.push(tokio::spawn(
                run_shard(extractor, shard, symbols, verbose).instrument(span),
            ));
        }

        let mut tables = Vec::with_capacity(handles.len());
        let mut report = HarvestReport::default();
        for joined in join_all(handles).await {
            match joined {
                Ok(result) => {
                    debug!(shard = result.shard, symbols = result.report.len(), "shard finished");
                    report.extend(result.report);
                    if !result.table.is_empty() {
                        tables.push(result.table);
                    }
                }
                Err(err) => error!(error = %err, "worker task did not complete"),
            }
        }

        (merge(tables), report)
    }
}

/// Extracts a shard's symbols one after another and merges them locally.
async fn run_shard(
    extractor: RetryingExtractor,
    shard: usize,
    symbols: Vec<String>,
    verbose: bool,
) -> ShardResult {
    let mut tables = Vec::with_capacity(symbols.len());
    let mut report = HarvestReport::default();

    for symbol in symbols {
        let Extraction { series, outcome } = extractor.extract_symbol(&symbol).await;
        match outcome {
            SymbolOutcome::Extracted { rows, .. } => {
                if verbose {
                    info!(%symbol, rows, "{symbol} data extracted");
                }
                tables.push(MergedTable::from(series));
            }
            SymbolOutcome::NoData { .. } => info!(%symbol, "no data for {symbol}"),
            // already logged by the extractor
            SymbolOutcome::Failed { .. } => {}
        }
        report.record(symbol, outcome);
    }

    ShardResult {
        shard,
        table: merge(tables),
        report,
    }
}
