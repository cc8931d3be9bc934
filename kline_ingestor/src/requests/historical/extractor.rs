//! Per-symbol extraction with whole-pass retries.

use std::{num::NonZeroU32, sync::Arc, time::Duration};

use nonzero_ext::nonzero;
use tracing::{debug, error, warn};

use crate::{
    models::{
        category::Category, interval::KlineInterval, series::SymbolSeries,
        windows::TimeWindowList,
    },
    providers::{KlineRequest, MarketDataClient, ProviderError},
    requests::historical::{page::fetch_page, report::SymbolOutcome},
};

/// Exchange page size cap.
pub const DEFAULT_ROW_LIMIT: u32 = 1000;

/// Error text kept in the per-attempt log line.
const LOGGED_ERROR_CHARS: usize = 100;

/// Fixed-delay retry budget for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total passes, the first one included.
    pub max_attempts: NonZeroU32,
    /// Pause after a failed pass before the next one starts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: nonzero!(10u32),
            delay: Duration::from_secs(30),
        }
    }
}

/// A symbol's series together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub series: SymbolSeries,
    pub outcome: SymbolOutcome,
}

/// Pulls the full window range for one symbol at a time.
///
/// Cloning is cheap; the client and window list are shared.
#[derive(Clone)]
pub struct RetryingExtractor {
    client: Arc<dyn MarketDataClient>,
    windows: Arc<TimeWindowList>,
    category: Category,
    interval: KlineInterval,
    row_limit: u32,
    policy: RetryPolicy,
}

impl RetryingExtractor {
    pub fn new(
        client: Arc<dyn MarketDataClient>,
        windows: Arc<TimeWindowList>,
        category: Category,
        interval: KlineInterval,
    ) -> Self {
        Self {
            client,
            windows,
            category,
            interval,
            row_limit: DEFAULT_ROW_LIMIT,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_row_limit(mut self, row_limit: u32) -> Self {
        self.row_limit = row_limit;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Extracts every window for `symbol`.
    ///
    /// A failure on any window discards the pass and starts over from the
    /// first window. When the budget runs out the series is empty and the
    /// outcome is [`SymbolOutcome::Failed`]; this never returns an error.
    pub async fn extract_symbol(&self, symbol: &str) -> Extraction {
        let max_attempts = self.policy.max_attempts.get();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.extract_once(symbol).await {
                Ok(series) => {
                    let outcome = if series.is_empty() {
                        SymbolOutcome::NoData { attempts: attempt }
                    } else {
                        SymbolOutcome::Extracted {
                            rows: series.len(),
                            attempts: attempt,
                        }
                    };
                    return Extraction { series, outcome };
                }
                Err(err) => {
                    let message = err.to_string();
                    let short: String = message.chars().take(LOGGED_ERROR_CHARS).collect();
                    warn!(
                        symbol,
                        attempt,
                        rate_limited = err.is_rate_limited(),
                        "Attempt {attempt} failed for {symbol}. Exception: {short}"
                    );

                    if attempt >= max_attempts {
                        error!(symbol, "Max retries reached for {symbol}. Data NOT extracted.");
                        return Extraction {
                            series: SymbolSeries::empty(symbol),
                            outcome: SymbolOutcome::Failed {
                                attempts: attempt,
                                last_error: message,
                            },
                        };
                    }
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }

    /// One complete pass over the window list.
    async fn extract_once(&self, symbol: &str) -> Result<SymbolSeries, ProviderError> {
        if let [only] = self.windows.as_slice() {
            return fetch_page(self.client.as_ref(), &self.request(symbol, *only, None)).await;
        }

        let mut pages = Vec::new();
        for (start, end) in self.windows.pairs() {
            let page = fetch_page(self.client.as_ref(), &self.request(symbol, start, Some(end))).await?;
            debug!(symbol, start, end, rows = page.len(), "page fetched");
            if !page.is_empty() {
                pages.push(page);
            }
        }
        Ok(SymbolSeries::concat(symbol, pages))
    }

    fn request(&self, symbol: &str, start: i64, end: Option<i64>) -> KlineRequest {
        KlineRequest {
            category: self.category,
            symbol: symbol.to_string(),
            interval: self.interval,
            start,
            end,
            limit: self.row_limit,
        }
    }
}
