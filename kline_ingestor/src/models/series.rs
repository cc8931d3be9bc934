//! A complete set of klines for a single symbol.

use crate::models::kline::{KlineParseError, KlineRow, RawKline};

/// Klines for exactly one symbol, sorted ascending by open time with no
/// duplicate open times.
///
/// Every constructor re-sorts and dedups the rows, so a series built
/// from overlapping pages never carries the shared boundary candle twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSeries {
    symbol: String,
    rows: Vec<KlineRow>,
}

impl SymbolSeries {
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            rows: Vec::new(),
        }
    }

    /// Sorts `rows` by open time and drops later rows that repeat an open time.
    pub fn from_rows(symbol: impl Into<String>, mut rows: Vec<KlineRow>) -> Self {
        // stable sort: the first occurrence of a key stays first
        rows.sort_by_key(|row| row.open_time);
        rows.dedup_by_key(|row| row.open_time);
        Self {
            symbol: symbol.into(),
            rows,
        }
    }

    /// Converts the exchange's raw rows into a series.
    ///
    /// The exchange lists newest-first; the result is oldest-first.
    pub fn from_raw(symbol: impl Into<String>, raw: &[RawKline]) -> Result<Self, KlineParseError> {
        let rows = raw
            .iter()
            .map(|r| KlineRow::from_raw(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rows(symbol, rows))
    }

    /// Concatenates consecutive pages of one symbol into a single series.
    pub fn concat(symbol: impl Into<String>, pages: Vec<SymbolSeries>) -> Self {
        let rows = pages.into_iter().flat_map(|page| page.rows).collect();
        Self::from_rows(symbol, rows)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn rows(&self) -> &[KlineRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<KlineRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
