//! Wide, time-aligned table holding many symbols.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::models::{
    kline::{KlineField, KlineValues},
    series::SymbolSeries,
};

/// One cell per row of the table index. `None` is the explicit "no value" marker.
pub type SymbolCells = Vec<Option<KlineValues>>;

/// Outer-joined klines for any number of symbols.
///
/// `index` is sorted ascending with no duplicates. Every entry of `columns`
/// holds exactly `index.len()` cells, one per timestamp, so a symbol missing a
/// candle at some instant shows `None` there instead of losing the row.
///
/// Equality ignores the order in which symbols were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedTable {
    index: Vec<DateTime<Utc>>,
    columns: IndexMap<String, SymbolCells>,
}

impl MergedTable {
    /// Zero rows, zero symbols.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assembles a table from an already aligned index and column set.
    ///
    /// Callers must keep `index` sorted and unique and every column the same
    /// length as `index`; [`merge`](crate::requests::historical::merge::merge)
    /// is the only producer of multi-symbol tables.
    pub(crate) fn from_parts(
        index: Vec<DateTime<Utc>>,
        columns: IndexMap<String, SymbolCells>,
    ) -> Self {
        debug_assert!(index.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(columns.values().all(|cells| cells.len() == index.len()));
        Self { index, columns }
    }

    pub(crate) fn into_parts(self) -> (Vec<DateTime<Utc>>, IndexMap<String, SymbolCells>) {
        (self.index, self.columns)
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    /// Number of rows (distinct timestamps).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn symbol_count(&self) -> usize {
        self.columns.len()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// All cells of one symbol, aligned with [`index`](Self::index).
    pub fn cells(&self, symbol: &str) -> Option<&[Option<KlineValues>]> {
        self.columns.get(symbol).map(Vec::as_slice)
    }

    /// The candle of `symbol` at `at`, if both exist in the table.
    pub fn get(&self, symbol: &str, at: DateTime<Utc>) -> Option<&KlineValues> {
        let row = self.index.binary_search(&at).ok()?;
        self.columns.get(symbol)?.get(row)?.as_ref()
    }

    /// One value column such as `Close_BTCUSDT`, aligned with the index.
    pub fn column(&self, field: KlineField, symbol: &str) -> Option<Vec<Option<&str>>> {
        let cells = self.columns.get(symbol)?;
        Some(
            cells
                .iter()
                .map(|cell| cell.as_ref().map(|values| values.get(field)))
                .collect(),
        )
    }

    /// Symbol-namespaced names of every value column, grouped by symbol.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .keys()
            .flat_map(|symbol| KlineField::ALL.iter().map(move |f| f.column_name(symbol)))
            .collect()
    }
}

impl From<SymbolSeries> for MergedTable {
    /// A single-symbol table. An empty series gives an empty table, so a
    /// symbol without data never contributes a column of only `None`.
    fn from(series: SymbolSeries) -> Self {
        if series.is_empty() {
            return Self::empty();
        }

        let symbol = series.symbol().to_string();
        let (index, cells): (Vec<_>, Vec<_>) = series
            .into_rows()
            .into_iter()
            .map(|row| (row.open_time_utc, Some(row.values)))
            .unzip();

        let mut columns = IndexMap::with_capacity(1);
        columns.insert(symbol, cells);
        Self { index, columns }
    }
}

/// Row lookup for aligning a table against a larger index.
pub(crate) fn row_positions(index: &[DateTime<Utc>]) -> HashMap<DateTime<Utc>, usize> {
    index.iter().enumerate().map(|(i, ts)| (*ts, i)).collect()
}
