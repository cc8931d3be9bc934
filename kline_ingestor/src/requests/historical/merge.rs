use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::models::table::{row_positions, MergedTable, SymbolCells};

/// Outer-joins `tables` on open time.
///
/// The result's index is the sorted union of every input timestamp, and every
/// symbol gets a cell at each of them, `None` where it had no candle. When the
/// same symbol appears in several inputs the first non-empty cell wins, so for
/// inputs with disjoint symbols the result does not depend on input order.
pub fn merge(tables: impl IntoIterator<Item = MergedTable>) -> MergedTable {
    let mut tables: Vec<MergedTable> = tables.into_iter().collect();
    if tables.len() <= 1 {
        return tables.pop().unwrap_or_default();
    }

    let index: Vec<_> = tables
        .iter()
        .flat_map(|t| t.index().iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let positions = row_positions(&index);

    let mut columns: IndexMap<String, SymbolCells> = IndexMap::new();
    for table in tables {
        let (table_index, table_columns) = table.into_parts();
        for (symbol, cells) in table_columns {
            let target = columns
                .entry(symbol)
                .or_insert_with(|| vec![None; index.len()]);
            for (ts, cell) in table_index.iter().zip(cells) {
                let Some(values) = cell else { continue };
                let slot = &mut target[positions[ts]];
                if slot.is_none() {
                    *slot = Some(values);
                }
            }
        }
    }

    MergedTable::from_parts(index, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        kline::{KlineField, KlineRow, KlineValues},
        series::SymbolSeries,
    };
    use chrono::DateTime;
    use proptest::prelude::*;

    fn table(symbol: &str, times: &[i64]) -> MergedTable {
        let rows = times
            .iter()
            .map(|&t| {
                KlineRow::new(
                    t,
                    KlineValues {
                        open: "1".into(),
                        high: "1".into(),
                        low: "1".into(),
                        close: format!("{symbol}@{t}"),
                        asset_volume: "1".into(),
                        volume: "1".into(),
                    },
                )
                .unwrap()
            })
            .collect();
        MergedTable::from(SymbolSeries::from_rows(symbol, rows))
    }

    fn ts(millis: i64) -> chrono::DateTime<chrono::Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn empty_input_is_empty_table() {
        let merged = merge(Vec::new());
        assert!(merged.is_empty());
        assert_eq!(merged.symbol_count(), 0);
    }

    #[test]
    fn single_input_is_returned_unchanged() {
        let a = table("BTCUSDT", &[0, 60_000]);
        assert_eq!(merge(vec![a.clone()]), a);
    }

    #[test]
    fn missing_cells_are_explicit() {
        let merged = merge(vec![
            table("BTCUSDT", &[0, 60_000]),
            table("ETHUSDT", &[60_000, 120_000]),
        ]);

        assert_eq!(merged.index(), &[ts(0), ts(60_000), ts(120_000)]);
        assert_eq!(
            merged.column(KlineField::Close, "BTCUSDT"),
            Some(vec![Some("BTCUSDT@0"), Some("BTCUSDT@60000"), None])
        );
        assert_eq!(
            merged.column(KlineField::Close, "ETHUSDT"),
            Some(vec![None, Some("ETHUSDT@60000"), Some("ETHUSDT@120000")])
        );
    }

    #[test]
    fn empty_tables_add_nothing() {
        let a = table("BTCUSDT", &[0]);
        let merged = merge(vec![MergedTable::empty(), a.clone(), MergedTable::empty()]);
        assert_eq!(merged, a);
    }

    #[test]
    fn repeated_symbol_fills_gaps_first_wins() {
        let merged = merge(vec![table("BTCUSDT", &[0]), table("BTCUSDT", &[0, 60_000])]);
        assert_eq!(merged.symbol_count(), 1);
        assert_eq!(
            merged.column(KlineField::Close, "BTCUSDT"),
            Some(vec![Some("BTCUSDT@0"), Some("BTCUSDT@60000")])
        );
    }

    fn arb_tables() -> impl Strategy<Value = Vec<MergedTable>> {
        prop::collection::vec(prop::collection::btree_set(0i64..50, 0..12), 0..5).prop_map(
            |sets| {
                sets.into_iter()
                    .enumerate()
                    .map(|(i, set)| {
                        let times: Vec<i64> = set.into_iter().map(|m| m * 60_000).collect();
                        table(&format!("SYM{i}"), &times)
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn order_of_inputs_does_not_matter(tables in arb_tables(), seed in any::<u64>()) {
            let forward = merge(tables.clone());

            let mut reversed = tables.clone();
            reversed.reverse();
            prop_assert_eq!(&merge(reversed), &forward);

            let mut rotated = tables.clone();
            if !rotated.is_empty() {
                let k = (seed as usize) % rotated.len();
                rotated.rotate_left(k);
            }
            prop_assert_eq!(&merge(rotated), &forward);
        }

        #[test]
        fn grouping_does_not_matter(tables in arb_tables()) {
            let flat = merge(tables.clone());
            let mid = tables.len() / 2;
            let (left, right) = tables.split_at(mid);
            let nested = merge(vec![merge(left.to_vec()), merge(right.to_vec())]);
            prop_assert_eq!(nested, flat);
        }

        #[test]
        fn index_is_sorted_union(tables in arb_tables()) {
            let merged = merge(tables.clone());
            let expected: BTreeSet<_> = tables.iter().flat_map(|t| t.index().to_vec()).collect();
            prop_assert_eq!(merged.index().to_vec(), expected.into_iter().collect::<Vec<_>>());
            for symbol in merged.symbols() {
                prop_assert_eq!(merged.cells(symbol).map(<[_]>::len), Some(merged.len()));
            }
        }
    }
}
