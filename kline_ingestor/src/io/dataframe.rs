use polars::prelude::*;

use crate::models::{kline::KlineField, table::MergedTable};

/// Name of the time column, matching what downstream notebooks expect.
pub const TIME_COLUMN: &str = "Open time formatted UTC";

impl MergedTable {
    /// Converts the table into a polars `DataFrame`.
    ///
    /// The first column is [`TIME_COLUMN`] (`Datetime[ms]`), followed by one
    /// string column per symbol and field (`Close_BTCUSDT`, ...). Absent
    /// cells become nulls.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let millis: Vec<i64> = self.index().iter().map(|ts| ts.timestamp_millis()).collect();
        let mut columns = Vec::with_capacity(1 + self.symbol_count() * KlineField::ALL.len());
        columns.push(
            Column::new(TIME_COLUMN.into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        );

        for symbol in self.symbols() {
            for field in KlineField::ALL {
                if let Some(values) = self.column(field, symbol) {
                    columns.push(Column::new(field.column_name(symbol).into(), values));
                }
            }
        }

        DataFrame::new(columns)
    }
}
