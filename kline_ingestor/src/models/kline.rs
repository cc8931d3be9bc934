//! Canonical in-memory representation of one kline (candle).
//!
//! Prices and volumes are kept as the exchange sent them (decimal strings).
//! Nothing in the fetch-and-merge path needs arithmetic on them, and parsing
//! to `f64` would lose the exchange's precision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row exactly as returned by the exchange:
/// `[openTimeMs, open, high, low, close, volume, turnover]`.
pub type RawKline = Vec<String>;

/// Number of fields in a [`RawKline`].
pub const RAW_KLINE_FIELDS: usize = 7;

/// Why a raw row could not be turned into a [`KlineRow`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KlineParseError {
    #[error("expected 7 fields, found {found}")]
    WrongArity { found: usize },

    #[error("open time is not an integer: {value:?}")]
    BadOpenTime { value: String },

    #[error("open time {millis} ms is outside the representable range")]
    OpenTimeOutOfRange { millis: i64 },
}

/// The value columns carried for every symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KlineField {
    Open,
    High,
    Low,
    Close,
    /// Traded quantity in the base asset.
    AssetVolume,
    /// Traded notional in the quote asset.
    Volume,
}

impl KlineField {
    pub const ALL: [KlineField; 6] = [
        KlineField::Open,
        KlineField::High,
        KlineField::Low,
        KlineField::Close,
        KlineField::AssetVolume,
        KlineField::Volume,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            KlineField::Open => "Open",
            KlineField::High => "High",
            KlineField::Low => "Low",
            KlineField::Close => "Close",
            KlineField::AssetVolume => "Asset volume",
            KlineField::Volume => "Volume",
        }
    }

    /// Symbol-namespaced column name, e.g. `Close_BTCUSDT`.
    pub fn column_name(&self, symbol: &str) -> String {
        format!("{}_{symbol}", self.label())
    }
}

/// The six value fields of one candle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlineValues {
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub asset_volume: String,
    pub volume: String,
}

impl KlineValues {
    pub fn get(&self, field: KlineField) -> &str {
        match field {
            KlineField::Open => &self.open,
            KlineField::High => &self.high,
            KlineField::Low => &self.low,
            KlineField::Close => &self.close,
            KlineField::AssetVolume => &self.asset_volume,
            KlineField::Volume => &self.volume,
        }
    }
}

/// A single candle for one symbol.
///
/// Identity within a [`SymbolSeries`](crate::models::series::SymbolSeries) is `open_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRow {
    /// Candle open time, milliseconds since the Unix epoch.
    pub open_time: i64,

    /// `open_time` as a UTC timestamp. This is the join key for merging.
    pub open_time_utc: DateTime<Utc>,

    pub values: KlineValues,
}

impl KlineRow {
    pub fn new(open_time: i64, values: KlineValues) -> Result<Self, KlineParseError> {
        let open_time_utc = DateTime::from_timestamp_millis(open_time)
            .ok_or(KlineParseError::OpenTimeOutOfRange { millis: open_time })?;
        Ok(Self {
            open_time,
            open_time_utc,
            values,
        })
    }

    /// Builds a row from the exchange's positional representation.
    pub fn from_raw(raw: &[String]) -> Result<Self, KlineParseError> {
        let [open_time, open, high, low, close, asset_volume, volume] = raw else {
            return Err(KlineParseError::WrongArity { found: raw.len() });
        };

        let millis: i64 = open_time
            .trim()
            .parse()
            .map_err(|_| KlineParseError::BadOpenTime {
                value: open_time.clone(),
            })?;

        Self::new(
            millis,
            KlineValues {
                open: open.clone(),
                high: high.clone(),
                low: low.clone(),
                close: close.clone(),
                asset_volume: asset_volume.clone(),
                volume: volume.clone(),
            },
        )
    }
}
