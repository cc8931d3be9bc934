use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntervalError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount { unit: IntervalUnit, message: String },

    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

/// Candle width accepted by the exchange kline endpoint.
///
/// Only the combinations the exchange lists are constructible:
/// 1/3/5/15/30 minutes, 1/2/4/6/12 hours, and one day, week or month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KlineInterval {
    amount: u32,
    unit: IntervalUnit,
}

impl KlineInterval {
    /// One-minute candles, the finest width the exchange offers.
    pub const MINUTE: Self = Self { amount: 1, unit: IntervalUnit::Minute };

    pub fn new(amount: u32, unit: IntervalUnit) -> Result<Self, IntervalError> {
        Self::validate(amount, unit)?;
        Ok(Self { amount, unit })
    }

    pub fn minutes(amount: u32) -> Result<Self, IntervalError> {
        Self::new(amount, IntervalUnit::Minute)
    }

    pub fn hours(amount: u32) -> Result<Self, IntervalError> {
        Self::new(amount, IntervalUnit::Hour)
    }

    pub const fn day() -> Self {
        Self { amount: 1, unit: IntervalUnit::Day }
    }

    pub const fn week() -> Self {
        Self { amount: 1, unit: IntervalUnit::Week }
    }

    pub const fn month() -> Self {
        Self { amount: 1, unit: IntervalUnit::Month }
    }

    pub const fn amount(&self) -> u32 {
        self.amount
    }

    pub const fn unit(&self) -> IntervalUnit {
        self.unit
    }

    fn validate(amount: u32, unit: IntervalUnit) -> Result<(), IntervalError> {
        match unit {
            IntervalUnit::Minute if ![1, 3, 5, 15, 30].contains(&amount) => {
                Err(IntervalError::InvalidAmount {
                    unit,
                    message: "Minute intervals must be one of 1, 3, 5, 15, 30".into(),
                })
            }
            IntervalUnit::Hour if ![1, 2, 4, 6, 12].contains(&amount) => {
                Err(IntervalError::InvalidAmount {
                    unit,
                    message: "Hour intervals must be one of 1, 2, 4, 6, 12".into(),
                })
            }
            IntervalUnit::Day | IntervalUnit::Week | IntervalUnit::Month if amount != 1 => {
                Err(IntervalError::InvalidAmount {
                    unit,
                    message: "Day, Week and Month intervals can only be used with amount 1"
                        .into(),
                })
            }
            _ => Ok(()),
        }
    }

    /// The interval code sent on the wire (`"1"`, `"60"`, `"D"`, ...).
    pub fn code(&self) -> String {
        match self.unit {
            IntervalUnit::Minute => self.amount.to_string(),
            IntervalUnit::Hour => (self.amount * 60).to_string(),
            IntervalUnit::Day => "D".to_string(),
            IntervalUnit::Week => "W".to_string(),
            IntervalUnit::Month => "M".to_string(),
        }
    }

    /// Nominal width in minutes. Months count as 30 days.
    pub fn approx_minutes(&self) -> u64 {
        let per_unit: u64 = match self.unit {
            IntervalUnit::Minute => 1,
            IntervalUnit::Hour => 60,
            IntervalUnit::Day => 24 * 60,
            IntervalUnit::Week => 7 * 24 * 60,
            IntervalUnit::Month => 30 * 24 * 60,
        };
        per_unit * u64::from(self.amount)
    }

    /// Largest window, in whole hours, whose candles stay below `row_limit`.
    ///
    /// Windows include both boundary candles, so a window of `h` hours holds
    /// `h * 60 / width + 1` rows. That stays below `row_limit` exactly when
    /// `h * 60 < (row_limit - 1) * width`. For 1-minute candles and a limit of
    /// 1000 this is 16 hours. `None` when even a one-hour window would not fit.
    pub fn max_hour_step(&self, row_limit: u32) -> Option<NonZeroU32> {
        let span_minutes = u64::from(row_limit.checked_sub(1)?) * self.approx_minutes();
        let hours = span_minutes.checked_sub(1)? / 60;
        NonZeroU32::new(u32::try_from(hours).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for KlineInterval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "D" => Ok(Self::day()),
            "W" => Ok(Self::week()),
            "M" => Ok(Self::month()),
            "" => Err(IntervalError::InvalidInput {
                message: "empty interval code".into(),
            }),
            digits => {
                let minutes: u32 = digits.parse().map_err(|_| IntervalError::InvalidInput {
                    message: format!("unknown interval code: {digits}"),
                })?;
                if minutes >= 60 && minutes % 60 == 0 {
                    Self::hours(minutes / 60)
                } else {
                    Self::minutes(minutes)
                }
            }
        }
    }
}

impl Serialize for KlineInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for KlineInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}
