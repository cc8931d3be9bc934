//! TOML configuration for the harvester and its exchange client.
//!
//! Every key is optional; an empty file (or no file at all) gives the
//! settings below.
//!
//! ```toml
//! [exchange]
//! base_url = "https://api.bybit.com"
//! requests_per_second = 10
//! credentials_path = "/home/me/.bybit.json"
//! timeout_secs = 10
//!
//! [harvest]
//! category = "linear"
//! interval = "1"
//! concurrency = 50
//! row_limit = 1000
//! max_attempts = 10
//! retry_delay_secs = 30
//! stagger_ms = 200
//! verbose = true
//!
//! [window]
//! lookback_days = 10
//! hour_step = 16
//! ```

use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{Days, NaiveDate};
use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};
use shared_utils::config::{load_toml, ConfigError};

use crate::{
    models::{
        category::Category,
        interval::KlineInterval,
        windows::{generate_windows, TimeWindowList},
    },
    providers::bybit_rest::{BybitSettings, DEFAULT_BASE_URL},
    requests::historical::{HarvestConfig, RetryPolicy, DEFAULT_ROW_LIMIT},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestorConfig {
    pub exchange: ExchangeConfig,
    pub harvest: HarvestSettings,
    pub window: WindowConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub requests_per_second: NonZeroU32,
    /// JSON file with `bybitAPI` / `bybitAPISecret`. When unset, the
    /// `BYBIT_API_KEY` / `BYBIT_API_SECRET` environment variables are tried.
    pub credentials_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_second: nonzero!(10u32),
            credentials_path: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    pub category: Category,
    pub interval: KlineInterval,
    pub concurrency: NonZeroUsize,
    pub row_limit: u32,
    pub max_attempts: NonZeroU32,
    pub retry_delay_secs: u64,
    pub stagger_ms: u64,
    pub verbose: bool,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            category: Category::Linear,
            interval: KlineInterval::MINUTE,
            concurrency: nonzero!(50usize),
            row_limit: DEFAULT_ROW_LIMIT,
            max_attempts: nonzero!(10u32),
            retry_delay_secs: 30,
            stagger_ms: 200,
            verbose: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub lookback_days: u32,
    pub hour_step: NonZeroU32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lookback_days: 10,
            hour_step: nonzero!(16u32),
        }
    }
}

impl WindowConfig {
    /// `(end - lookback_days, end)`. Fails when the start would fall outside
    /// the representable calendar.
    pub fn date_range(&self, end: NaiveDate) -> Result<(NaiveDate, NaiveDate), ConfigError> {
        let start = end
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .ok_or_else(|| ConfigError::Invalid {
                field: "window.lookback_days".into(),
                message: format!("{} days before {end} is out of range", self.lookback_days),
            })?;
        Ok((start, end))
    }

    pub fn windows(&self, end: NaiveDate) -> Result<TimeWindowList, ConfigError> {
        let (start, end) = self.date_range(end)?;
        Ok(generate_windows(start, end, self.hour_step))
    }
}

impl IngestorConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the exchange would refuse or silently truncate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let row_limit = self.harvest.row_limit;
        if !(1..=DEFAULT_ROW_LIMIT).contains(&row_limit) {
            return Err(ConfigError::Invalid {
                field: "harvest.row_limit".into(),
                message: format!("must be between 1 and {DEFAULT_ROW_LIMIT}, got {row_limit}"),
            });
        }

        let interval = self.harvest.interval;
        let max_step = interval.max_hour_step(row_limit);
        if max_step.is_none_or(|max| self.window.hour_step > max) {
            return Err(ConfigError::Invalid {
                field: "window.hour_step".into(),
                message: format!(
                    "{}h windows of {interval} candles exceed the {row_limit}-row page limit (max {})",
                    self.window.hour_step,
                    max_step.map_or(0, NonZeroU32::get),
                ),
            });
        }
        Ok(())
    }

    pub fn harvest_config(&self) -> HarvestConfig {
        let h = &self.harvest;
        HarvestConfig {
            category: h.category,
            interval: h.interval,
            concurrency: h.concurrency,
            row_limit: h.row_limit,
            retry: RetryPolicy {
                max_attempts: h.max_attempts,
                delay: Duration::from_secs(h.retry_delay_secs),
            },
            stagger: Duration::from_millis(h.stagger_ms),
            verbose: h.verbose,
        }
    }

    pub fn bybit_settings(&self) -> BybitSettings {
        BybitSettings {
            base_url: self.exchange.base_url.clone(),
            requests_per_second: self.exchange.requests_per_second,
            timeout: Duration::from_secs(self.exchange.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = write("");
        let config = IngestorConfig::load(file.path()).unwrap();
        assert_eq!(config, IngestorConfig::default());

        let harvest = config.harvest_config();
        assert_eq!(harvest.concurrency.get(), 50);
        assert_eq!(harvest.retry.max_attempts.get(), 10);
        assert_eq!(harvest.retry.delay, Duration::from_secs(30));
        assert_eq!(harvest.stagger, Duration::from_millis(200));
        assert_eq!(harvest, HarvestConfig::default());
    }

    #[test]
    fn partial_sections_override_only_given_keys() {
        let file = write(
            r#"
            [harvest]
            category = "spot"
            interval = "5"
            concurrency = 4

            [window]
            hour_step = 48
            "#,
        );
        let config = IngestorConfig::load(file.path()).unwrap();
        assert_eq!(config.harvest.category, Category::Spot);
        assert_eq!(config.harvest.interval, KlineInterval::minutes(5).unwrap());
        assert_eq!(config.harvest.concurrency.get(), 4);
        assert_eq!(config.harvest.row_limit, 1000);
        assert_eq!(config.window.lookback_days, 10);
        assert_eq!(config.exchange.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn oversized_hour_step_is_rejected() {
        let file = write("[window]\nhour_step = 17\n");
        let err = IngestorConfig::load(file.path()).unwrap_err();
        match err {
            ConfigError::Invalid { field, message } => {
                assert_eq!(field, "window.hour_step");
                assert!(message.contains("max 16"), "{message}");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn zero_concurrency_fails_to_parse() {
        let file = write("[harvest]\nconcurrency = 0\n");
        assert!(matches!(
            IngestorConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn unknown_interval_fails_to_parse() {
        let file = write("[harvest]\ninterval = \"7\"\n");
        assert!(matches!(
            IngestorConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn window_range_ends_on_given_date() {
        let window = WindowConfig {
            lookback_days: 2,
            hour_step: nonzero!(12u32),
        };
        let end = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(
            window.date_range(end).unwrap(),
            (NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(), end)
        );
        assert_eq!(window.windows(end).unwrap().len(), 5);
    }

    #[test]
    fn huge_lookback_is_an_error_not_a_panic() {
        let window = WindowConfig {
            lookback_days: u32::MAX,
            hour_step: nonzero!(16u32),
        };
        let end = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        match window.windows(end) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "window.lookback_days"),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }
}
