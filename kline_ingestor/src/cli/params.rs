use chrono::{NaiveDate, TimeDelta};
use indexmap::IndexSet;

use crate::{
    config::IngestorConfig,
    errors::Error,
    models::windows::TimeWindowList,
    requests::historical::HarvestConfig,
};

use super::commands::HarvestArgs;

/// Everything needed to start a harvest, resolved from config and flags.
#[derive(Debug)]
pub struct HarvestPlan {
    /// `None` means "ask the exchange for the full symbol list".
    pub symbols: Option<Vec<String>>,
    pub windows: TimeWindowList,
    pub config: HarvestConfig,
}

/// Splits a comma-separated symbol list, trimming blanks and repeats.
pub fn parse_symbols(raw: &str) -> Result<Vec<String>, Error> {
    let symbols: IndexSet<String> = raw
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    if symbols.is_empty() {
        return Err(Error::InvalidInput(format!("no symbols in {raw:?}")));
    }
    Ok(symbols.into_iter().collect())
}

/// Range end used when none is given: the day after `today`, so candles of
/// the current day are included.
pub fn default_end(today: NaiveDate) -> NaiveDate {
    today + TimeDelta::days(1)
}

impl HarvestArgs {
    /// Writes the flags that were given over `config`.
    pub fn apply(&self, config: &mut IngestorConfig) {
        if let Some(category) = self.category {
            config.harvest.category = category;
        }
        if let Some(interval) = self.interval {
            config.harvest.interval = interval;
        }
        if let Some(days) = self.days {
            config.window.lookback_days = days;
        }
        if let Some(hour_step) = self.hour_step {
            config.window.hour_step = hour_step;
        }
        if let Some(concurrency) = self.concurrency {
            config.harvest.concurrency = concurrency;
        }
    }

    /// Merges the flags into `config`, validates the result and builds the
    /// window list ending at `--end` or the day after `today`.
    pub fn plan(&self, mut config: IngestorConfig, today: NaiveDate) -> Result<HarvestPlan, Error> {
        self.apply(&mut config);
        config.validate()?;

        let symbols = self.symbols.as_deref().map(parse_symbols).transpose()?;
        let end = self.end.unwrap_or_else(|| default_end(today));
        let windows = config.window.windows(end)?;
        if windows.is_empty() {
            return Err(Error::InvalidInput(format!("empty date range ending {end}")));
        }

        Ok(HarvestPlan {
            symbols,
            windows,
            config: config.harvest_config(),
        })
    }
}
