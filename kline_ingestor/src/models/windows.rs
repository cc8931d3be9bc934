//! Time boundaries for paginated kline requests.

use std::num::NonZeroU32;

use chrono::{NaiveDate, TimeDelta};

/// Millisecond-epoch boundaries, strictly increasing and spaced `hour_step`
/// hours apart starting at the first date's midnight UTC.
///
/// A list of one element means "one open-ended page from this instant";
/// otherwise each consecutive pair is one `[start, end]` page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindowList(Vec<i64>);

impl TimeWindowList {
    /// Wraps caller-supplied boundaries, sorting them and dropping repeats.
    pub fn from_stamps(mut stamps: Vec<i64>) -> Self {
        stamps.sort_unstable();
        stamps.dedup();
        Self(stamps)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<i64> {
        self.0.first().copied()
    }

    /// Consecutive `(start, end)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }
}

impl From<TimeWindowList> for Vec<i64> {
    fn from(list: TimeWindowList) -> Self {
        list.0
    }
}

/// Steps from `start` midnight UTC in `hour_step` increments up to and
/// including `end` midnight UTC.
///
/// `start > end` yields an empty list.
pub fn generate_windows(start: NaiveDate, end: NaiveDate, hour_step: NonZeroU32) -> TimeWindowList {
    let step = TimeDelta::hours(i64::from(hour_step.get()));
    let end = end.and_time(chrono::NaiveTime::MIN).and_utc();

    let mut current = start.and_time(chrono::NaiveTime::MIN).and_utc();
    let mut stamps = Vec::new();
    while current <= end {
        stamps.push(current.timestamp_millis());
        current += step;
    }
    TimeWindowList(stamps)
}
