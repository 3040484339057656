//! Date range resolution
//!
//! Turns a query's declared range (preset, custom bounds or mesocycle) into
//! concrete inclusive calendar dates. All arithmetic is on `NaiveDate`
//! relative to the caller's local "today"; nothing passes through UTC.

use chrono::{Datelike, Days, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::{StatsError, StatsResult};
use super::store::RecordStore;

/// Longest range a query may span, about a century of days
pub const MAX_RANGE_DAYS: i64 = 36_525;

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> StatsResult<Self> {
        if start_date > end_date {
            return Err(StatsError::InvalidRange(format!(
                "start date {} is after end date {}",
                start_date, end_date
            )));
        }
        Ok(Self { start_date, end_date })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start_date: date,
            end_date: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Every date in the range, ascending
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date.iter_days().take_while(move |d| *d <= end)
    }

    pub fn num_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Reject ranges longer than [`MAX_RANGE_DAYS`]
    pub fn check_span(self) -> StatsResult<Self> {
        if self.num_days() > MAX_RANGE_DAYS {
            return Err(StatsError::InvalidRange(format!(
                "range {} to {} spans {} days; at most {} are allowed",
                self.start_date,
                self.end_date,
                self.num_days(),
                MAX_RANGE_DAYS
            )));
        }
        Ok(self)
    }
}

/// Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// First day of `date`'s month
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

/// Named range relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// The last N days including today
    LastDays(u64),
    ThisWeek,
    ThisMonth,
    ThisYear,
    AllTime,
}

impl Preset {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "this_week" => Some(Preset::ThisWeek),
            "this_month" => Some(Preset::ThisMonth),
            "this_year" => Some(Preset::ThisYear),
            "all_time" => Some(Preset::AllTime),
            _ => s
                .strip_prefix("last_")
                .and_then(|rest| rest.strip_suffix("_days"))
                .and_then(|n| n.parse::<u64>().ok())
                .map(Preset::LastDays),
        }
    }
}

/// Supported `date_range_type` values and what they select
pub const DATE_RANGE_TYPES: &[(&str, &str)] = &[
    ("last_7_days", "The last 7 days including today"),
    ("last_30_days", "The last 30 days including today"),
    ("last_90_days", "The last 90 days including today"),
    ("last_<N>_days", "The last N days including today, for 1 <= N <= 36525"),
    ("this_week", "Sunday of the current week through today"),
    ("this_month", "First of the current month through today"),
    ("this_year", "January 1 through today"),
    ("all_time", "Earliest log entry through today"),
    ("custom", "Explicit start_date and end_date (inclusive)"),
    ("mesocycle", "The stored start and end dates of mesocycle_id"),
];

/// A declared range, checked for shape but not yet resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    Preset(Preset),
    Custom(DateRange),
    Mesocycle(i64),
}

impl RangeSpec {
    /// Parse the request fields into a range spec without touching storage
    pub fn parse(
        date_range_type: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        mesocycle_id: Option<i64>,
    ) -> StatsResult<Self> {
        match date_range_type {
            "custom" => match (start_date, end_date) {
                (Some(start), Some(end)) => Ok(RangeSpec::Custom(DateRange::new(start, end)?.check_span()?)),
                _ => Err(StatsError::InvalidRange(
                    "custom range requires start_date and end_date".to_string(),
                )),
            },
            "mesocycle" => mesocycle_id.map(RangeSpec::Mesocycle).ok_or_else(|| {
                StatsError::InvalidRange("mesocycle range requires mesocycle_id".to_string())
            }),
            other => match Preset::from_str(other) {
                Some(Preset::LastDays(0)) => Err(StatsError::InvalidRange(
                    "last_N_days requires N >= 1".to_string(),
                )),
                Some(Preset::LastDays(n)) if n > MAX_RANGE_DAYS as u64 => Err(StatsError::InvalidRange(
                    format!("last_{}_days exceeds the {} day limit", n, MAX_RANGE_DAYS),
                )),
                Some(preset) => Ok(RangeSpec::Preset(preset)),
                None => Err(StatsError::InvalidRange(format!(
                    "unknown date range type: {}",
                    other
                ))),
            },
        }
    }
}

/// Resolve a range spec against `today`. Reads storage only for
/// `all_time` and mesocycle ranges.
pub fn resolve(spec: &RangeSpec, today: NaiveDate, store: &dyn RecordStore) -> StatsResult<DateRange> {
    resolve_unchecked(spec, today, store)?.check_span()
}

fn resolve_unchecked(spec: &RangeSpec, today: NaiveDate, store: &dyn RecordStore) -> StatsResult<DateRange> {
    match *spec {
        RangeSpec::Custom(range) => Ok(range),
        RangeSpec::Mesocycle(id) => mesocycle_range(id, store),
        RangeSpec::Preset(preset) => {
            let start = match preset {
                Preset::LastDays(n) => today
                    .checked_sub_days(Days::new(n.saturating_sub(1)))
                    .ok_or_else(|| StatsError::InvalidRange(format!("last_{}_days is out of range", n)))?,
                Preset::ThisWeek => week_start(today),
                Preset::ThisMonth => month_start(today),
                Preset::ThisYear => today - Duration::days(today.ordinal0() as i64),
                Preset::AllTime => match store.earliest_log_entry_date()? {
                    Some(earliest) => earliest.min(today),
                    None => today,
                },
            };
            DateRange::new(start, today)
        }
    }
}

/// A mesocycle's stored dates, verbatim
pub fn mesocycle_range(id: i64, store: &dyn RecordStore) -> StatsResult<DateRange> {
    let mesocycle = store
        .mesocycle(id)?
        .ok_or_else(|| StatsError::InvalidRange(format!("mesocycle {} not found", id)))?;
    DateRange::new(mesocycle.start_date, mesocycle.end_date)
}
