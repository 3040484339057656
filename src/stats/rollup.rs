//! Bucketing and summary statistics

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::range::{month_start, week_start};

/// Granularity of a returned series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Daily,
    /// Weeks start on Sunday
    Weekly,
    Monthly,
}

impl Aggregation {
    pub const ALL: [Aggregation; 3] = [Aggregation::Daily, Aggregation::Weekly, Aggregation::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Daily => "daily",
            Aggregation::Weekly => "weekly",
            Aggregation::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Some(Aggregation::Daily),
            "weekly" | "week" => Some(Aggregation::Weekly),
            "monthly" | "month" => Some(Aggregation::Monthly),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Aggregation::Daily => "One point per day",
            Aggregation::Weekly => "Average of each Sunday-to-Saturday week's non-null days",
            Aggregation::Monthly => "Average of each calendar month's non-null days",
        }
    }

    /// Date identifying the bucket `date` falls in
    pub fn bucket_key(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Aggregation::Daily => date,
            Aggregation::Weekly => week_start(date),
            Aggregation::Monthly => month_start(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    /// Null when nothing was recorded, distinct from zero
    pub value: Option<f64>,
    /// Category name or note text, daily points only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TimeSeriesPoint {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self {
            date,
            value,
            label: None,
        }
    }
}

/// Group daily points into buckets, each the mean of its non-null values.
///
/// Daily is the identity. A bucket with no non-null days is a null point.
pub fn bucket(points: &[TimeSeriesPoint], aggregation: Aggregation) -> Vec<TimeSeriesPoint> {
    if aggregation == Aggregation::Daily {
        return points.to_vec();
    }

    let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for point in points {
        let values = buckets.entry(aggregation.bucket_key(point.date)).or_default();
        if let Some(value) = point.value {
            values.push(value);
        }
    }

    buckets
        .into_iter()
        .map(|(key, values)| TimeSeriesPoint::new(key, mean(&values)))
        .collect()
}

/// Summary of a series' non-null values; all null when there are none
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub total: Option<f64>,
}

pub fn summarize(points: &[TimeSeriesPoint]) -> Summary {
    let values: Vec<f64> = points.iter().filter_map(|p| p.value).collect();
    if values.is_empty() {
        return Summary::default();
    }

    let total: f64 = values.iter().sum();
    Summary {
        average: Some(total / values.len() as f64),
        min: values.iter().copied().reduce(f64::min),
        max: values.iter().copied().reduce(f64::max),
        total: Some(total),
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(start: &str, values: &[Option<f64>]) -> Vec<TimeSeriesPoint> {
        date(start)
            .iter_days()
            .zip(values)
            .map(|(d, v)| TimeSeriesPoint::new(d, *v))
            .collect()
    }

    #[test]
    fn test_summarize_all_null() {
        let points = series("2024-01-01", &[None, None, None]);
        assert_eq!(summarize(&points), Summary::default());
        assert_eq!(summarize(&[]), Summary::default());
    }

    #[test]
    fn test_summarize_counts_zero_but_not_null() {
        let points = series("2024-01-01", &[Some(500.0), Some(0.0), None]);
        let summary = summarize(&points);
        assert_eq!(summary.average, Some(250.0));
        assert_eq!(summary.min, Some(0.0));
        assert_eq!(summary.max, Some(500.0));
        assert_eq!(summary.total, Some(500.0));
    }

    #[test]
    fn test_daily_is_identity() {
        let points = series("2024-01-01", &[Some(1.0), None, Some(3.0)]);
        assert_eq!(bucket(&points, Aggregation::Daily), points);
    }

    #[test]
    fn test_weekly_bucket_averages_non_null_days() {
        // 2024-03-10 is a Sunday
        let points = series(
            "2024-03-10",
            &[Some(10.0), None, Some(20.0), None, None, Some(30.0), None],
        );
        let weekly = bucket(&points, Aggregation::Weekly);
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].date, date("2024-03-10"));
        assert_eq!(weekly[0].value, Some(20.0));
    }

    #[test]
    fn test_weekly_bucket_keys_on_sunday() {
        // Wednesday through the following Tuesday spans two weeks
        let points = series("2024-03-13", &[Some(1.0); 7]);
        let weekly = bucket(&points, Aggregation::Weekly);
        let keys: Vec<_> = weekly.iter().map(|p| p.date).collect();
        assert_eq!(keys, vec![date("2024-03-10"), date("2024-03-17")]);
    }

    #[test]
    fn test_empty_week_is_null() {
        let mut points = series("2024-03-10", &[Some(4.0); 7]);
        points.extend(series("2024-03-17", &[None; 7]));
        let weekly = bucket(&points, Aggregation::Weekly);
        assert_eq!(weekly[1].value, None);
        assert_eq!(summarize(&weekly).average, Some(4.0));
    }

    #[test]
    fn test_monthly_bucket_per_calendar_month() {
        let mut points = series("2024-01-30", &[Some(10.0), Some(20.0)]);
        points.extend(series("2024-02-01", &[Some(100.0), Some(200.0), Some(300.0)]));
        let monthly = bucket(&points, Aggregation::Monthly);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].date, date("2024-01-01"));
        assert_eq!(monthly[0].value, Some(15.0));
        assert_eq!(monthly[1].date, date("2024-02-01"));
        assert_eq!(monthly[1].value, Some(200.0));
    }

    #[test]
    fn test_parse_aggregation() {
        assert_eq!(Aggregation::from_str("Weekly"), Some(Aggregation::Weekly));
        assert_eq!(Aggregation::from_str("hourly"), None);
        assert_eq!(Aggregation::default(), Aggregation::Daily);
    }
}
