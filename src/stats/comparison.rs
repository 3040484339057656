//! Current value vs. reference period comparison

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::range::DateRange;
use super::rollup::{mean, TimeSeriesPoint};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub current_date: NaiveDate,
    pub current_value: Option<f64>,
    pub reference_start: NaiveDate,
    pub reference_end: NaiveDate,
    /// Mean of the reference window's non-null days, excluding `current_date`
    pub reference_average: Option<f64>,
    pub reference_days: usize,
    /// Positive when the current value is above the reference average
    pub absolute_change: Option<f64>,
    /// Null when the reference average is null or zero
    pub percent_change: Option<f64>,
}

/// Compare a day's value against the average of a reference window.
///
/// The current date never counts toward its own reference, whether or not
/// it falls inside `reference`.
pub fn compare(
    current_value: Option<f64>,
    current_date: NaiveDate,
    reference: DateRange,
    reference_points: &[TimeSeriesPoint],
) -> ComparisonResult {
    let values: Vec<f64> = reference_points
        .iter()
        .filter(|p| p.date != current_date && reference.contains(p.date))
        .filter_map(|p| p.value)
        .collect();
    let reference_average = mean(&values);

    let absolute_change = match (current_value, reference_average) {
        (Some(current), Some(reference)) => Some(current - reference),
        _ => None,
    };
    let percent_change = match (absolute_change, reference_average) {
        (Some(change), Some(reference)) if reference != 0.0 => Some(change / reference * 100.0),
        _ => None,
    };

    ComparisonResult {
        current_date,
        current_value,
        reference_start: reference.start_date,
        reference_end: reference.end_date,
        reference_average,
        reference_days: values.len(),
        absolute_change,
        percent_change,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_current_date_is_excluded() {
        let today = date("2024-05-08");
        let points = vec![
            TimeSeriesPoint::new(today - Duration::days(2), Some(149.0)),
            TimeSeriesPoint::new(today - Duration::days(1), Some(148.0)),
            TimeSeriesPoint::new(today, Some(150.0)),
        ];
        let reference = DateRange::new(today - Duration::days(7), today).unwrap();

        let result = compare(Some(150.0), today, reference, &points);
        assert_eq!(result.reference_average, Some(148.5));
        assert_eq!(result.reference_days, 2);
        assert_eq!(result.absolute_change, Some(1.5));
        let percent = result.percent_change.unwrap();
        assert!((percent - 1.5 / 148.5 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_reference_has_no_percent() {
        let reference = DateRange::new(date("2024-01-01"), date("2024-01-03")).unwrap();
        let points = vec![
            TimeSeriesPoint::new(date("2024-01-01"), Some(0.0)),
            TimeSeriesPoint::new(date("2024-01-02"), Some(0.0)),
        ];
        let result = compare(Some(3.0), date("2024-01-10"), reference, &points);
        assert_eq!(result.reference_average, Some(0.0));
        assert_eq!(result.absolute_change, Some(3.0));
        assert_eq!(result.percent_change, None);
    }

    #[test]
    fn test_null_operands() {
        let reference = DateRange::new(date("2024-01-01"), date("2024-01-03")).unwrap();
        let empty = compare(Some(3.0), date("2024-01-10"), reference, &[]);
        assert_eq!(empty.reference_average, None);
        assert_eq!(empty.absolute_change, None);
        assert_eq!(empty.percent_change, None);

        let points = vec![TimeSeriesPoint::new(date("2024-01-01"), Some(10.0))];
        let no_current = compare(None, date("2024-01-10"), reference, &points);
        assert_eq!(no_current.reference_average, Some(10.0));
        assert_eq!(no_current.absolute_change, None);
        assert_eq!(no_current.percent_change, None);
    }

    #[test]
    fn test_lower_value_is_negative_change() {
        let reference = DateRange::new(date("2024-01-01"), date("2024-01-02")).unwrap();
        let points = vec![
            TimeSeriesPoint::new(date("2024-01-01"), Some(200.0)),
            TimeSeriesPoint::new(date("2024-01-02"), Some(200.0)),
        ];
        let result = compare(Some(150.0), date("2024-01-05"), reference, &points);
        assert_eq!(result.absolute_change, Some(-50.0));
        assert_eq!(result.percent_change, Some(-25.0));
    }
}
