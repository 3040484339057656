//! Stats query executor
//!
//! Validates a request, resolves its ranges, reads the covered log entries
//! once and assembles one [`MetricResult`] per requested metric. Either every
//! metric is computed or the query fails.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::aggregator::{daily_series, MetricFilters, TrainingFilter};
use super::catalog::{self, FilterKind, MetricCategory, MetricDefinition};
use super::comparison::{compare, ComparisonResult};
use super::error::{StatsError, StatsResult};
use super::range::{self, DateRange, RangeSpec};
use super::rollup::{bucket, summarize, Aggregation, TimeSeriesPoint};
use super::store::{RecordStore, SqliteRecords};
use crate::db::Database;
use crate::models::{CardioType, LogEntry};

// ============================================================================
// Request / Response
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsQueryRequest {
    pub metrics: Vec<String>,
    pub date_range_type: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub mesocycle_id: Option<i64>,
    #[serde(default)]
    pub aggregation: Aggregation,

    /// none | exercise | movement_pattern | workout | mesocycle
    #[serde(default)]
    pub training_filter_type: Option<String>,
    #[serde(default)]
    pub exercise_id: Option<i64>,
    #[serde(default)]
    pub movement_pattern_id: Option<i64>,
    #[serde(default)]
    pub workout_id: Option<i64>,
    #[serde(default)]
    pub training_mesocycle_id: Option<i64>,

    /// none or a cardio type
    #[serde(default)]
    pub cardio_filter_type: Option<String>,
    #[serde(default)]
    pub supplement_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub compound_ids: Option<Vec<i64>>,

    #[serde(default)]
    pub comparison: Option<ComparisonRequest>,
}

/// Compare each metric's value on `date` against a reference range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonRequest {
    /// Defaults to the end of the query range
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub date_range_type: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub mesocycle_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricResult {
    pub metric: String,
    pub label: String,
    pub unit: String,
    pub category: MetricCategory,
    pub data: Vec<TimeSeriesPoint>,
    pub average: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsQueryResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub aggregation: Aggregation,
    pub metrics: Vec<MetricResult>,
}

/// Supported `training_filter_type` values
pub const TRAINING_FILTER_TYPES: &[&str] = &["none", "exercise", "movement_pattern", "workout", "mesocycle"];

// ============================================================================
// Validation
// ============================================================================

/// Training selection before any mesocycle lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrainingSelector {
    Ready(TrainingFilter),
    Mesocycle(i64),
}

/// A request that passed validation
#[derive(Debug)]
struct QueryPlan {
    metrics: Vec<&'static MetricDefinition>,
    range: RangeSpec,
    aggregation: Aggregation,
    training: Option<TrainingSelector>,
    filters: MetricFilters,
    comparison: Option<(Option<NaiveDate>, RangeSpec)>,
}

fn parse_training(request: &StatsQueryRequest) -> StatsResult<Option<TrainingSelector>> {
    let kind = request.training_filter_type.as_deref().unwrap_or("none");
    let need = |id: Option<i64>, field: &str| {
        id.ok_or_else(|| {
            StatsError::InvalidRequest(format!("training_filter_type '{}' requires {}", kind, field))
        })
    };

    let selector = match kind {
        "none" | "" => return Ok(None),
        "exercise" => TrainingSelector::Ready(TrainingFilter::Exercise(need(request.exercise_id, "exercise_id")?)),
        "movement_pattern" => TrainingSelector::Ready(TrainingFilter::MovementPattern(need(
            request.movement_pattern_id,
            "movement_pattern_id",
        )?)),
        "workout" => TrainingSelector::Ready(TrainingFilter::Workout(need(request.workout_id, "workout_id")?)),
        "mesocycle" => TrainingSelector::Mesocycle(need(request.training_mesocycle_id, "training_mesocycle_id")?),
        other => {
            return Err(StatsError::InvalidRequest(format!(
                "unknown training_filter_type: {}",
                other
            )))
        }
    };
    Ok(Some(selector))
}

fn parse_cardio(request: &StatsQueryRequest) -> StatsResult<Option<CardioType>> {
    match request.cardio_filter_type.as_deref() {
        None | Some("none") | Some("") => Ok(None),
        Some(kind) => CardioType::from_str(kind)
            .map(Some)
            .ok_or_else(|| StatsError::InvalidRequest(format!("unknown cardio_filter_type: {}", kind))),
    }
}

/// Check the request without any I/O
fn validate(request: &StatsQueryRequest) -> StatsResult<QueryPlan> {
    if request.metrics.is_empty() {
        return Err(StatsError::EmptyQuery);
    }
    let metrics = request
        .metrics
        .iter()
        .map(|id| catalog::lookup(id))
        .collect::<StatsResult<Vec<_>>>()?;

    let training = parse_training(request)?;
    let filters = MetricFilters {
        training: None,
        cardio_type: parse_cardio(request)?,
        supplement_ids: request.supplement_ids.clone().unwrap_or_default(),
        compound_ids: request.compound_ids.clone().unwrap_or_default(),
    };

    for metric in &metrics {
        let Some(required) = metric.required_filter() else {
            continue;
        };
        let present = match required {
            FilterKind::Training => training.is_some(),
            other => filters.has(other),
        };
        if !present {
            return Err(StatsError::MissingRequiredFilter {
                metric: metric.id.to_string(),
                filter: required.as_str(),
            });
        }
    }

    let range = RangeSpec::parse(
        &request.date_range_type,
        request.start_date,
        request.end_date,
        request.mesocycle_id,
    )?;

    let comparison = match &request.comparison {
        Some(c) => Some((
            c.date,
            RangeSpec::parse(&c.date_range_type, c.start_date, c.end_date, c.mesocycle_id)?,
        )),
        None => None,
    };

    Ok(QueryPlan {
        metrics,
        range,
        aggregation: request.aggregation,
        training,
        filters,
        comparison,
    })
}

// ============================================================================
// Execution
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Validating,
    Resolving,
    Aggregating,
    Comparing,
    Done,
    Failed,
}

struct Execution {
    phase: Phase,
}

impl Execution {
    fn new() -> Self {
        tracing::debug!(phase = ?Phase::Validating, "stats query started");
        Self {
            phase: Phase::Validating,
        }
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "stats query phase");
        self.phase = phase;
    }

    fn finish<T>(&mut self, result: StatsResult<T>) -> StatsResult<T> {
        match &result {
            Ok(_) => self.enter(Phase::Done),
            Err(e) => {
                tracing::warn!(phase = ?self.phase, error = %e, "stats query failed");
                self.phase = Phase::Failed;
            }
        }
        result
    }

    fn run(&mut self, plan: &QueryPlan, store: &dyn RecordStore, today: NaiveDate) -> StatsResult<StatsQueryResponse> {
        self.enter(Phase::Resolving);
        let range = range::resolve(&plan.range, today, store)?;
        let mut filters = plan.filters.clone();
        filters.training = match plan.training {
            Some(TrainingSelector::Ready(filter)) => Some(filter),
            Some(TrainingSelector::Mesocycle(id)) => {
                Some(TrainingFilter::Mesocycle(range::mesocycle_range(id, store)?))
            }
            None => None,
        };
        let comparison = match &plan.comparison {
            Some((date, spec)) => Some((date.unwrap_or(range.end_date), range::resolve(spec, today, store)?)),
            None => None,
        };
        tracing::debug!(
            start = %range.start_date,
            end = %range.end_date,
            metrics = plan.metrics.len(),
            "resolved stats range"
        );

        self.enter(Phase::Aggregating);
        let mut needed = vec![range];
        if let Some((current_date, reference)) = comparison {
            needed.push(reference);
            needed.push(DateRange::single(current_date));
        }
        let mut entries: BTreeMap<NaiveDate, LogEntry> = BTreeMap::new();
        for window in covering_windows(needed) {
            entries.extend(store.log_entries(&window)?.into_iter().map(|entry| (entry.date, entry)));
        }

        let mut results = Vec::with_capacity(plan.metrics.len());
        for metric in &plan.metrics {
            let daily = daily_series(&entries, range, metric, &filters)?;
            let data = bucket(&daily, plan.aggregation);
            let summary = summarize(&data);
            results.push(MetricResult {
                metric: metric.id.to_string(),
                label: metric.label.to_string(),
                unit: metric.unit.to_string(),
                category: metric.category,
                data,
                average: summary.average,
                min_value: summary.min,
                max_value: summary.max,
                total: summary.total,
                comparison: None,
            });
        }

        if let Some((current_date, reference)) = comparison {
            self.enter(Phase::Comparing);
            for (metric, result) in plan.metrics.iter().zip(results.iter_mut()) {
                result.comparison = Some(compare_metric(&entries, current_date, reference, metric, &filters)?);
            }
        }

        Ok(StatsQueryResponse {
            start_date: range.start_date,
            end_date: range.end_date,
            aggregation: plan.aggregation,
            metrics: results,
        })
    }
}

/// Merge overlapping or adjacent ranges so each date is read at most once
/// and gaps between distant ranges are never read
fn covering_windows(mut ranges: Vec<DateRange>) -> Vec<DateRange> {
    ranges.sort_by_key(|r| r.start_date);
    let mut windows: Vec<DateRange> = Vec::with_capacity(ranges.len());
    for next in ranges {
        match windows.last_mut() {
            Some(last) if next.start_date <= last.end_date.succ_opt().unwrap_or(last.end_date) => {
                last.end_date = last.end_date.max(next.end_date);
            }
            _ => windows.push(next),
        }
    }
    windows
}

/// A metric's value on `current_date` against its daily values over `reference`
fn compare_metric(
    entries: &BTreeMap<NaiveDate, LogEntry>,
    current_date: NaiveDate,
    reference: DateRange,
    metric: &MetricDefinition,
    filters: &MetricFilters,
) -> StatsResult<ComparisonResult> {
    let current = daily_series(entries, DateRange::single(current_date), metric, filters)?;
    let reference_points = daily_series(entries, reference, metric, filters)?;
    let current_value = current.first().and_then(|p| p.value);
    Ok(compare(current_value, current_date, reference, &reference_points))
}

/// Run a query against the database, on one pooled connection
pub fn execute(db: &Database, request: &StatsQueryRequest, today: NaiveDate) -> StatsResult<StatsQueryResponse> {
    let mut execution = Execution::new();
    let result = validate(request).and_then(|plan| {
        let conn = db.get_conn()?;
        execution.run(&plan, &SqliteRecords::new(&conn), today)
    });
    execution.finish(result)
}

/// Run a query against any record store
pub fn execute_with(
    store: &dyn RecordStore,
    request: &StatsQueryRequest,
    today: NaiveDate,
) -> StatsResult<StatsQueryResponse> {
    let mut execution = Execution::new();
    let result = validate(request).and_then(|plan| execution.run(&plan, store, today));
    execution.finish(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodServing, Mesocycle};
    use crate::stats::store::memory::{entry, MemoryRecords};
    use chrono::Duration;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn custom(metrics: &[&str], start: &str, end: &str) -> StatsQueryRequest {
        StatsQueryRequest {
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            date_range_type: "custom".to_string(),
            start_date: Some(date(start)),
            end_date: Some(date(end)),
            ..Default::default()
        }
    }

    fn calories(servings: f64, calories: f64) -> FoodServing {
        FoodServing {
            food_id: 1,
            food_name: "rice".to_string(),
            servings,
            calories,
            protein_grams: 0.0,
            protein_complete: false,
            carbs_grams: 0.0,
            fiber_grams: 0.0,
            sugar_grams: 0.0,
            fat_grams: 0.0,
        }
    }

    fn weights(values: &[(&str, f64)]) -> MemoryRecords {
        MemoryRecords::with_entries(
            values
                .iter()
                .map(|(d, w)| {
                    let mut e = entry(date(d));
                    e.morning_weight = Some(*w);
                    e
                })
                .collect(),
        )
    }

    #[test]
    fn test_calories_end_to_end() {
        let mut first = entry(date("2024-01-01"));
        first.foods = vec![calories(2.0, 250.0)];
        let second = entry(date("2024-01-02"));
        let store = MemoryRecords::with_entries(vec![first, second]);

        let request = custom(&["calories"], "2024-01-01", "2024-01-02");
        let response = execute_with(&store, &request, date("2024-06-01")).unwrap();

        assert_eq!(response.start_date, date("2024-01-01"));
        assert_eq!(response.end_date, date("2024-01-02"));
        let result = &response.metrics[0];
        let values: Vec<_> = result.data.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(500.0), Some(0.0)]);
        assert_eq!(result.average, Some(250.0));
        assert_eq!(result.min_value, Some(0.0));
        assert_eq!(result.max_value, Some(500.0));
        assert_eq!(result.total, Some(500.0));
        assert!(result.comparison.is_none());
    }

    #[test]
    fn test_validation_happens_before_reads() {
        let store = MemoryRecords::default();

        let empty = custom(&[], "2024-01-01", "2024-01-02");
        assert!(matches!(execute_with(&store, &empty, date("2024-01-02")), Err(StatsError::EmptyQuery)));

        let unknown = custom(&["calories", "vo2max"], "2024-01-01", "2024-01-02");
        assert!(matches!(
            execute_with(&store, &unknown, date("2024-01-02")),
            Err(StatsError::UnknownMetric(id)) if id == "vo2max"
        ));

        let missing = custom(&["exercise_weight"], "2024-01-01", "2024-01-02");
        assert!(matches!(
            execute_with(&store, &missing, date("2024-01-02")),
            Err(StatsError::MissingRequiredFilter { filter: "training", .. })
        ));

        let mut missing_supplements = custom(&["supplement_servings"], "2024-01-01", "2024-01-02");
        missing_supplements.supplement_ids = Some(Vec::new());
        assert!(matches!(
            execute_with(&store, &missing_supplements, date("2024-01-02")),
            Err(StatsError::MissingRequiredFilter { .. })
        ));

        let inverted = custom(&["weight"], "2024-02-01", "2024-01-01");
        assert!(matches!(
            execute_with(&store, &inverted, date("2024-01-02")),
            Err(StatsError::InvalidRange(_))
        ));

        assert_eq!(store.reads.get(), 0);
    }

    #[test]
    fn test_oversized_range_rejected_before_reads() {
        let store = weights(&[("2024-01-01", 180.0)]);

        let request = StatsQueryRequest {
            metrics: vec!["weight".to_string(), "calories".to_string()],
            date_range_type: "last_60000000_days".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            execute_with(&store, &request, date("2024-01-02")),
            Err(StatsError::InvalidRange(_))
        ));

        let request = custom(&["weight"], "0001-01-01", "9999-12-31");
        assert!(matches!(
            execute_with(&store, &request, date("2024-01-02")),
            Err(StatsError::InvalidRange(_))
        ));

        let mut request = custom(&["weight"], "2024-01-01", "2024-01-02");
        request.comparison = Some(ComparisonRequest {
            date: None,
            date_range_type: "last_60000000_days".to_string(),
            start_date: None,
            end_date: None,
            mesocycle_id: None,
        });
        assert!(matches!(
            execute_with(&store, &request, date("2024-01-02")),
            Err(StatsError::InvalidRange(_))
        ));

        assert_eq!(store.reads.get(), 0);
    }

    #[test]
    fn test_covering_windows() {
        let r = |a: &str, b: &str| DateRange::new(date(a), date(b)).unwrap();
        let windows = covering_windows(vec![
            r("2024-03-01", "2024-03-07"),
            DateRange::single(date("2024-03-08")),
            r("2020-01-01", "2020-01-03"),
            r("2024-03-05", "2024-03-06"),
        ]);
        assert_eq!(windows, vec![r("2020-01-01", "2020-01-03"), r("2024-03-01", "2024-03-08")]);
    }

    #[test]
    fn test_distant_comparison_reads_only_needed_dates() {
        let store = weights(&[
            ("2020-01-01", 200.0),
            ("2020-01-03", 196.0),
            ("2022-06-15", 999.0),
            ("2024-01-05", 181.0),
            ("2024-01-07", 180.0),
        ]);
        let mut request = custom(&["weight"], "2024-01-01", "2024-01-07");
        request.comparison = Some(ComparisonRequest {
            date: None,
            date_range_type: "custom".to_string(),
            start_date: Some(date("2020-01-01")),
            end_date: Some(date("2020-01-03")),
            mesocycle_id: None,
        });

        let response = execute_with(&store, &request, date("2024-01-07")).unwrap();
        let comparison = response.metrics[0].comparison.as_ref().unwrap();
        assert_eq!(comparison.current_value, Some(180.0));
        assert_eq!(comparison.reference_average, Some(198.0));
        assert_eq!(response.metrics[0].average, Some(180.5));
        // one read per disjoint window
        assert_eq!(store.reads.get(), 2);
    }

    #[test]
    fn test_upstream_failure_fails_query() {
        let store = MemoryRecords {
            fail: true,
            ..Default::default()
        };
        let request = custom(&["weight"], "2024-01-01", "2024-01-07");
        let err = execute_with(&store, &request, date("2024-01-07")).unwrap_err();
        assert!(matches!(err, StatsError::UpstreamRead(_)));
        assert!(!err.is_request_error());
    }

    #[test]
    fn test_weekly_aggregation() {
        // 2024-03-10 is a Sunday
        let store = weights(&[("2024-03-10", 10.0), ("2024-03-12", 20.0), ("2024-03-15", 30.0)]);
        let mut request = custom(&["weight"], "2024-03-10", "2024-03-16");
        request.aggregation = Aggregation::Weekly;

        let response = execute_with(&store, &request, date("2024-03-16")).unwrap();
        let data = &response.metrics[0].data;
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].value, Some(20.0));
        assert_eq!(response.metrics[0].average, Some(20.0));
    }

    #[test]
    fn test_comparison_excludes_current_date() {
        let today = date("2024-05-08");
        let fmt = |d: NaiveDate| d.format("%Y-%m-%d").to_string();
        let (d0, d1, d2) = (fmt(today), fmt(today - Duration::days(1)), fmt(today - Duration::days(2)));
        let store = weights(&[(d0.as_str(), 150.0), (d1.as_str(), 148.0), (d2.as_str(), 149.0)]);

        let mut request = StatsQueryRequest {
            metrics: vec!["weight".to_string()],
            date_range_type: "last_7_days".to_string(),
            ..Default::default()
        };
        request.comparison = Some(ComparisonRequest {
            date: None,
            date_range_type: "custom".to_string(),
            start_date: Some(today - Duration::days(7)),
            end_date: Some(today),
            mesocycle_id: None,
        });

        let response = execute_with(&store, &request, today).unwrap();
        let comparison = response.metrics[0].comparison.as_ref().unwrap();
        assert_eq!(comparison.current_date, today);
        assert_eq!(comparison.current_value, Some(150.0));
        assert_eq!(comparison.reference_average, Some(148.5));
        assert_eq!(comparison.absolute_change, Some(1.5));
    }

    #[test]
    fn test_training_mesocycle_filter_resolves() {
        let store = MemoryRecords {
            mesocycles: vec![Mesocycle {
                id: 1,
                name: "Strength".to_string(),
                description: None,
                start_date: date("2024-01-01"),
                end_date: date("2024-01-31"),
            }],
            ..Default::default()
        };

        let mut request = custom(&["exercise_sets"], "2024-01-01", "2024-01-03");
        request.training_filter_type = Some("mesocycle".to_string());
        request.training_mesocycle_id = Some(1);
        let response = execute_with(&store, &request, date("2024-01-03")).unwrap();
        assert_eq!(response.metrics[0].total, Some(0.0));

        request.training_mesocycle_id = Some(2);
        assert!(matches!(
            execute_with(&store, &request, date("2024-01-03")),
            Err(StatsError::InvalidRange(_))
        ));

        request.training_mesocycle_id = None;
        assert!(matches!(
            execute_with(&store, &request, date("2024-01-03")),
            Err(StatsError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_request_json_defaults() {
        let request: StatsQueryRequest = serde_json::from_str(
            r#"{"metrics":["calories"],"date_range_type":"custom","start_date":"2024-01-01","end_date":"2024-01-02"}"#,
        )
        .unwrap();
        assert_eq!(request.aggregation, Aggregation::Daily);
        assert_eq!(request.start_date, Some(date("2024-01-01")));
        assert!(request.comparison.is_none());

        let bad_cardio = StatsQueryRequest {
            cardio_filter_type: Some("rowing".to_string()),
            ..custom(&["cardio_speed"], "2024-01-01", "2024-01-02")
        };
        assert!(matches!(
            execute_with(&MemoryRecords::default(), &bad_cardio, date("2024-01-02")),
            Err(StatsError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_execute_against_sqlite() {
        use crate::models::{log_food, Food, FoodCreate, LogEntryCreate};

        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let food = Food::create(
                conn,
                &FoodCreate {
                    name: "Rice".to_string(),
                    calories: 250.0,
                    ..Default::default()
                },
            )?;
            let day = LogEntry::create(conn, &LogEntryCreate::for_date(date("2024-01-01")))?;
            LogEntry::create(conn, &LogEntryCreate::for_date(date("2024-01-02")))?;
            log_food(conn, day.id, food.id, 2.0)?;
            Ok(())
        })
        .unwrap();

        let request = custom(&["calories"], "2024-01-01", "2024-01-02");
        let response = execute(&db, &request, date("2024-01-02")).unwrap();
        assert_eq!(response.metrics[0].total, Some(500.0));
        assert_eq!(response.metrics[0].average, Some(250.0));
    }
}
