//! Stats MCP Tools
//!
//! Catalog listings, ad-hoc queries and running saved configurations.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::models::{ChartType, StatsConfiguration};
use crate::stats::catalog::{self, Derivation, FilterKind, MetricCategory};
use crate::stats::query::TRAINING_FILTER_TYPES;
use crate::stats::range::DATE_RANGE_TYPES;
use crate::stats::{execute, Aggregation, StatsError, StatsQueryRequest, StatsQueryResponse, StatsResult};

/// Catalog entry as shown to clients
#[derive(Debug, Serialize)]
pub struct MetricInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub category: MetricCategory,
    /// Filter that must accompany this metric
    pub required_filter: Option<&'static str>,
    /// Filter this metric honors when given
    pub optional_filter: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ListMetricsResponse {
    pub metrics: Vec<MetricInfo>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct OptionInfo {
    pub id: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ListOptionsResponse {
    pub options: Vec<OptionInfo>,
}

/// Filters supplied alongside a query rather than stored with it
#[derive(Debug, Clone, Default)]
pub struct StatsFilters {
    pub training_filter_type: Option<String>,
    pub exercise_id: Option<i64>,
    pub movement_pattern_id: Option<i64>,
    pub workout_id: Option<i64>,
    pub training_mesocycle_id: Option<i64>,
    pub cardio_filter_type: Option<String>,
    pub supplement_ids: Option<Vec<i64>>,
    pub compound_ids: Option<Vec<i64>>,
}

impl StatsFilters {
    pub fn apply(self, request: &mut StatsQueryRequest) {
        request.training_filter_type = self.training_filter_type;
        request.exercise_id = self.exercise_id;
        request.movement_pattern_id = self.movement_pattern_id;
        request.workout_id = self.workout_id;
        request.training_mesocycle_id = self.training_mesocycle_id;
        request.cardio_filter_type = self.cardio_filter_type;
        request.supplement_ids = self.supplement_ids;
        request.compound_ids = self.compound_ids;
    }
}

/// Response for run_stats_configuration
#[derive(Debug, Serialize)]
pub struct RunStatsConfigurationResponse {
    pub configuration_id: i64,
    pub name: String,
    pub chart_type: ChartType,
    pub result: StatsQueryResponse,
}

// ============================================================================
// Catalog Tools
// ============================================================================

pub fn list_metrics() -> ListMetricsResponse {
    let metrics: Vec<MetricInfo> = catalog::list()
        .iter()
        .map(|m| {
            let optional = match m.derivation {
                Derivation::FilteredSum { filter, required: false, .. } => Some(filter.as_str()),
                _ => None,
            };
            MetricInfo {
                id: m.id,
                label: m.label,
                unit: m.unit,
                category: m.category,
                required_filter: m.required_filter().map(|f: FilterKind| f.as_str()),
                optional_filter: optional,
            }
        })
        .collect();
    let count = metrics.len();
    ListMetricsResponse { metrics, count }
}

pub fn list_date_range_types() -> ListOptionsResponse {
    ListOptionsResponse {
        options: DATE_RANGE_TYPES
            .iter()
            .map(|&(id, description)| OptionInfo { id, description })
            .collect(),
    }
}

pub fn list_aggregation_types() -> ListOptionsResponse {
    ListOptionsResponse {
        options: Aggregation::ALL
            .iter()
            .map(|a| OptionInfo {
                id: a.as_str(),
                description: a.description(),
            })
            .collect(),
    }
}

pub fn list_training_filter_types() -> &'static [&'static str] {
    TRAINING_FILTER_TYPES
}

// ============================================================================
// Query Tools
// ============================================================================

/// Parse an optional `YYYY-MM-DD` parameter
pub fn parse_date(value: Option<&str>, field: &str) -> StatsResult<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| StatsError::InvalidRequest(format!("{} must be YYYY-MM-DD, got '{}'", field, s))),
    }
}

pub fn parse_aggregation(value: Option<&str>) -> StatsResult<Aggregation> {
    match value {
        None => Ok(Aggregation::default()),
        Some(s) => Aggregation::from_str(s)
            .ok_or_else(|| StatsError::InvalidRequest(format!("unknown aggregation: {}", s))),
    }
}

/// Run an ad-hoc stats query
pub fn query_stats(db: &Database, request: &StatsQueryRequest, today: NaiveDate) -> StatsResult<StatsQueryResponse> {
    tracing::info!(metrics = ?request.metrics, range = %request.date_range_type, "query_stats");
    execute(db, request, today)
}

/// Build the query a saved configuration describes
pub fn configuration_request(configuration: &StatsConfiguration, filters: StatsFilters) -> StatsResult<StatsQueryRequest> {
    let config = &configuration.config;
    let mut request = StatsQueryRequest {
        metrics: config.metrics.clone(),
        date_range_type: config.date_range_type.clone(),
        start_date: config.start_date,
        end_date: config.end_date,
        mesocycle_id: config.mesocycle_id,
        aggregation: parse_aggregation(Some(&config.aggregation))?,
        ..Default::default()
    };
    filters.apply(&mut request);
    Ok(request)
}

/// Run a saved configuration; `None` if it does not exist
pub fn run_stats_configuration(
    db: &Database,
    id: i64,
    filters: StatsFilters,
    today: NaiveDate,
) -> StatsResult<Option<RunStatsConfigurationResponse>> {
    let configuration = {
        let conn = db.get_conn()?;
        StatsConfiguration::get_by_id(&conn, id)?
    };
    let Some(configuration) = configuration else {
        return Ok(None);
    };

    tracing::info!(id, name = %configuration.name, "run_stats_configuration");
    let request = configuration_request(&configuration, filters)?;
    let result = execute(db, &request, today)?;

    Ok(Some(RunStatsConfigurationResponse {
        configuration_id: configuration.id,
        name: configuration.name,
        chart_type: configuration.config.chart_type,
        result,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogEntry, LogEntryCreate, StatsConfig, StatsConfigurationCreate};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_list_metrics_marks_filters() {
        let response = list_metrics();
        assert_eq!(response.count, catalog::METRICS.len());

        let find = |id: &str| response.metrics.iter().find(|m| m.id == id).unwrap();
        assert_eq!(find("exercise_volume").required_filter, Some("training"));
        assert_eq!(find("cardio_speed").required_filter, None);
        assert_eq!(find("cardio_speed").optional_filter, Some("cardio type"));
        assert_eq!(find("calories").optional_filter, None);
    }

    #[test]
    fn test_option_listings() {
        let ranges = list_date_range_types();
        assert!(ranges.options.iter().any(|o| o.id == "all_time"));
        let aggregations = list_aggregation_types();
        let ids: Vec<_> = aggregations.options.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["daily", "weekly", "monthly"]);
        assert!(list_training_filter_types().contains(&"movement_pattern"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(None, "start_date").unwrap(), None);
        assert_eq!(parse_date(Some(""), "start_date").unwrap(), None);
        assert_eq!(parse_date(Some("2024-02-29"), "start_date").unwrap(), Some(date("2024-02-29")));
        assert!(matches!(
            parse_date(Some("02/29/2024"), "start_date"),
            Err(StatsError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_run_configuration() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .with_conn(|conn| {
                let mut day = LogEntryCreate::for_date(date("2024-01-01"));
                day.morning_weight = Some(180.0);
                LogEntry::create(conn, &day)?;
                let saved = StatsConfiguration::create(
                    conn,
                    &StatsConfigurationCreate {
                        name: "January weight".to_string(),
                        description: None,
                        config: StatsConfig {
                            metrics: vec!["weight".to_string()],
                            date_range_type: "custom".to_string(),
                            start_date: Some(date("2024-01-01")),
                            end_date: Some(date("2024-01-31")),
                            mesocycle_id: None,
                            aggregation: "monthly".to_string(),
                            chart_type: ChartType::Bar,
                        },
                    },
                )?;
                Ok(saved.id)
            })
            .unwrap();

        let response = run_stats_configuration(&db, id, StatsFilters::default(), date("2024-02-01"))
            .unwrap()
            .unwrap();
        assert_eq!(response.chart_type, ChartType::Bar);
        assert_eq!(response.result.aggregation, Aggregation::Monthly);
        assert_eq!(response.result.metrics[0].data.len(), 1);
        assert_eq!(response.result.metrics[0].average, Some(180.0));

        assert!(run_stats_configuration(&db, id + 1, StatsFilters::default(), date("2024-02-01"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_runtime_filters_reach_query() {
        let configuration = StatsConfiguration {
            id: 1,
            name: "Bench".to_string(),
            description: None,
            config: StatsConfig {
                metrics: vec!["exercise_weight".to_string()],
                date_range_type: "last_30_days".to_string(),
                start_date: None,
                end_date: None,
                mesocycle_id: None,
                aggregation: "weekly".to_string(),
                chart_type: ChartType::Line,
            },
            created_at: String::new(),
            updated_at: String::new(),
        };
        let filters = StatsFilters {
            training_filter_type: Some("exercise".to_string()),
            exercise_id: Some(4),
            ..Default::default()
        };
        let request = configuration_request(&configuration, filters).unwrap();
        assert_eq!(request.exercise_id, Some(4));
        assert_eq!(request.aggregation, Aggregation::Weekly);

        let mut broken = configuration;
        broken.config.aggregation = "hourly".to_string();
        assert!(configuration_request(&broken, StatsFilters::default()).is_err());
    }
}
