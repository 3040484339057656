//! Fitlog MCP Server Implementation
//!
//! Exposes the stats engine, saved configurations and dashboard settings as
//! MCP tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{ChartType, StatsConfig, StatsConfigurationCreate};
use crate::stats::{ComparisonRequest, StatsError, StatsQueryRequest, StatsResult};
use crate::tools::configurations::{self, StatsConfigPatch};
use crate::tools::dashboard;
use crate::tools::stats::{self, parse_aggregation, parse_date, StatsFilters};
use crate::tools::status::StatusTracker;

/// Fitlog MCP Service
#[derive(Clone)]
pub struct FitlogService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<FitlogService>,
}

impl FitlogService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

/// Relative ranges resolve against the server's local date
fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn stats_error(e: StatsError) -> McpError {
    if e.is_request_error() {
        McpError::invalid_params(e.to_string(), None)
    } else {
        tracing::error!(error = %e, "stats query failed to read records");
        McpError::internal_error(e.to_string(), None)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Stats Query Parameter Structs
// ============================================================================

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct FilterParams {
    /// none, exercise, movement_pattern, workout or mesocycle
    pub training_filter_type: Option<String>,
    pub exercise_id: Option<i64>,
    pub movement_pattern_id: Option<i64>,
    pub workout_id: Option<i64>,
    /// Mesocycle whose dates bound the counted training
    pub training_mesocycle_id: Option<i64>,
    /// none, incline_walking, sprints, walking, running, cycling, swimming or other
    pub cardio_filter_type: Option<String>,
    pub supplement_ids: Option<Vec<i64>>,
    pub compound_ids: Option<Vec<i64>>,
}

impl FilterParams {
    fn into_filters(self) -> StatsFilters {
        StatsFilters {
            training_filter_type: self.training_filter_type,
            exercise_id: self.exercise_id,
            movement_pattern_id: self.movement_pattern_id,
            workout_id: self.workout_id,
            training_mesocycle_id: self.training_mesocycle_id,
            cardio_filter_type: self.cardio_filter_type,
            supplement_ids: self.supplement_ids,
            compound_ids: self.compound_ids,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ComparisonParams {
    /// Day to compare (YYYY-MM-DD), defaults to the end of the query range
    pub date: Option<String>,
    /// Reference period type, same values as the query's date_range_type
    pub date_range_type: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub mesocycle_id: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct QueryStatsParams {
    /// Metric ids from list_metrics
    pub metrics: Vec<String>,
    /// last_N_days, this_week, this_month, this_year, all_time, custom or mesocycle
    pub date_range_type: String,
    /// Start date for custom ranges (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// End date for custom ranges (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// Mesocycle for mesocycle ranges
    pub mesocycle_id: Option<i64>,
    /// daily (default), weekly or monthly
    pub aggregation: Option<String>,
    #[serde(flatten)]
    pub filters: FilterParams,
    /// Compare each metric's value on one day against a reference period
    pub comparison: Option<ComparisonParams>,
}

impl QueryStatsParams {
    fn into_request(self) -> StatsResult<StatsQueryRequest> {
        let comparison = match self.comparison {
            Some(c) => Some(ComparisonRequest {
                date: parse_date(c.date.as_deref(), "comparison.date")?,
                date_range_type: c.date_range_type,
                start_date: parse_date(c.start_date.as_deref(), "comparison.start_date")?,
                end_date: parse_date(c.end_date.as_deref(), "comparison.end_date")?,
                mesocycle_id: c.mesocycle_id,
            }),
            None => None,
        };

        let mut request = StatsQueryRequest {
            metrics: self.metrics,
            date_range_type: self.date_range_type,
            start_date: parse_date(self.start_date.as_deref(), "start_date")?,
            end_date: parse_date(self.end_date.as_deref(), "end_date")?,
            mesocycle_id: self.mesocycle_id,
            aggregation: parse_aggregation(self.aggregation.as_deref())?,
            comparison,
            ..Default::default()
        };
        self.filters.into_filters().apply(&mut request);
        Ok(request)
    }
}

// ============================================================================
// Stats Configuration Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RunStatsConfigurationParams {
    pub id: i64,
    /// Filters required by the configuration's metrics
    #[serde(flatten)]
    pub filters: FilterParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateStatsConfigurationParams {
    pub name: String,
    pub description: Option<String>,
    pub metrics: Vec<String>,
    pub date_range_type: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub mesocycle_id: Option<i64>,
    /// daily (default), weekly or monthly
    pub aggregation: Option<String>,
    /// line (default), bar or area
    pub chart_type: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StatsConfigurationIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateStatsConfigurationParams {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub metrics: Option<Vec<String>>,
    pub date_range_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub mesocycle_id: Option<i64>,
    pub aggregation: Option<String>,
    pub chart_type: Option<String>,
}

fn parse_chart_type(value: Option<&str>) -> Result<Option<ChartType>, McpError> {
    match value {
        None => Ok(None),
        Some(s) => ChartType::from_str(s)
            .map(Some)
            .ok_or_else(|| McpError::invalid_params(format!("Unknown chart_type: {}", s), None)),
    }
}

// ============================================================================
// Dashboard Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DashboardKeyParams {
    pub key: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetDashboardSettingParams {
    pub key: String,
    /// Any JSON value
    pub value: serde_json::Value,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl FitlogService {
    // --- Status ---

    #[tool(description = "Get the current status of the fitlog service including build info, database status, and process information")]
    async fn fitlog_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        to_json(&status)
    }

    #[tool(description = "Get instructions for querying stats. Call this before building a stats query or when unsure which metrics, ranges or filters to use.")]
    fn stats_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::STATS_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(STATS_INSTRUCTIONS)]))
    }

    // --- Catalog ---

    #[tool(description = "List every metric with its id, label, unit, category and the filter it requires or accepts")]
    fn list_metrics(&self) -> Result<CallToolResult, McpError> {
        to_json(&stats::list_metrics())
    }

    #[tool(description = "List supported date_range_type values")]
    fn list_date_range_types(&self) -> Result<CallToolResult, McpError> {
        to_json(&stats::list_date_range_types())
    }

    #[tool(description = "List supported aggregation values")]
    fn list_aggregation_types(&self) -> Result<CallToolResult, McpError> {
        to_json(&stats::list_aggregation_types())
    }

    // --- Queries ---

    #[tool(description = "Compute time series for one or more metrics over a date range, with optional weekly/monthly aggregation, filters and a comparison against a reference period. All metrics succeed or the query fails.")]
    fn query_stats(&self, Parameters(p): Parameters<QueryStatsParams>) -> Result<CallToolResult, McpError> {
        let request = p.into_request().map_err(stats_error)?;
        let result = stats::query_stats(&self.database, &request, today()).map_err(stats_error)?;
        to_json(&result)
    }

    #[tool(description = "Run a saved stats configuration. Pass any filters its metrics require.")]
    fn run_stats_configuration(&self, Parameters(p): Parameters<RunStatsConfigurationParams>) -> Result<CallToolResult, McpError> {
        let result = stats::run_stats_configuration(&self.database, p.id, p.filters.into_filters(), today())
            .map_err(stats_error)?;
        match result {
            Some(response) => to_json(&response),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                r#"{{"error": "Stats configuration not found", "id": {}}}"#,
                p.id
            ))])),
        }
    }

    // --- Saved Configurations ---

    #[tool(description = "Save a named stats query (metrics, date range, aggregation, chart type) for reuse. Filters are supplied when it runs.")]
    fn create_stats_configuration(&self, Parameters(p): Parameters<CreateStatsConfigurationParams>) -> Result<CallToolResult, McpError> {
        let config = StatsConfig {
            metrics: p.metrics,
            date_range_type: p.date_range_type,
            start_date: parse_date(p.start_date.as_deref(), "start_date").map_err(stats_error)?,
            end_date: parse_date(p.end_date.as_deref(), "end_date").map_err(stats_error)?,
            mesocycle_id: p.mesocycle_id,
            aggregation: p.aggregation.unwrap_or_else(|| "daily".to_string()),
            chart_type: parse_chart_type(p.chart_type.as_deref())?.unwrap_or_default(),
        };
        let data = StatsConfigurationCreate {
            name: p.name,
            description: p.description,
            config,
        };
        let result = configurations::create_stats_configuration(&self.database, data)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a saved stats configuration by id")]
    fn get_stats_configuration(&self, Parameters(p): Parameters<StatsConfigurationIdParams>) -> Result<CallToolResult, McpError> {
        let result = configurations::get_stats_configuration(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(configuration) => to_json(&configuration),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                r#"{{"error": "Stats configuration not found", "id": {}}}"#,
                p.id
            ))])),
        }
    }

    #[tool(description = "List saved stats configurations ordered by name")]
    fn list_stats_configurations(&self) -> Result<CallToolResult, McpError> {
        let result = configurations::list_stats_configurations(&self.database)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Update a saved stats configuration. Only the fields given are changed; range fields the resulting date_range_type does not use are cleared.")]
    fn update_stats_configuration(&self, Parameters(p): Parameters<UpdateStatsConfigurationParams>) -> Result<CallToolResult, McpError> {
        let patch = StatsConfigPatch {
            metrics: p.metrics,
            date_range_type: p.date_range_type,
            start_date: parse_date(p.start_date.as_deref(), "start_date").map_err(stats_error)?,
            end_date: parse_date(p.end_date.as_deref(), "end_date").map_err(stats_error)?,
            mesocycle_id: p.mesocycle_id,
            aggregation: p.aggregation,
            chart_type: parse_chart_type(p.chart_type.as_deref())?,
        };
        let result = configurations::update_stats_configuration(&self.database, p.id, p.name, p.description, patch)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a saved stats configuration")]
    fn delete_stats_configuration(&self, Parameters(p): Parameters<StatsConfigurationIdParams>) -> Result<CallToolResult, McpError> {
        let result = configurations::delete_stats_configuration(&self.database, p.id)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    // --- Dashboard ---

    #[tool(description = "Get a dashboard setting by key")]
    fn get_dashboard_setting(&self, Parameters(p): Parameters<DashboardKeyParams>) -> Result<CallToolResult, McpError> {
        let result = dashboard::get_dashboard_setting(&self.database, &p.key)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(setting) => to_json(&setting),
            None => to_json(&serde_json::json!({ "error": "Dashboard setting not found", "key": p.key })),
        }
    }

    #[tool(description = "Save a dashboard setting (any JSON value), replacing an existing value for the key")]
    fn set_dashboard_setting(&self, Parameters(p): Parameters<SetDashboardSettingParams>) -> Result<CallToolResult, McpError> {
        let result = dashboard::set_dashboard_setting(&self.database, &p.key, p.value)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a dashboard setting by key")]
    fn delete_dashboard_setting(&self, Parameters(p): Parameters<DashboardKeyParams>) -> Result<CallToolResult, McpError> {
        let result = dashboard::delete_dashboard_setting(&self.database, &p.key)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List all dashboard settings ordered by key")]
    fn list_dashboard_settings(&self) -> Result<CallToolResult, McpError> {
        let result = dashboard::list_dashboard_settings(&self.database)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for FitlogService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fitlog".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Fitlog Stats".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Fitlog - statistics over the daily health and fitness log. \
                 IMPORTANT: Call stats_instructions before building queries. \
                 Catalog: list_metrics, list_date_range_types, list_aggregation_types. \
                 Queries: query_stats (metrics + date range + aggregation + filters + optional comparison). \
                 Saved queries: create/get/list/update/delete_stats_configuration, run_stats_configuration. \
                 Dashboard: get/set/delete_dashboard_setting, list_dashboard_settings."
                    .into(),
            ),
        }
    }
}
