//! Saved Stats Configuration MCP Tools

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::models::{
    ChartType, StatsConfig, StatsConfiguration, StatsConfigurationCreate, StatsConfigurationUpdate,
};
use crate::stats::catalog;
use crate::stats::range::RangeSpec;
use crate::stats::Aggregation;

/// Response for list_stats_configurations
#[derive(Debug, Serialize)]
pub struct ListStatsConfigurationsResponse {
    pub configurations: Vec<StatsConfiguration>,
    pub count: usize,
}

/// Response for delete_stats_configuration
#[derive(Debug, Serialize)]
pub struct DeleteStatsConfigurationResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Partial change to a saved query body; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct StatsConfigPatch {
    pub metrics: Option<Vec<String>>,
    pub date_range_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub mesocycle_id: Option<i64>,
    pub aggregation: Option<String>,
    pub chart_type: Option<ChartType>,
}

impl StatsConfigPatch {
    pub fn is_empty(&self) -> bool {
        self.metrics.is_none()
            && self.date_range_type.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.mesocycle_id.is_none()
            && self.aggregation.is_none()
            && self.chart_type.is_none()
    }

    /// Overlay the patch on `base`. Range fields the merged
    /// `date_range_type` does not use are cleared.
    pub fn apply(self, base: StatsConfig) -> StatsConfig {
        let date_range_type = self.date_range_type.unwrap_or(base.date_range_type);
        let custom = date_range_type == "custom";
        let mesocycle = date_range_type == "mesocycle";
        StatsConfig {
            metrics: self.metrics.unwrap_or(base.metrics),
            start_date: self.start_date.or(base.start_date).filter(|_| custom),
            end_date: self.end_date.or(base.end_date).filter(|_| custom),
            mesocycle_id: self.mesocycle_id.or(base.mesocycle_id).filter(|_| mesocycle),
            date_range_type,
            aggregation: self.aggregation.unwrap_or(base.aggregation),
            chart_type: self.chart_type.unwrap_or(base.chart_type),
        }
    }
}

/// Reject configurations that could never run.
///
/// Filters are not checked here; they are supplied when the configuration runs.
pub fn validate_config(config: &StatsConfig) -> Result<(), String> {
    if config.metrics.is_empty() {
        return Err("At least one metric is required".to_string());
    }
    for metric in &config.metrics {
        catalog::lookup(metric).map_err(|e| e.to_string())?;
    }
    if Aggregation::from_str(&config.aggregation).is_none() {
        return Err(format!("Unknown aggregation: {}", config.aggregation));
    }
    RangeSpec::parse(
        &config.date_range_type,
        config.start_date,
        config.end_date,
        config.mesocycle_id,
    )
    .map_err(|e| e.to_string())?;
    Ok(())
}

pub fn create_stats_configuration(db: &Database, data: StatsConfigurationCreate) -> Result<StatsConfiguration, String> {
    if data.name.trim().is_empty() {
        return Err("Configuration name is required".to_string());
    }
    validate_config(&data.config)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let configuration = StatsConfiguration::create(&conn, &data)
        .map_err(|e| format!("Failed to create stats configuration: {}", e))?;
    tracing::info!(id = configuration.id, name = %configuration.name, "created stats configuration");
    Ok(configuration)
}

pub fn get_stats_configuration(db: &Database, id: i64) -> Result<Option<StatsConfiguration>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    StatsConfiguration::get_by_id(&conn, id).map_err(|e| format!("Failed to get stats configuration: {}", e))
}

pub fn list_stats_configurations(db: &Database) -> Result<ListStatsConfigurationsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let configurations = StatsConfiguration::list(&conn)
        .map_err(|e| format!("Failed to list stats configurations: {}", e))?;
    let count = configurations.len();
    Ok(ListStatsConfigurationsResponse { configurations, count })
}

pub fn update_stats_configuration(
    db: &Database,
    id: i64,
    name: Option<String>,
    description: Option<String>,
    patch: StatsConfigPatch,
) -> Result<StatsConfiguration, String> {
    if let Some(name) = &name {
        if name.trim().is_empty() {
            return Err("Configuration name cannot be empty".to_string());
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let existing = StatsConfiguration::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get stats configuration: {}", e))?
        .ok_or_else(|| format!("Stats configuration not found with id: {}", id))?;

    let config = if patch.is_empty() {
        None
    } else {
        let merged = patch.apply(existing.config);
        validate_config(&merged)?;
        Some(merged)
    };

    let data = StatsConfigurationUpdate {
        name,
        description,
        config,
    };
    StatsConfiguration::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update stats configuration: {}", e))?
        .ok_or_else(|| format!("Stats configuration not found with id: {}", id))
}

pub fn delete_stats_configuration(db: &Database, id: i64) -> Result<DeleteStatsConfigurationResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = StatsConfiguration::delete(&conn, id)
        .map_err(|e| format!("Failed to delete stats configuration: {}", e))?;
    if !deleted {
        return Err(format!("Stats configuration not found with id: {}", id));
    }
    Ok(DeleteStatsConfigurationResponse {
        success: true,
        deleted_id: id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(metrics: &[&str]) -> StatsConfig {
        StatsConfig {
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            date_range_type: "last_30_days".to_string(),
            start_date: None,
            end_date: None,
            mesocycle_id: None,
            aggregation: "daily".to_string(),
            chart_type: ChartType::Line,
        }
    }

    #[test]
    fn test_validate_config() {
        assert!(validate_config(&config(&["weight", "exercise_volume"])).is_ok());
        assert!(validate_config(&config(&[])).is_err());
        assert!(validate_config(&config(&["heart_rate"])).unwrap_err().contains("heart_rate"));

        let mut bad_range = config(&["weight"]);
        bad_range.date_range_type = "custom".to_string();
        assert!(validate_config(&bad_range).is_err());

        let mut bad_aggregation = config(&["weight"]);
        bad_aggregation.aggregation = "yearly".to_string();
        assert!(validate_config(&bad_aggregation).is_err());
    }

    #[test]
    fn test_configuration_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let created = create_stats_configuration(
            &db,
            StatsConfigurationCreate {
                name: "Cut".to_string(),
                description: Some("Weight and calories".to_string()),
                config: config(&["weight", "calories"]),
            },
        )
        .unwrap();

        let renamed = update_stats_configuration(
            &db,
            created.id,
            Some("Summer cut".to_string()),
            None,
            StatsConfigPatch::default(),
        )
        .unwrap();
        assert_eq!(renamed.name, "Summer cut");
        assert_eq!(renamed.config, created.config);

        let patched = update_stats_configuration(
            &db,
            created.id,
            None,
            None,
            StatsConfigPatch {
                aggregation: Some("weekly".to_string()),
                chart_type: Some(ChartType::Area),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(patched.name, "Summer cut");
        assert_eq!(patched.config.aggregation, "weekly");
        assert_eq!(patched.config.chart_type, ChartType::Area);
        assert_eq!(patched.config.metrics, created.config.metrics);

        let invalid = StatsConfigPatch {
            metrics: Some(Vec::new()),
            ..Default::default()
        };
        assert!(update_stats_configuration(&db, created.id, None, None, invalid).is_err());

        assert_eq!(list_stats_configurations(&db).unwrap().count, 1);
        assert!(delete_stats_configuration(&db, created.id).unwrap().success);
        assert!(get_stats_configuration(&db, created.id).unwrap().is_none());
        assert!(delete_stats_configuration(&db, created.id).is_err());
    }

    #[test]
    fn test_patch_clears_unused_range_fields() {
        let mut custom = config(&["weight"]);
        custom.date_range_type = "custom".to_string();
        custom.start_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        custom.end_date = NaiveDate::from_ymd_opt(2024, 1, 31);

        let to_mesocycle = StatsConfigPatch {
            date_range_type: Some("mesocycle".to_string()),
            mesocycle_id: Some(4),
            ..Default::default()
        }
        .apply(custom.clone());
        assert_eq!(to_mesocycle.start_date, None);
        assert_eq!(to_mesocycle.end_date, None);
        assert_eq!(to_mesocycle.mesocycle_id, Some(4));

        let to_preset = StatsConfigPatch {
            date_range_type: Some("last_7_days".to_string()),
            ..Default::default()
        }
        .apply(to_mesocycle);
        assert_eq!(to_preset.mesocycle_id, None);
        assert_eq!(
            to_preset,
            StatsConfig {
                date_range_type: "last_7_days".to_string(),
                ..config(&["weight"])
            }
        );

        // unrelated edits keep a custom range intact
        let reaggregated = StatsConfigPatch {
            aggregation: Some("monthly".to_string()),
            ..Default::default()
        }
        .apply(custom.clone());
        assert_eq!(reaggregated.start_date, custom.start_date);
        assert_eq!(reaggregated.end_date, custom.end_date);
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let db = Database::open_in_memory().unwrap();
        let result = create_stats_configuration(
            &db,
            StatsConfigurationCreate {
                name: "  ".to_string(),
                description: None,
                config: config(&["weight"]),
            },
        );
        assert!(result.is_err());
    }
}
