//! Saved stats configuration model
//!
//! A named, reusable stats query (metrics, date range, aggregation) with the
//! chart style the dashboard should draw it with. Filters are supplied at run
//! time, not saved.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Chart style for a saved configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Area,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Area => "area",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "line" => Some(ChartType::Line),
            "bar" => Some(ChartType::Bar),
            "area" => Some(ChartType::Area),
            _ => None,
        }
    }
}

/// The saved query body, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    pub metrics: Vec<String>,
    pub date_range_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesocycle_id: Option<i64>,
    #[serde(default = "default_aggregation")]
    pub aggregation: String,
    #[serde(default)]
    pub chart_type: ChartType,
}

fn default_aggregation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfiguration {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub config: StatsConfig,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfigurationCreate {
    pub name: String,
    pub description: Option<String>,
    pub config: StatsConfig,
}

/// Data for updating a configuration; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsConfigurationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub config: Option<StatsConfig>,
}

impl StatsConfiguration {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let raw: String = row.get("config")?;
        let config = serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            config,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &StatsConfigurationCreate) -> DbResult<Self> {
        let config = serde_json::to_string(&data.config)?;
        conn.execute(
            "INSERT INTO stats_configurations (name, description, config) VALUES (?1, ?2, ?3)",
            params![data.name, data.description, config],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM stats_configurations WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(configuration) => Ok(Some(configuration)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all configurations ordered by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM stats_configurations ORDER BY name, id")?;
        let configurations = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(configurations)
    }

    pub fn update(conn: &Connection, id: i64, data: &StatsConfigurationUpdate) -> DbResult<Option<Self>> {
        let Some(existing) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let name = data.name.clone().unwrap_or(existing.name);
        let description = data.description.clone().or(existing.description);
        let config = serde_json::to_string(data.config.as_ref().unwrap_or(&existing.config))?;

        conn.execute(
            r#"
            UPDATE stats_configurations
            SET name = ?1, description = ?2, config = ?3, updated_at = datetime('now')
            WHERE id = ?4
            "#,
            params![name, description, config, id],
        )?;

        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM stats_configurations WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
