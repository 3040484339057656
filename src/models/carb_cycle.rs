//! Carb cycle model
//!
//! A carb cycle is an ordered rotation of day types, each with a carb target.
//! A log entry may be assigned one of those days.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Day type within a carb cycle, from lowest to highest carb intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarbDayType {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

impl CarbDayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarbDayType::Lowest => "lowest",
            CarbDayType::Low => "low",
            CarbDayType::Medium => "medium",
            CarbDayType::High => "high",
            CarbDayType::Highest => "highest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lowest" => Some(CarbDayType::Lowest),
            "low" => Some(CarbDayType::Low),
            "medium" | "moderate" => Some(CarbDayType::Medium),
            "high" => Some(CarbDayType::High),
            "highest" => Some(CarbDayType::Highest),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CarbDayType::Lowest => "Lowest Carb",
            CarbDayType::Low => "Low Carb",
            CarbDayType::Medium => "Medium Carb",
            CarbDayType::High => "High Carb",
            CarbDayType::Highest => "Highest Carb",
        }
    }

    /// 1 (lowest) through 5 (highest)
    pub fn ordinal(&self) -> f64 {
        match self {
            CarbDayType::Lowest => 1.0,
            CarbDayType::Low => 2.0,
            CarbDayType::Medium => 3.0,
            CarbDayType::High => 4.0,
            CarbDayType::Highest => 5.0,
        }
    }
}

/// One day of a carb cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbCycleDay {
    pub id: i64,
    pub carb_cycle_id: i64,
    pub day_type: CarbDayType,
    pub carbs: f64,
    pub position: i64,
}

impl CarbCycleDay {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Self::read(row, "id")
    }

    /// Read a day joined onto another row, with its id aliased as `ccd_id`
    pub(crate) fn from_joined_row(row: &Row) -> rusqlite::Result<Self> {
        Self::read(row, "ccd_id")
    }

    fn read(row: &Row, id_column: &str) -> rusqlite::Result<Self> {
        let day_type_str: String = row.get("day_type")?;
        let day_type = CarbDayType::from_str(&day_type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown carb day type: {}", day_type_str).into(),
            )
        })?;

        Ok(Self {
            id: row.get(id_column)?,
            carb_cycle_id: row.get("carb_cycle_id")?,
            day_type,
            carbs: row.get("carbs")?,
            position: row.get("position")?,
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM carb_cycle_days WHERE id = ?1")?;
        match stmt.query_row([id], Self::from_row) {
            Ok(day) => Ok(Some(day)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Create a carb cycle from its day rotation; returns the created days in order
pub fn create_carb_cycle(
    conn: &Connection,
    name: &str,
    days: &[(CarbDayType, f64)],
) -> DbResult<Vec<CarbCycleDay>> {
    conn.execute("INSERT INTO carb_cycles (name) VALUES (?1)", [name])?;
    let cycle_id = conn.last_insert_rowid();

    let mut created = Vec::with_capacity(days.len());
    for (position, (day_type, carbs)) in days.iter().enumerate() {
        conn.execute(
            r#"
            INSERT INTO carb_cycle_days (carb_cycle_id, day_type, carbs, position)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![cycle_id, day_type.as_str(), carbs, position as i64],
        )?;
        let day = CarbCycleDay::get_by_id(conn, conn.last_insert_rowid())?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
        created.push(day);
    }

    Ok(created)
}
