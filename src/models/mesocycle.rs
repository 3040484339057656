//! Mesocycle model
//!
//! A training block with fixed start and end dates.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesocycle {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Data for creating a mesocycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MesocycleCreate {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Mesocycle {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
        })
    }

    /// Create a new mesocycle. The schema rejects start after end.
    pub fn create(conn: &Connection, data: &MesocycleCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO mesocycles (name, description, start_date, end_date)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![data.name, data.description, data.start_date, data.end_date],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a mesocycle by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM mesocycles WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(meso) => Ok(Some(meso)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all mesocycles, most recent first
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM mesocycles ORDER BY start_date DESC")?;
        let mesocycles = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(mesocycles)
    }
}
