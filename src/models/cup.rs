//! Cup model
//!
//! A reusable drinking vessel (e.g., "Water bottle" = 750 ml).

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::units::VolumeUnit;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cup {
    pub id: i64,
    pub name: String,
    pub amount: f64,
    pub unit: VolumeUnit,
}

impl Cup {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let unit_str: String = row.get("unit")?;
        let unit = VolumeUnit::from_str(&unit_str).unwrap_or(VolumeUnit::Ml);

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            amount: row.get("amount")?,
            unit,
        })
    }

    pub fn create(conn: &Connection, name: &str, amount: f64, unit: VolumeUnit) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO cups (name, amount, unit) VALUES (?1, ?2, ?3)",
            params![name, amount, unit.as_str()],
        )?;
        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM cups WHERE id = ?1")?;
        match stmt.query_row([id], Self::from_row) {
            Ok(cup) => Ok(Some(cup)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
