//! Supplement and compound models
//!
//! A supplement delivers fixed amounts of one or more compounds per serving
//! (e.g., fish oil = 600 mg EPA + 400 mg DHA).

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Unit a compound amount is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundUnit {
    Mg,
    Mcg,
    G,
    Iu,
    Ml,
}

impl CompoundUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompoundUnit::Mg => "mg",
            CompoundUnit::Mcg => "mcg",
            CompoundUnit::G => "g",
            CompoundUnit::Iu => "iu",
            CompoundUnit::Ml => "ml",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mg" => Some(CompoundUnit::Mg),
            "mcg" | "µg" | "ug" => Some(CompoundUnit::Mcg),
            "g" => Some(CompoundUnit::G),
            "iu" => Some(CompoundUnit::Iu),
            "ml" => Some(CompoundUnit::Ml),
            _ => None,
        }
    }
}

/// A vitamin, mineral or other active compound
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compound {
    pub id: i64,
    pub name: String,
    pub unit: CompoundUnit,
}

/// Amount of a compound in one serving of a supplement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplementCompound {
    pub compound_id: i64,
    pub amount: f64,
}

/// A supplement product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplement {
    pub id: i64,
    pub brand: String,
    pub name: String,
    pub serving_name: String,
    pub compounds: Vec<SupplementCompound>,
}

impl Compound {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let unit_str: String = row.get("unit")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            unit: CompoundUnit::from_str(&unit_str).unwrap_or(CompoundUnit::Mg),
        })
    }

    pub fn create(conn: &Connection, name: &str, unit: CompoundUnit) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO compounds (name, unit) VALUES (?1, ?2)",
            params![name, unit.as_str()],
        )?;
        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM compounds WHERE id = ?1")?;
        match stmt.query_row([id], Self::from_row) {
            Ok(compound) => Ok(Some(compound)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Supplement {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            brand: row.get("brand")?,
            name: row.get("name")?,
            serving_name: row.get("serving_name")?,
            compounds: Vec::new(),
        })
    }

    /// Create a supplement with its per-serving compound amounts
    pub fn create(
        conn: &Connection,
        brand: &str,
        name: &str,
        compounds: &[SupplementCompound],
    ) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO supplements (brand, name) VALUES (?1, ?2)",
            params![brand, name],
        )?;
        let id = conn.last_insert_rowid();

        for compound in compounds {
            conn.execute(
                r#"
                INSERT INTO supplement_compounds (supplement_id, compound_id, amount)
                VALUES (?1, ?2, ?3)
                "#,
                params![id, compound.compound_id, compound.amount],
            )?;
        }

        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a supplement by ID, including its compounds
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM supplements WHERE id = ?1")?;
        let mut supplement = match stmt.query_row([id], Self::from_row) {
            Ok(supplement) => supplement,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut stmt = conn.prepare(
            "SELECT compound_id, amount FROM supplement_compounds WHERE supplement_id = ?1 ORDER BY id",
        )?;
        supplement.compounds = stmt
            .query_map([id], |row| {
                Ok(SupplementCompound {
                    compound_id: row.get(0)?,
                    amount: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(supplement))
    }
}
