//! Food model
//!
//! Reference foods with per-serving nutrition.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A food with nutrition per serving
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    pub name: String,
    pub serving_name: String,
    pub calories: f64,
    pub protein_grams: f64,
    /// Protein has a complete amino acid profile
    pub protein_complete: bool,
    pub carbs_grams: f64,
    pub fiber_grams: f64,
    pub sugar_grams: f64,
    pub fat_grams: f64,
}

/// Data for creating a food
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodCreate {
    pub name: String,
    pub serving_name: Option<String>,
    pub calories: f64,
    pub protein_grams: f64,
    #[serde(default)]
    pub protein_complete: bool,
    pub carbs_grams: f64,
    #[serde(default)]
    pub fiber_grams: f64,
    #[serde(default)]
    pub sugar_grams: f64,
    pub fat_grams: f64,
}

impl Food {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            serving_name: row.get("serving_name")?,
            calories: row.get("calories")?,
            protein_grams: row.get("protein_grams")?,
            protein_complete: row.get::<_, i32>("protein_complete")? != 0,
            carbs_grams: row.get("carbs_grams")?,
            fiber_grams: row.get("fiber_grams")?,
            sugar_grams: row.get("sugar_grams")?,
            fat_grams: row.get("fat_grams")?,
        })
    }

    /// Create a new food
    pub fn create(conn: &Connection, data: &FoodCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO foods (name, serving_name, calories, protein_grams, protein_complete,
                               carbs_grams, fiber_grams, sugar_grams, fat_grams)
            VALUES (?1, COALESCE(?2, '1 serving'), ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                data.name,
                data.serving_name,
                data.calories,
                data.protein_grams,
                data.protein_complete as i32,
                data.carbs_grams,
                data.fiber_grams,
                data.sugar_grams,
                data.fat_grams,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a food by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM foods WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(food) => Ok(Some(food)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
