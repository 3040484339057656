//! Dashboard settings
//!
//! Key/value store for dashboard UI state (card layout, pinned
//! configurations). Values are arbitrary JSON.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSetting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: String,
}

impl DashboardSetting {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let raw: String = row.get("value")?;
        let value = serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Self {
            key: row.get("key")?,
            value,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get(conn: &Connection, key: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM dashboard_settings WHERE key = ?1")?;

        match stmt.query_row([key], Self::from_row) {
            Ok(setting) => Ok(Some(setting)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or replace the value for a key
    pub fn set(conn: &Connection, key: &str, value: &serde_json::Value) -> DbResult<Self> {
        let raw = serde_json::to_string(value)?;
        conn.execute(
            r#"
            INSERT INTO dashboard_settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')
            "#,
            params![key, raw],
        )?;

        Ok(Self::get(conn, key)?.unwrap_or_else(|| Self {
            key: key.to_string(),
            value: value.clone(),
            updated_at: String::new(),
        }))
    }

    pub fn delete(conn: &Connection, key: &str) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM dashboard_settings WHERE key = ?1", [key])?;
        Ok(rows > 0)
    }

    /// All settings ordered by key
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM dashboard_settings ORDER BY key")?;
        let settings = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use serde_json::json;

    #[test]
    fn test_set_overwrites_and_delete_removes() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.get_conn().unwrap();

        assert!(DashboardSetting::get(&conn, "layout").unwrap().is_none());

        DashboardSetting::set(&conn, "layout", &json!({"cards": [1, 2]})).unwrap();
        let updated = DashboardSetting::set(&conn, "layout", &json!({"cards": [3]})).unwrap();
        assert_eq!(updated.value, json!({"cards": [3]}));

        DashboardSetting::set(&conn, "theme", &json!("dark")).unwrap();
        let keys: Vec<_> = DashboardSetting::list(&conn)
            .unwrap()
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["layout", "theme"]);

        assert!(DashboardSetting::delete(&conn, "layout").unwrap());
        assert!(!DashboardSetting::delete(&conn, "layout").unwrap());
    }
}
