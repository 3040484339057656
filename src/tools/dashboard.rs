//! Dashboard Settings MCP Tools
//!
//! Opaque key/value storage for the dashboard. Stats queries never read it.

use serde::Serialize;

use crate::db::Database;
use crate::models::DashboardSetting;

#[derive(Debug, Serialize)]
pub struct ListDashboardSettingsResponse {
    pub settings: Vec<DashboardSetting>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteDashboardSettingResponse {
    pub key: String,
    pub deleted: bool,
}

pub fn get_dashboard_setting(db: &Database, key: &str) -> Result<Option<DashboardSetting>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    DashboardSetting::get(&conn, key).map_err(|e| format!("Failed to get dashboard setting: {}", e))
}

pub fn set_dashboard_setting(db: &Database, key: &str, value: serde_json::Value) -> Result<DashboardSetting, String> {
    if key.trim().is_empty() {
        return Err("Setting key is required".to_string());
    }
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    DashboardSetting::set(&conn, key, &value).map_err(|e| format!("Failed to save dashboard setting: {}", e))
}

pub fn delete_dashboard_setting(db: &Database, key: &str) -> Result<DeleteDashboardSettingResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = DashboardSetting::delete(&conn, key)
        .map_err(|e| format!("Failed to delete dashboard setting: {}", e))?;
    Ok(DeleteDashboardSettingResponse {
        key: key.to_string(),
        deleted,
    })
}

pub fn list_dashboard_settings(db: &Database) -> Result<ListDashboardSettingsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let settings = DashboardSetting::list(&conn)
        .map_err(|e| format!("Failed to list dashboard settings: {}", e))?;
    let count = settings.len();
    Ok(ListDashboardSettingsResponse { settings, count })
}
