//! Build information
//!
//! What this binary was built as: package version, the build number and
//! timestamp stamped by `build.rs`, and the schema and metric catalog it
//! ships with.

use serde::Serialize;

use crate::db::migrations::SCHEMA_VERSION;
use crate::stats::catalog;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Build timestamp in ISO 8601 format, `unknown` outside cargo builds
pub const BUILD_TIMESTAMP: &str = match option_env!("FITLOG_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

/// Build number, bumped on each recompilation; 0 when not stamped
pub fn build_number() -> u64 {
    parse_build_number(option_env!("FITLOG_BUILD_NUMBER"))
}

fn parse_build_number(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    /// Schema version the migrations bring a database to
    pub schema_version: i32,
    /// Number of metrics the stats engine can compute
    pub metric_count: usize,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: build_number(),
            build_timestamp: BUILD_TIMESTAMP,
            schema_version: SCHEMA_VERSION,
            metric_count: catalog::list().len(),
        }
    }
}

/// Print the startup banner to stderr (stdout belongs to the MCP transport)
pub fn print_startup_banner() {
    let info = BuildInfo::current();
    eprintln!("===============================================");
    eprintln!("  {} - health & fitness statistics", info.name);
    eprintln!("  Version: {} | Build: {}", info.version, info.build_number);
    eprintln!("  Compiled: {}", info.build_timestamp);
    eprintln!("  Schema: v{} | Metrics: {}", info.schema_version, info.metric_count);
    eprintln!("===============================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_parse_build_number() {
        assert_eq!(parse_build_number(Some("42")), 42);
        assert_eq!(parse_build_number(Some(" 7\n")), 7);
        assert_eq!(parse_build_number(Some("4x2")), 0);
        assert_eq!(parse_build_number(None), 0);
    }

    #[test]
    fn test_reports_shipped_schema_and_catalog() {
        let info = BuildInfo::current();
        assert_eq!(info.metric_count, catalog::METRICS.len());

        let db = Database::open_in_memory().unwrap();
        let migrated = db.with_conn(crate::db::migrations::get_schema_version).unwrap();
        assert_eq!(info.schema_version, migrated);
    }
}
