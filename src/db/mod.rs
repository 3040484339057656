//! Database module
//!
//! SQLite pool plus the versioned schema for the daily log.

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};
pub use migrations::run_migrations;
