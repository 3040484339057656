//! Read access to logged records
//!
//! The query executor reads through [`RecordStore`] only. [`SqliteRecords`]
//! borrows one pooled connection for the lifetime of a query.

use chrono::NaiveDate;
use rusqlite::Connection;

use super::range::DateRange;
use crate::db::DbResult;
use crate::models::{LogEntry, Mesocycle};

pub trait RecordStore {
    /// Entries with `start_date <= date <= end_date`, ascending, at most one per date
    fn log_entries(&self, range: &DateRange) -> DbResult<Vec<LogEntry>>;

    fn mesocycle(&self, id: i64) -> DbResult<Option<Mesocycle>>;

    fn earliest_log_entry_date(&self) -> DbResult<Option<NaiveDate>>;
}

/// Record store over a SQLite connection
pub struct SqliteRecords<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteRecords<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl RecordStore for SqliteRecords<'_> {
    fn log_entries(&self, range: &DateRange) -> DbResult<Vec<LogEntry>> {
        LogEntry::list_in_range(self.conn, range.start_date, range.end_date)
    }

    fn mesocycle(&self, id: i64) -> DbResult<Option<Mesocycle>> {
        Mesocycle::get_by_id(self.conn, id)
    }

    fn earliest_log_entry_date(&self) -> DbResult<Option<NaiveDate>> {
        LogEntry::earliest_date(self.conn)
    }
}
