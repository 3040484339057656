//! Stats query errors

use thiserror::Error;

use crate::db::DbError;

/// Every way a stats query can fail. Any error fails the whole query.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("At least one metric is required")]
    EmptyQuery,

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Metric '{metric}' requires a {filter} filter")]
    MissingRequiredFilter { metric: String, filter: &'static str },

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to read records: {0}")]
    UpstreamRead(#[from] DbError),
}

impl StatsError {
    /// True when the caller sent a bad request, as opposed to a storage failure
    pub fn is_request_error(&self) -> bool {
        !matches!(self, StatsError::UpstreamRead(_))
    }
}

pub type StatsResult<T> = Result<T, StatsError>;
