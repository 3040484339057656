//! Metrics query and aggregation engine
//!
//! Turns per-day log entries into time series per metric:
//! catalog lookup, range resolution, per-day derivation, bucketing and
//! comparison against a reference period.

pub mod aggregator;
pub mod catalog;
pub mod comparison;
pub mod error;
pub mod query;
pub mod range;
pub mod rollup;
pub mod store;

pub use aggregator::{compute_day, daily_series, DayValue, MetricFilters, TrainingFilter};
pub use catalog::{lookup, MetricCategory, MetricDefinition, METRICS};
pub use comparison::{compare, ComparisonResult};
pub use error::{StatsError, StatsResult};
pub use query::{
    execute, execute_with, ComparisonRequest, MetricResult, StatsQueryRequest, StatsQueryResponse,
};
pub use range::{resolve, DateRange, RangeSpec};
pub use rollup::{bucket, summarize, Aggregation, Summary, TimeSeriesPoint};
pub use store::{RecordStore, SqliteRecords};
