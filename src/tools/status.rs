//! Fitlog Status Tool
//!
//! Runtime status of the service plus the usage guide for the stats tools.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Stats query instructions for AI assistants
pub const STATS_INSTRUCTIONS: &str = r#"
# Fitlog Stats Instructions

This guide explains how to chart and compare the daily log with the fitlog stats tools.

## Overview

Every stats query turns the daily log into one time series per metric:
1. **Metrics** - What to measure (`list_metrics` returns the catalog)
2. **Date range** - Which days (`list_date_range_types`)
3. **Aggregation** - Daily points, or weekly/monthly averages (`list_aggregation_types`)
4. **Filters** - Some metrics only make sense for a chosen exercise, cardio type or supplement

One query may ask for several metrics at once. Either every metric is computed or the
whole query fails with an error naming the problem.

---

## Getting the Current Date

Relative ranges (`last_7_days`, `this_week`, `this_month`, `this_year`, `all_time`) are
resolved on the server against the server's local date. You never need to compute them.
Use `custom` only when the user names explicit dates.

---

## Date Range Types

| date_range_type | Days covered |
|-----------------|--------------|
| `last_N_days` | Today and the N-1 days before it (`last_7_days`, `last_30_days`, `last_90_days`, ...). Ranges longer than 36525 days are rejected |
| `this_week` | Sunday of the current week through today |
| `this_month` | The 1st of the current month through today |
| `this_year` | January 1 through today |
| `all_time` | The earliest log entry through today |
| `custom` | `start_date` through `end_date`, both required, inclusive |
| `mesocycle` | The stored start and end of `mesocycle_id`, even if in the future |

Dates are always `YYYY-MM-DD`.

---

## Null vs Zero

- **Zero** means the day was logged and nothing matched (e.g. no food logged → 0 calories).
- **Null** means there is nothing to measure (no weigh-in, no sleep record, no log entry
  for a scalar metric).
- Averages, min and max ignore null days but DO count zero days.

Do not describe a null day as "0" when summarizing results for the user.

---

## Filtered Metrics

| Metric family | Required parameters |
|---------------|---------------------|
| `exercise_*` | `training_filter_type` + the matching id |
| `supplement_servings` | `supplement_ids` (non-empty) |
| `compound_amount` | `compound_ids` (non-empty) |

`cardio_duration`, `cardio_distance`, `cardio_speed` and `cardio_incline` accept an optional
`cardio_filter_type` (`incline_walking`, `sprints`, `walking`, `running`, `cycling`, `swimming`,
`other`); without it they cover every session.

`training_filter_type` values:
- `exercise` + `exercise_id`
- `movement_pattern` + `movement_pattern_id`
- `workout` + `workout_id`
- `mesocycle` + `training_mesocycle_id` (counts sets on days inside the mesocycle)

---

## Aggregation

- `daily` (default): one point per day, categorical metrics carry a `label`
- `weekly`: one point per Sunday-to-Saturday week, keyed by its Sunday
- `monthly`: one point per calendar month, keyed by the 1st

A bucket's value is the average of its non-null days; a bucket with none is null.

---

## Comparisons

Add a `comparison` object to compare one day's value against a reference period:

```json
{
  "metrics": ["weight", "calories"],
  "date_range_type": "last_30_days",
  "comparison": { "date_range_type": "last_30_days" }
}
```

- `comparison.date` defaults to the end of the query range
- The compared day is never part of its own reference average
- `percent_change` is null when the reference average is null or zero

---

## Saved Configurations

Use `create_stats_configuration` to save a query the user repeats often (metrics, range,
aggregation, chart type). Run it with `run_stats_configuration`, passing filters at run
time. Dashboard layout values live in `set_dashboard_setting` and are never read by queries.

---

## Examples

**"How has my weight trended this month?"**
```json
{ "metrics": ["weight"], "date_range_type": "this_month" }
```

**"Weekly bench press volume over my current mesocycle"**
```json
{
  "metrics": ["exercise_volume"],
  "date_range_type": "mesocycle",
  "mesocycle_id": 3,
  "aggregation": "weekly",
  "training_filter_type": "exercise",
  "exercise_id": 12
}
```

**"Did I sleep better last night than usual?"**
```json
{
  "metrics": ["sleep_quality", "sleep_duration"],
  "date_range_type": "last_7_days",
  "comparison": { "date_range_type": "last_30_days" }
}
```
"#;

/// Runtime status of the fitlog service
#[derive(Debug, Clone, Serialize)]
pub struct FitlogStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,
    pub schema_version: i32,
    pub metric_count: usize,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    pub fn get_status(&self) -> FitlogStatus {
        let build_info = BuildInfo::current();

        // Missing until the first write creates the file
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        FitlogStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            schema_version: build_info.schema_version,
            metric_count: build_info.metric_count,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_missing_database() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/fitlog.db"));
        let status = tracker.get_status();
        assert_eq!(status.database_path, "/nonexistent/fitlog.db");
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
        assert_eq!(status.schema_version, crate::db::migrations::SCHEMA_VERSION);
        assert_eq!(status.metric_count, crate::stats::catalog::METRICS.len());
    }

    #[test]
    fn test_instructions_name_every_range_type() {
        for (range_type, _) in crate::stats::range::DATE_RANGE_TYPES {
            let key = range_type.replace("<N>", "N");
            assert!(STATS_INSTRUCTIONS.contains(&key), "missing {}", key);
        }
    }
}
