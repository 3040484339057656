//! Fitlog Library
//!
//! Metrics query and aggregation over a daily health and fitness log.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod stats;
pub mod tools;
pub mod units;
