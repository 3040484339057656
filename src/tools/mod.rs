//! Fitlog Tools module
//!
//! MCP tool implementations, independent of the transport.

pub mod configurations;
pub mod dashboard;
pub mod stats;
pub mod status;
