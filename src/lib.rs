//! Batch ETL for distributor extracts: raw CSV loads into a DuckDB warehouse,
//! then a star schema of dimension tables and a sales fact table.

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod storage;
pub mod warehouse;

#[cfg(feature = "python")]
mod python;

pub use config::{PipelineConfig, WarehouseConfig};
pub use error::{ConfigError, ErrorKind, WarehouseError};
pub use report::{ItemOutcome, ItemStatus, RunReport, Stage};
