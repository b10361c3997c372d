mod duckdb_engine;
mod engine;
mod table_id;

pub use duckdb_engine::DuckDbWarehouse;
pub use engine::{LoadStats, Warehouse, WriteDisposition};
pub use table_id::{DatasetId, TableId};
