//! The three pipeline stages. Each one is run on its own and in order:
//! raw load, then dimensions, then the fact table.

pub mod dimensions;
pub mod fact;
pub mod raw_loader;

use chrono::NaiveDate;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::WarehouseError;
use crate::report::{ItemStatus, RunReport};
use crate::warehouse::{DuckDbWarehouse, TableId, Warehouse};

pub use dimensions::{Dimension, DimensionBuilder};
pub use fact::FactBuilder;
pub use raw_loader::RawLoader;

/// Open the configured warehouse, loading httpfs when extracts are remote
pub fn open_warehouse(config: &PipelineConfig) -> Result<DuckDbWarehouse, WarehouseError> {
    DuckDbWarehouse::open(
        &config.warehouse,
        &config.project_id,
        config.source_layout().is_remote(),
    )
}

pub fn run_raw_load(config: &PipelineConfig, today: NaiveDate) -> Result<RunReport, WarehouseError> {
    let warehouse = open_warehouse(config)?;
    warehouse.ensure_dataset(&config.raw_dataset_id())?;
    Ok(RawLoader::new(&warehouse, config).run(today))
}

pub fn run_dimensions(config: &PipelineConfig) -> Result<RunReport, WarehouseError> {
    let warehouse = open_warehouse(config)?;
    warehouse.ensure_dataset(&config.warehouse_dataset_id())?;
    Ok(DimensionBuilder::new(&warehouse, config).run())
}

pub fn run_fact(config: &PipelineConfig) -> Result<RunReport, WarehouseError> {
    let warehouse = open_warehouse(config)?;
    warehouse.ensure_dataset(&config.warehouse_dataset_id())?;
    Ok(FactBuilder::new(&warehouse, config).run())
}

pub(crate) fn record_materialize(
    report: &mut RunReport,
    table: &TableId,
    result: Result<u64, WarehouseError>,
) {
    match result {
        Ok(rows) => {
            info!("Table {} created with {} rows", table, rows);
            report.record(table.to_string(), ItemStatus::Materialized { rows });
        }
        Err(err) => report.record_failure(&table.to_string(), &err),
    }
}

pub(crate) fn delete_temp<W: Warehouse>(warehouse: &W, report: &mut RunReport, table: &TableId) {
    match warehouse.delete_table_if_exists(table) {
        Ok(existed) => {
            info!("Temp table {} deleted", table);
            report.record(table.to_string(), ItemStatus::Deleted { existed });
        }
        Err(err) => report.record_failure(&table.to_string(), &err),
    }
}
