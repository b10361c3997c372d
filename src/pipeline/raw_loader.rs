use chrono::{Days, NaiveDate};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{ErrorKind, WarehouseError};
use crate::report::{RunReport, Stage};
use crate::schema::{RawEntity, SchemaField};
use crate::storage::SourceLayout;
use crate::warehouse::{DatasetId, LoadStats, TableId, Warehouse};

/// Stage 1: appends every distributor's daily extracts to the raw tables
pub struct RawLoader<'a, W: Warehouse> {
    warehouse: &'a W,
    layout: SourceLayout,
    raw: DatasetId,
    distributor_count: u32,
    day_count: u32,
}

impl<'a, W: Warehouse> RawLoader<'a, W> {
    pub fn new(warehouse: &'a W, config: &PipelineConfig) -> Self {
        Self {
            warehouse,
            layout: config.source_layout(),
            raw: config.raw_dataset_id(),
            distributor_count: config.distributor_count,
            day_count: config.day_count,
        }
    }

    pub fn raw_table(&self, entity: RawEntity) -> TableId {
        self.raw.table(entity.table_name())
    }

    /// Append one CSV file to `table`. Returns the appended row count along
    /// with the table's new total.
    pub fn load(
        &self,
        source_uri: &str,
        table: &TableId,
        schema: &[SchemaField],
    ) -> Result<LoadStats, WarehouseError> {
        self.warehouse.load_append(source_uri, table, schema)
    }

    /// Every (distributor, day, entity) triple is attempted; failures are
    /// recorded and the loop carries on.
    pub fn run(&self, today: NaiveDate) -> RunReport {
        let mut report = RunReport::new(Stage::RawLoad);

        for distributor in 1..self.distributor_count {
            info!("<Distributor ({})>", distributor);
            for offset in 0..self.day_count {
                let Some(closing_date) = today.checked_sub_days(Days::new(u64::from(offset)))
                else {
                    // every later offset is further out of range
                    let target = format!("{}/distributor_{}", self.layout.base(), distributor);
                    let err = WarehouseError::new(
                        ErrorKind::MalformedRequest,
                        &target,
                        format!("closing date {} days before {} is out of range", offset, today),
                    );
                    report.record_failure(&target, &err);
                    break;
                };
                for entity in RawEntity::ALL {
                    let source_uri = self.layout.source_uri(distributor, entity, closing_date);
                    let table = self.raw_table(entity);
                    let result = self.load(&source_uri, &table, entity.schema());
                    report.record_load(&source_uri, result);
                }
            }
        }

        report.finish();
        report.log_summary();
        report
    }
}
