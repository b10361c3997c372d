use serde::{Deserialize, Serialize};

use crate::error::WarehouseError;
use crate::schema::SchemaField;
use crate::warehouse::{DatasetId, TableId};

/// How a query result is written into its destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteDisposition {
    /// Replace any existing contents
    Truncate,
    /// Add rows, creating the table if needed
    Append,
    /// Only write into a missing or empty table
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub rows_appended: u64,
    pub table_rows: u64,
}

/// The primitives the pipeline stages need from a warehouse engine.
/// Every call blocks until the engine has finished the job.
pub trait Warehouse: Send {
    /// Create the dataset if it does not exist yet
    fn ensure_dataset(&self, dataset: &DatasetId) -> Result<(), WarehouseError>;

    /// Append the rows of a headed CSV file to `table`, parsed strictly by
    /// `schema`. The table is created from the schema when missing.
    fn load_append(
        &self,
        source_uri: &str,
        table: &TableId,
        schema: &[SchemaField],
    ) -> Result<LoadStats, WarehouseError>;

    /// Run `sql` and write its result into `table`. Returns the table's row count.
    fn materialize(
        &self,
        table: &TableId,
        sql: &str,
        disposition: WriteDisposition,
    ) -> Result<u64, WarehouseError>;

    /// Returns whether the table existed. Missing tables are not an error.
    fn delete_table_if_exists(&self, table: &TableId) -> Result<bool, WarehouseError>;

    fn table_exists(&self, table: &TableId) -> Result<bool, WarehouseError>;

    fn row_count(&self, table: &TableId) -> Result<u64, WarehouseError>;

    /// Independent session on the same warehouse
    fn try_clone(&self) -> Result<Self, WarehouseError>
    where
        Self: Sized;

    fn query_create_or_replace(&self, table: &TableId, sql: &str) -> Result<u64, WarehouseError> {
        self.materialize(table, sql, WriteDisposition::Truncate)
    }

    fn query_create_or_replace_append(
        &self,
        table: &TableId,
        sql: &str,
    ) -> Result<u64, WarehouseError> {
        self.materialize(table, sql, WriteDisposition::Append)
    }
}
