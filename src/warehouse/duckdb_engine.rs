use duckdb::{params, Connection};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::WarehouseConfig;
use crate::error::{ErrorKind, WarehouseError};
use crate::schema::{column_definitions, csv_columns, quote_ident, quote_literal, SchemaField};
use crate::warehouse::{DatasetId, LoadStats, TableId, Warehouse, WriteDisposition};

/// Warehouse backed by a DuckDB instance. The warehouse catalog (a DuckDB
/// file, `:memory:` or an attached PostgreSQL database) is attached under the
/// project id so `<project>.<dataset>.<table>` resolves directly.
pub struct DuckDbWarehouse {
    conn: Connection,
    job_timeout: Option<Duration>,
}

impl DuckDbWarehouse {
    pub fn open(
        config: &WarehouseConfig,
        project: &str,
        remote_storage: bool,
    ) -> Result<Self, WarehouseError> {
        let conn =
            Connection::open_in_memory().map_err(|e| WarehouseError::from_engine(project, &e))?;

        let mut setup = String::new();

        // Remote object storage is read through httpfs
        if remote_storage {
            setup.push_str("INSTALL httpfs; LOAD httpfs;\n");
        }

        // Attach the warehouse catalog under the project id
        match &config.postgres_uri {
            Some(uri) => {
                setup.push_str("INSTALL postgres; LOAD postgres;\n");
                setup.push_str(&format!(
                    "ATTACH {} AS {} (TYPE POSTGRES);",
                    quote_literal(uri),
                    quote_ident(project)
                ));
            }
            None => setup.push_str(&format!(
                "ATTACH {} AS {};",
                quote_literal(&config.database),
                quote_ident(project)
            )),
        }

        conn.execute_batch(&setup)
            .map_err(|e| WarehouseError::from_engine(project, &e))?;

        let backend = if config.postgres_uri.is_some() {
            "postgres"
        } else {
            config.database.as_str()
        };
        info!("Warehouse catalog {} attached ({})", project, backend);

        Ok(Self {
            conn,
            job_timeout: config.job_timeout(),
        })
    }

    /// Getter for inspecting the warehouse directly
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // Every job runs on its own cloned connection so that a job which
    // exceeds the timeout can be abandoned without blocking the caller.
    fn run_job<T, F>(&self, target: &str, job: F) -> Result<T, WarehouseError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> duckdb::Result<T> + Send + 'static,
    {
        let mut conn = self
            .conn
            .try_clone()
            .map_err(|e| WarehouseError::from_engine(target, &e))?;

        let Some(limit) = self.job_timeout else {
            return job(&mut conn).map_err(|e| WarehouseError::from_engine(target, &e));
        };

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(job(&mut conn));
        });

        match rx.recv_timeout(limit) {
            Ok(result) => result.map_err(|e| WarehouseError::from_engine(target, &e)),
            Err(RecvTimeoutError::Timeout) => Err(WarehouseError::new(
                ErrorKind::EngineExecution,
                target,
                format!("job did not complete within {}s", limit.as_secs()),
            )),
            Err(RecvTimeoutError::Disconnected) => Err(WarehouseError::new(
                ErrorKind::EngineExecution,
                target,
                "job worker exited without a result",
            )),
        }
    }
}

fn count_rows(conn: &Connection, table_sql: &str) -> duckdb::Result<u64> {
    let count: i64 = conn.query_row(&format!("SELECT count(*) FROM {}", table_sql), [], |row| {
        row.get(0)
    })?;
    Ok(count as u64)
}

fn table_exists(conn: &Connection, table: &TableId) -> duckdb::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM information_schema.tables
         WHERE table_catalog = ? AND table_schema = ? AND table_name = ?",
        params![table.project, table.dataset, table.name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn strip_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}

impl Warehouse for DuckDbWarehouse {
    fn ensure_dataset(&self, dataset: &DatasetId) -> Result<(), WarehouseError> {
        let create_schema_sql = format!("CREATE SCHEMA IF NOT EXISTS {};", dataset.sql());
        self.run_job(&dataset.to_string(), move |conn| {
            conn.execute_batch(&create_schema_sql)
        })?;
        debug!("Dataset {} ready", dataset);
        Ok(())
    }

    fn load_append(
        &self,
        source_uri: &str,
        table: &TableId,
        schema: &[SchemaField],
    ) -> Result<LoadStats, WarehouseError> {
        let table_sql = table.sql();

        // Create the raw table on first load, like a create-if-needed load job
        let create_table_sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            table_sql,
            column_definitions(schema)
        );

        // Header skipped; columns bound by position with fixed types
        let insert_sql = format!(
            "INSERT INTO {} SELECT * FROM read_csv({}, header = true, auto_detect = false, delim = ',', quote = '\"', columns = {});",
            table_sql,
            quote_literal(source_uri),
            csv_columns(schema)
        );
        debug!("Load job: {}", insert_sql);

        self.run_job(source_uri, move |conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(&create_table_sql)?;
            let before = count_rows(&tx, &table_sql)?;
            tx.execute_batch(&insert_sql)?;
            let after = count_rows(&tx, &table_sql)?;
            tx.commit()?;
            Ok(LoadStats {
                rows_appended: after - before,
                table_rows: after,
            })
        })
    }

    fn materialize(
        &self,
        table: &TableId,
        sql: &str,
        disposition: WriteDisposition,
    ) -> Result<u64, WarehouseError> {
        let target = table.to_string();

        if disposition == WriteDisposition::Empty
            && self.table_exists(table)?
            && self.row_count(table)? > 0
        {
            return Err(WarehouseError::new(
                ErrorKind::MalformedRequest,
                target,
                "write-empty destination already contains rows",
            ));
        }

        let table_id = table.clone();
        let table_sql = table.sql();
        let query = strip_statement(sql).to_string();
        debug!("Query job for {}: {}", target, query);

        self.run_job(&target, move |conn| {
            let tx = conn.transaction()?;
            let replace_sql = format!(
                "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} AS {query};",
                table = table_sql,
                query = query
            );
            match disposition {
                WriteDisposition::Truncate | WriteDisposition::Empty => {
                    tx.execute_batch(&replace_sql)?;
                }
                WriteDisposition::Append => {
                    if table_exists(&tx, &table_id)? {
                        tx.execute_batch(&format!("INSERT INTO {} {};", table_sql, query))?;
                    } else {
                        tx.execute_batch(&replace_sql)?;
                    }
                }
            }
            let rows = count_rows(&tx, &table_sql)?;
            tx.commit()?;
            Ok(rows)
        })
    }

    fn delete_table_if_exists(&self, table: &TableId) -> Result<bool, WarehouseError> {
        let table_id = table.clone();
        self.run_job(&table.to_string(), move |conn| {
            let existed = table_exists(conn, &table_id)?;
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", table_id.sql()))?;
            Ok(existed)
        })
    }

    fn table_exists(&self, table: &TableId) -> Result<bool, WarehouseError> {
        let table_id = table.clone();
        self.run_job(&table.to_string(), move |conn| table_exists(conn, &table_id))
    }

    fn row_count(&self, table: &TableId) -> Result<u64, WarehouseError> {
        let table_sql = table.sql();
        self.run_job(&table.to_string(), move |conn| count_rows(conn, &table_sql))
    }

    fn try_clone(&self) -> Result<Self, WarehouseError> {
        let conn = self
            .conn
            .try_clone()
            .map_err(|e| WarehouseError::from_engine("warehouse session", &e))?;
        Ok(Self {
            conn,
            job_timeout: self.job_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_statement() {
        assert_eq!(strip_statement("  SELECT 1;\n  "), "SELECT 1");
        assert_eq!(strip_statement("SELECT 1"), "SELECT 1");
    }
}
