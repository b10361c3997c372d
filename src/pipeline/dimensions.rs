use std::thread;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{ErrorKind, WarehouseError};
use crate::pipeline::{delete_temp, record_materialize};
use crate::report::{RunReport, Stage};
use crate::warehouse::{DatasetId, TableId, Warehouse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Date,
    Product,
    Location,
    Customer,
}

// Columns of each dimension, business key first. The surrogate key orders
// over all of them so ties between distinct tuples cannot occur.
const DATE_COLUMNS: &[&str] = &["fecha_cierre_comercial"];
const PRODUCT_COLUMNS: &[&str] = &["sku_codigo", "descripcion"];
const LOCATION_COLUMNS: &[&str] = &["Provincia", "Ciudad"];
const CUSTOMER_COLUMNS: &[&str] = &[
    "codigo_sucursal",
    "Codigo_cliente",
    "n_distribuidor",
    "nombre_cliente",
    "direccion",
    "razon_social",
    "cuit",
    "estado",
    "telefono",
    "fecha_alta",
    "fecha_baja",
    "tipo_negocio",
];

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Date,
        Dimension::Product,
        Dimension::Location,
        Dimension::Customer,
    ];

    pub fn temp_table(self) -> &'static str {
        match self {
            Dimension::Date => "temp_fechas",
            Dimension::Product => "temp_producto",
            Dimension::Location => "temp_ubicacion",
            Dimension::Customer => "temp_cliente",
        }
    }

    pub fn final_table(self) -> &'static str {
        match self {
            Dimension::Date => "dim_fechas",
            Dimension::Product => "dim_producto",
            Dimension::Location => "dim_ubicacion",
            Dimension::Customer => "dim_cliente",
        }
    }

    /// Surrogate key column of the final table
    pub fn key_column(self) -> &'static str {
        match self {
            Dimension::Date => "id_fecha",
            Dimension::Product => "id_producto",
            Dimension::Location => "id_ubicacion",
            Dimension::Customer => "id_cliente",
        }
    }

    fn columns(self) -> &'static [&'static str] {
        match self {
            Dimension::Date => DATE_COLUMNS,
            Dimension::Product => PRODUCT_COLUMNS,
            Dimension::Location => LOCATION_COLUMNS,
            Dimension::Customer => CUSTOMER_COLUMNS,
        }
    }

    /// Distinct business tuples read from the raw tables
    pub fn temp_query(self, raw: &DatasetId) -> String {
        match self {
            Dimension::Date => format!(
                "SELECT DISTINCT
    stock.fecha_cierre_comercial AS fecha_cierre_comercial
FROM {} AS stock",
                raw.table("stock").sql()
            ),
            Dimension::Product => format!(
                "SELECT DISTINCT
    stock.SKU_codigo AS sku_codigo,
    stock.SKU_descripcion AS descripcion
FROM {} AS stock",
                raw.table("stock").sql()
            ),
            Dimension::Location => format!(
                "SELECT DISTINCT
    cliente.provincia AS Provincia,
    cliente.ciudad AS Ciudad
FROM {} AS cliente",
                raw.table("cliente").sql()
            ),
            Dimension::Customer => format!(
                "SELECT DISTINCT
    cliente.codigo_sucursal,
    cliente.codigo_cliente AS Codigo_cliente,
    cliente.n_distribuidor,
    cliente.nombre_cliente,
    cliente.direccion,
    cliente.razon_social,
    cliente.cuit,
    cliente.estado,
    cliente.telefono,
    cliente.fecha_alta,
    cliente.fecha_baja,
    cliente.tipo_negocio
FROM {} AS cliente",
                raw.table("cliente").sql()
            ),
        }
    }

    /// Dense 1-based surrogate key over the temp table, ordered by every
    /// column (business key first, NULLs last)
    pub fn final_query(self, target: &DatasetId) -> String {
        let order_by = self
            .columns()
            .iter()
            .map(|c| format!("{} NULLS LAST", c))
            .collect::<Vec<_>>()
            .join(", ");
        let key = format!("ROW_NUMBER() OVER (ORDER BY {}) AS {}", order_by, self.key_column());
        let temp = target.table(self.temp_table()).sql();

        let projection = match self {
            Dimension::Date => "fecha_cierre_comercial,
    EXTRACT(DAY FROM fecha_cierre_comercial) AS dia,
    EXTRACT(MONTH FROM fecha_cierre_comercial) AS mes,
    EXTRACT(QUARTER FROM fecha_cierre_comercial) AS trimestre"
                .to_string(),
            Dimension::Product => "sku_codigo AS Codigo_SKU,
    descripcion AS nombre_producto"
                .to_string(),
            Dimension::Location | Dimension::Customer => self.columns().join(",\n    "),
        };

        format!(
            "SELECT
    {},
    {}
FROM {}
ORDER BY {}",
            key,
            projection,
            temp,
            self.key_column()
        )
    }
}

/// Stage 2: rebuilds the four dimension tables from the raw tables
pub struct DimensionBuilder<'a, W: Warehouse> {
    warehouse: &'a W,
    raw: DatasetId,
    target: DatasetId,
    parallel: bool,
}

impl<'a, W: Warehouse> DimensionBuilder<'a, W> {
    pub fn new(warehouse: &'a W, config: &PipelineConfig) -> Self {
        Self {
            warehouse,
            raw: config.raw_dataset_id(),
            target: config.warehouse_dataset_id(),
            parallel: config.parallel_dimensions,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn table(&self, name: &str) -> TableId {
        self.target.table(name)
    }

    /// All temp tables, then all final tables, then the temp cleanup.
    /// Failures are recorded and never stop the remaining dimensions.
    pub fn run(&self) -> RunReport {
        let mut report = RunReport::new(Stage::Dimensions);

        let temp_jobs: Vec<(TableId, String)> = Dimension::ALL
            .iter()
            .map(|d| (self.table(d.temp_table()), d.temp_query(&self.raw)))
            .collect();
        self.materialize_all(&temp_jobs, &mut report);

        let final_jobs: Vec<(TableId, String)> = Dimension::ALL
            .iter()
            .map(|d| (self.table(d.final_table()), d.final_query(&self.target)))
            .collect();
        self.materialize_all(&final_jobs, &mut report);

        for (temp, _) in &temp_jobs {
            delete_temp(self.warehouse, &mut report, temp);
        }

        report.finish();
        report.log_summary();
        report
    }

    fn materialize_all(&self, jobs: &[(TableId, String)], report: &mut RunReport) {
        let results = if self.parallel {
            self.materialize_parallel(jobs)
        } else {
            jobs.iter()
                .map(|(table, sql)| self.warehouse.query_create_or_replace(table, sql))
                .collect()
        };

        for ((table, _), result) in jobs.iter().zip(results) {
            record_materialize(report, table, result);
        }
    }

    // One session per table, joined before returning so the next phase
    // only starts once every table of this phase is written.
    fn materialize_parallel(&self, jobs: &[(TableId, String)]) -> Vec<Result<u64, WarehouseError>> {
        info!("Building {} tables concurrently", jobs.len());
        thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .iter()
                .map(|(table, sql)| {
                    let session = self.warehouse.try_clone();
                    scope.spawn(move || {
                        session.and_then(|warehouse| warehouse.query_create_or_replace(table, sql))
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(jobs)
                .map(|(handle, (table, _))| {
                    handle.join().unwrap_or_else(|_| {
                        Err(WarehouseError::new(
                            ErrorKind::EngineExecution,
                            table.to_string(),
                            "worker thread panicked",
                        ))
                    })
                })
                .collect()
        })
    }
}
