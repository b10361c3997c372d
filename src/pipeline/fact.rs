use crate::config::PipelineConfig;
use crate::pipeline::{delete_temp, record_materialize, Dimension};
use crate::report::{RunReport, Stage};
use crate::warehouse::{DatasetId, TableId, Warehouse};

pub const FACT_TABLE: &str = "fact_ventas";
pub const FACT_TEMP_TABLE: &str = "fact_ventas_temp";

/// Sales joined with the customer's location attributes. The raw customer
/// table repeats every customer once per loaded day, so it is deduplicated
/// before the join to keep one row per sale.
pub fn temp_query(raw: &DatasetId) -> String {
    format!(
        "SELECT
    cliente.ciudad,
    cliente.provincia,
    venta.codigo_sucursal,
    venta.codigo_cliente,
    venta.fecha_cierre_comercial,
    venta.SKU_codigo,
    venta.venta_unidades,
    venta.venta_importe
FROM {venta} AS venta
JOIN (
    SELECT DISTINCT codigo_sucursal, codigo_cliente, ciudad, provincia
    FROM {cliente}
) AS cliente
    ON venta.codigo_sucursal = cliente.codigo_sucursal
    AND venta.codigo_cliente = cliente.codigo_cliente",
        venta = raw.table("venta").sql(),
        cliente = raw.table("cliente").sql(),
    )
}

/// Resolve every dimension's surrogate key by business key. Inner joins:
/// rows without a match in some dimension are dropped.
pub fn final_query(target: &DatasetId) -> String {
    let dim = |d: Dimension| target.table(d.final_table()).sql();
    format!(
        "SELECT
    dim_cliente.id_cliente,
    dim_fechas.id_fecha,
    dim_producto.id_producto,
    dim_ubicacion.id_ubicacion,
    fact.venta_unidades,
    fact.venta_importe
FROM {temp} AS fact
JOIN {ubicacion} AS dim_ubicacion
    ON fact.ciudad = dim_ubicacion.Ciudad
    AND fact.provincia = dim_ubicacion.Provincia
JOIN {producto} AS dim_producto
    ON fact.SKU_codigo = dim_producto.Codigo_SKU
JOIN {fechas} AS dim_fechas
    ON fact.fecha_cierre_comercial = dim_fechas.fecha_cierre_comercial
JOIN {cliente} AS dim_cliente
    ON fact.codigo_sucursal = dim_cliente.codigo_sucursal
    AND fact.codigo_cliente = dim_cliente.Codigo_cliente",
        temp = target.table(FACT_TEMP_TABLE).sql(),
        ubicacion = dim(Dimension::Location),
        producto = dim(Dimension::Product),
        fechas = dim(Dimension::Date),
        cliente = dim(Dimension::Customer),
    )
}

/// Stage 3: builds the sales fact table keyed by dimension surrogate keys
pub struct FactBuilder<'a, W: Warehouse> {
    warehouse: &'a W,
    raw: DatasetId,
    target: DatasetId,
}

impl<'a, W: Warehouse> FactBuilder<'a, W> {
    pub fn new(warehouse: &'a W, config: &PipelineConfig) -> Self {
        Self {
            warehouse,
            raw: config.raw_dataset_id(),
            target: config.warehouse_dataset_id(),
        }
    }

    pub fn fact_table(&self) -> TableId {
        self.target.table(FACT_TABLE)
    }

    pub fn run(&self) -> RunReport {
        let mut report = RunReport::new(Stage::Fact);

        let temp = self.target.table(FACT_TEMP_TABLE);
        let result = self
            .warehouse
            .query_create_or_replace(&temp, &temp_query(&self.raw));
        record_materialize(&mut report, &temp, result);

        let fact = self.fact_table();
        let result = self
            .warehouse
            .query_create_or_replace(&fact, &final_query(&self.target));
        record_materialize(&mut report, &fact, result);

        delete_temp(self.warehouse, &mut report, &temp);

        report.finish();
        report.log_summary();
        report
    }
}
