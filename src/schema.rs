use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive column types accepted in raw CSV extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    String,
    Float,
    DateTime,
}

impl FieldType {
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldType::Integer => "BIGINT",
            FieldType::String => "VARCHAR",
            FieldType::Float => "DOUBLE",
            FieldType::DateTime => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldMode {
    Nullable,
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaField {
    pub name: &'static str,
    pub field_type: FieldType,
    pub mode: FieldMode,
}

impl SchemaField {
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            mode: FieldMode::Nullable,
        }
    }

    pub const fn with_mode(self, mode: FieldMode) -> Self {
        Self {
            name: self.name,
            field_type: self.field_type,
            mode,
        }
    }
}

use FieldType::{DateTime, Float, Integer, String as Text};

const STOCK: [SchemaField; 7] = [
    SchemaField::new("codigo_sucursal", Integer),
    SchemaField::new("fecha_cierre_comercial", DateTime),
    SchemaField::new("SKU_codigo", Text),
    SchemaField::new("SKU_descripcion", Text),
    SchemaField::new("stock_unidades", Integer),
    SchemaField::new("unidad", Text),
    SchemaField::new("n_distribuidor", Integer),
];

const SALE: [SchemaField; 8] = [
    SchemaField::new("codigo_sucursal", Integer),
    SchemaField::new("codigo_cliente", Integer),
    SchemaField::new("fecha_cierre_comercial", DateTime),
    SchemaField::new("SKU_codigo", Text),
    SchemaField::new("venta_unidades", Integer),
    SchemaField::new("venta_importe", Float),
    SchemaField::new("condicion_venta", Text),
    SchemaField::new("n_distribuidor", Integer),
];

const DEBT: [SchemaField; 6] = [
    SchemaField::new("codigo_sucursal", Integer),
    SchemaField::new("codigo_cliente", Integer),
    SchemaField::new("fecha_cierre_comercial", DateTime),
    SchemaField::new("deuda_vencida", Float),
    SchemaField::new("deuda_total", Float),
    SchemaField::new("n_distribuidor", Integer),
];

const CUSTOMER: [SchemaField; 19] = [
    SchemaField::new("codigo_sucursal", Integer),
    SchemaField::new("codigo_cliente", Integer),
    SchemaField::new("ciudad", Text),
    SchemaField::new("provincia", Text),
    SchemaField::new("estado", Text),
    SchemaField::new("nombre_cliente", Text),
    SchemaField::new("cuit", Integer),
    SchemaField::new("razon_social", Text),
    SchemaField::new("direccion", Text),
    SchemaField::new("dias_visita", Text),
    SchemaField::new("telefono", Text),
    SchemaField::new("fecha_alta", DateTime),
    SchemaField::new("fecha_baja", DateTime).with_mode(FieldMode::Nullable),
    SchemaField::new("lat", Float),
    SchemaField::new("long", Float),
    SchemaField::new("condicion_venta", Text),
    SchemaField::new("deuda_vencida", Float),
    SchemaField::new("tipo_negocio", Text),
    SchemaField::new("n_distribuidor", Integer),
];

/// The logical entities each distributor extracts daily
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawEntity {
    Stock,
    Sale,
    Debt,
    Customer,
}

impl RawEntity {
    /// Load order used by the raw loader
    pub const ALL: [RawEntity; 4] = [
        RawEntity::Stock,
        RawEntity::Sale,
        RawEntity::Debt,
        RawEntity::Customer,
    ];

    /// Name shared by the raw table and the storage folder
    pub fn table_name(self) -> &'static str {
        match self {
            RawEntity::Stock => "stock",
            RawEntity::Sale => "venta",
            RawEntity::Debt => "deuda",
            RawEntity::Customer => "cliente",
        }
    }

    pub fn schema(self) -> &'static [SchemaField] {
        match self {
            RawEntity::Stock => &STOCK,
            RawEntity::Sale => &SALE,
            RawEntity::Debt => &DEBT,
            RawEntity::Customer => &CUSTOMER,
        }
    }
}

impl fmt::Display for RawEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Column list for `CREATE TABLE`, e.g. `"a" BIGINT, "b" VARCHAR NOT NULL`
pub fn column_definitions(schema: &[SchemaField]) -> String {
    schema
        .iter()
        .map(|field| {
            let not_null = match field.mode {
                FieldMode::Required => " NOT NULL",
                FieldMode::Nullable => "",
            };
            format!(
                "{} {}{}",
                quote_ident(field.name),
                field.field_type.sql_type(),
                not_null
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Struct literal for `read_csv(columns = ...)`, fixing column order and types
pub fn csv_columns(schema: &[SchemaField]) -> String {
    let columns = schema
        .iter()
        .map(|field| {
            format!(
                "{}: {}",
                quote_literal(field.name),
                quote_literal(field.field_type.sql_type())
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", columns)
}
