use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::storage::SourceLayout;
use crate::warehouse::DatasetId;

/// Everything a pipeline run needs, loaded once at process start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub project_id: String,
    pub raw_dataset: String,
    pub warehouse_dataset: String,
    pub storage_base: String,
    /// Exclusive upper bound: distributors `1..distributor_count` are loaded
    pub distributor_count: u32,
    pub day_count: u32,
    pub parallel_dimensions: bool,
    pub warehouse: WarehouseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// DuckDB database file, or `:memory:`
    pub database: String,
    /// Attach this PostgreSQL database as the warehouse catalog instead
    pub postgres_uri: Option<String>,
    /// 0 disables the limit
    pub job_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_id: "usm-infra-grupo8-401213".to_string(),
            raw_dataset: "datos_crudos".to_string(),
            warehouse_dataset: "datawarehouse_argideal".to_string(),
            storage_base: "gs://datos_argideal_grupo8".to_string(),
            distributor_count: 4,
            day_count: 2,
            parallel_dimensions: false,
            warehouse: WarehouseConfig::default(),
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database: "warehouse.duckdb".to_string(),
            postgres_uri: None,
            job_timeout_secs: 900,
        }
    }
}

impl WarehouseConfig {
    pub fn job_timeout(&self) -> Option<Duration> {
        match self.job_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl PipelineConfig {
    /// Defaults, then the optional JSON file, then `DW_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DW_PROJECT_ID") {
            self.project_id = v;
        }
        if let Some(v) = lookup("DW_RAW_DATASET") {
            self.raw_dataset = v;
        }
        if let Some(v) = lookup("DW_WAREHOUSE_DATASET") {
            self.warehouse_dataset = v;
        }
        if let Some(v) = lookup("DW_STORAGE_BASE") {
            self.storage_base = v;
        }
        if let Some(v) = lookup("DW_DISTRIBUTOR_COUNT") {
            self.distributor_count = parse_override("DW_DISTRIBUTOR_COUNT", &v)?;
        }
        if let Some(v) = lookup("DW_DAY_COUNT") {
            self.day_count = parse_override("DW_DAY_COUNT", &v)?;
        }
        if let Some(v) = lookup("DW_PARALLEL_DIMENSIONS") {
            self.parallel_dimensions = parse_override("DW_PARALLEL_DIMENSIONS", &v)?;
        }
        if let Some(v) = lookup("DW_DATABASE") {
            self.warehouse.database = v;
        }
        if let Some(v) = lookup("DW_POSTGRES_URI") {
            self.warehouse.postgres_uri = Some(v).filter(|uri| !uri.is_empty());
        }
        if let Some(v) = lookup("DW_JOB_TIMEOUT_SECS") {
            self.warehouse.job_timeout_secs = parse_override("DW_JOB_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let identifiers = [
            ("project_id", &self.project_id),
            ("raw_dataset", &self.raw_dataset),
            ("warehouse_dataset", &self.warehouse_dataset),
            ("storage_base", &self.storage_base),
            ("warehouse.database", &self.warehouse.database),
        ];
        for (name, value) in identifiers {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }
        if self.distributor_count < 1 {
            return Err(ConfigError::Invalid(
                "distributor_count is an exclusive upper bound and must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn raw_dataset_id(&self) -> DatasetId {
        DatasetId::new(&self.project_id, &self.raw_dataset)
    }

    pub fn warehouse_dataset_id(&self) -> DatasetId {
        DatasetId::new(&self.project_id, &self.warehouse_dataset)
    }

    pub fn source_layout(&self) -> SourceLayout {
        SourceLayout::new(&self.storage_base)
    }
}

fn parse_override<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride {
            key: key.to_string(),
            value: value.to_string(),
        })
}
