use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ErrorKind, WarehouseError};
use crate::warehouse::LoadStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RawLoad,
    Dimensions,
    Fact,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::RawLoad => "raw load",
            Stage::Dimensions => "dimension build",
            Stage::Fact => "fact build",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Loaded { rows_appended: u64, table_rows: u64 },
    Materialized { rows: u64 },
    Deleted { existed: bool },
    Failed { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Table id or source uri
    pub target: String,
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ItemStatus::Failed { .. })
    }
}

/// Outcome of every item a stage attempted. Failures are collected here
/// instead of being raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<ItemOutcome>,
}

impl RunReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, target: impl Into<String>, status: ItemStatus) {
        self.outcomes.push(ItemOutcome {
            target: target.into(),
            status,
        });
    }

    pub fn record_load(&mut self, target: &str, result: Result<LoadStats, WarehouseError>) {
        match result {
            Ok(stats) => {
                info!(
                    "Loaded {} rows from {} ({} rows in table)",
                    stats.rows_appended, target, stats.table_rows
                );
                self.record(
                    target,
                    ItemStatus::Loaded {
                        rows_appended: stats.rows_appended,
                        table_rows: stats.table_rows,
                    },
                );
            }
            Err(err) => self.record_failure(target, &err),
        }
    }

    pub fn record_failure(&mut self, target: &str, err: &WarehouseError) {
        warn!("{} failed [{}]: {}", target, err.kind(), err.message());
        self.record(
            target,
            ItemStatus::Failed {
                kind: err.kind(),
                message: err.message().to_string(),
            },
        );
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failed()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn status_of(&self, target: &str) -> Option<&ItemStatus> {
        self.outcomes
            .iter()
            .rev()
            .find(|o| o.target == target)
            .map(|o| &o.status)
    }

    pub fn log_summary(&self) {
        if self.failed() == 0 {
            info!(
                "{} finished: {} items succeeded",
                self.stage,
                self.succeeded()
            );
        } else {
            warn!(
                "{} finished: {} succeeded, {} failed",
                self.stage,
                self.succeeded(),
                self.failed()
            );
        }
    }

    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}
