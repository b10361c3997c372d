use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::error::ConfigError;
use crate::report::RunReport;

/// Flags shared by every stage binary. None are required.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// JSON config file; `DW_*` environment variables override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl CommonArgs {
    /// Read `.env`, then build the configuration
    pub fn load_config(&self) -> Result<PipelineConfig, ConfigError> {
        dotenvy::dotenv().ok();
        PipelineConfig::load(self.config.as_deref())
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Persist the report if asked to. Item failures never change the exit code.
pub fn finish(report: &RunReport, path: Option<&Path>) {
    for failure in report.failures() {
        info!("Failed item: {}", failure.target);
    }
    if let Some(path) = path {
        match report.write_json(path) {
            Ok(()) => info!("Run report written to {}", path.display()),
            Err(e) => error!("Could not write run report to {}: {}", path.display(), e),
        }
    }
}
