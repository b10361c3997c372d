//! Stage 3: build the sales fact table. Run after `build-dimensions`.

use anyhow::{Context, Result};
use clap::Parser;
use distributor_dw::cli::{self, CommonArgs};
use distributor_dw::pipeline;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "build-fact", about = "Builds the sales fact table from raw sales and the dimensions")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    cli::init_tracing();
    let args = Args::parse();
    let config = args
        .common
        .load_config()
        .context("Failed to load configuration")?;

    info!("Building fact table in {}", config.warehouse_dataset_id());

    let report = pipeline::run_fact(&config).context("Failed to open the warehouse")?;
    cli::finish(&report, args.common.report.as_deref());
    Ok(())
}
