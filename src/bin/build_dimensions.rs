//! Stage 2: rebuild the dimension tables from the raw tables.
//! Run after `load-raw`.

use anyhow::{Context, Result};
use clap::Parser;
use distributor_dw::cli::{self, CommonArgs};
use distributor_dw::pipeline;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "build-dimensions", about = "Builds the date, product, location and customer dimensions")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Build the four tables of each phase concurrently
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

fn main() -> Result<()> {
    cli::init_tracing();
    let args = Args::parse();
    let mut config = args
        .common
        .load_config()
        .context("Failed to load configuration")?;
    config.parallel_dimensions |= args.parallel;

    info!(
        "Building dimensions in {} from {}",
        config.warehouse_dataset_id(),
        config.raw_dataset_id()
    );

    let report = pipeline::run_dimensions(&config).context("Failed to open the warehouse")?;
    cli::finish(&report, args.common.report.as_deref());
    Ok(())
}
