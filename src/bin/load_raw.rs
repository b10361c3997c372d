//! Stage 1: append every distributor's daily CSV extracts to the raw tables.
//!
//! ```sh
//! cargo run --bin load-raw
//! cargo run --bin load-raw -- --date 2023-10-18 --report load.json
//! ```

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use distributor_dw::cli::{self, CommonArgs};
use distributor_dw::pipeline;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "load-raw", about = "Appends distributor CSV extracts to the raw tables")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Most recent closing date to load (defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn main() -> Result<()> {
    cli::init_tracing();
    let args = Args::parse();
    let config = args
        .common
        .load_config()
        .context("Failed to load configuration")?;

    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    info!(
        "Loading {} day(s) of extracts up to {} from {}",
        config.day_count, today, config.storage_base
    );

    let report = pipeline::run_raw_load(&config, today).context("Failed to open the warehouse")?;
    cli::finish(&report, args.common.report.as_deref());
    Ok(())
}
