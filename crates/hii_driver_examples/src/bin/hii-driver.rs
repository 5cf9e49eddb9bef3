use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use hii_driver::prelude::*;
use hii_driver_examples::{demo_grid, init_tracing, log_run_summary, PngExporter, SyntheticCatalog};
use tracing::info;

/// Compute a human-footprint driver raster over a synthetic catalog.
#[derive(Parser, Debug)]
#[command(name = "hii-driver", version)]
struct Cli {
    /// Task date (YYYY-MM-DD); defaults to today (UTC).
    #[arg(long)]
    taskdate: Option<NaiveDate>,

    /// Realm appended to the export destination.
    #[arg(long)]
    realm: Option<String>,

    /// Built-in driver: infrastructure_v1, road_v2 or road_v3.
    #[arg(long, default_value = "road_v3")]
    driver: String,

    /// Load the plan from a RON file instead of a built-in driver.
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Seed of the synthetic catalog.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output directory for PNG exports.
    #[arg(long, default_value = "hii-driver-out")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let task_date = cli.taskdate.unwrap_or_else(|| Utc::now().date_naive());
    let plan = match &cli.plan {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            DriverPlan::from_ron(&text)?
        }
        None => DriverPlan::builtin(&cli.driver)?,
    };
    info!(driver = %plan.id, %task_date, realm = ?cli.realm, "configured");

    let catalog = SyntheticCatalog::new(demo_grid(), cli.seed).build(&plan, task_date);

    let mut config = RunConfig::new(demo_grid()).with_task_date(task_date);
    if let Some(realm) = &cli.realm {
        config = config.with_realm(realm.clone());
    }
    let mut pipeline = DriverPipeline::try_new(config, &catalog)?;

    let mut exporter = PngExporter::new(&cli.out);
    let mut sink = VecSink::new();
    pipeline
        .run_and_export(&plan, &mut exporter, &mut sink)
        .with_context(|| format!("running {}", plan.id))?;

    log_run_summary(&sink);
    for path in exporter.written() {
        println!("{}", path.display());
    }
    Ok(())
}
