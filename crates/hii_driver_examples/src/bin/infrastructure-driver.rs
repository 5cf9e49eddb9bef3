use chrono::NaiveDate;
use hii_driver::prelude::*;
use hii_driver_examples::{demo_grid, init_tracing, log_run_summary, PngExporter, SyntheticCatalog};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let task_date = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or_else(|| anyhow::anyhow!("bad date"))?;
    let plan = DriverPlan::infrastructure_v1()?;
    let catalog = SyntheticCatalog::new(demo_grid(), 3)
        .with_walks_per_category(1)
        .build(&plan, task_date);

    let config = RunConfig::new(demo_grid())
        .with_task_date(task_date)
        .with_realm("sumatra_poc");
    let mut pipeline = DriverPipeline::try_new(config, &catalog)?;

    let mut exporter = PngExporter::new("infrastructure-driver");
    let mut sink = VecSink::new();
    pipeline.run_and_export(&plan, &mut exporter, &mut sink)?;

    log_run_summary(&sink);
    for path in exporter.written() {
        println!("wrote {}", path.display());
    }
    Ok(())
}
