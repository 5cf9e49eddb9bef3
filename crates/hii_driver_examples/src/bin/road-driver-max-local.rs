use chrono::NaiveDate;
use hii_driver::prelude::*;
use hii_driver_examples::{demo_grid, init_tracing, log_run_summary, PngExporter, SyntheticCatalog};

/// Runs the mid-generation road driver and the final one on the same synthetic catalog.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let task_date = NaiveDate::from_ymd_opt(2019, 6, 1).ok_or_else(|| anyhow::anyhow!("bad date"))?;
    let v2 = DriverPlan::road_v2()?;
    let v3 = DriverPlan::road_v3()?;
    let catalog = SyntheticCatalog::new(demo_grid(), 11).build(&v3, task_date);

    let config = RunConfig::new(demo_grid()).with_task_date(task_date);
    let mut pipeline = DriverPipeline::try_new(config, &catalog)?;
    let mut exporter = PngExporter::new("road-driver-max-local");

    for plan in [&v2, &v3] {
        let mut sink = VecSink::new();
        let raster = pipeline.run_with_events(plan, &mut sink)?;
        exporter.export(&raster, &format!("{}/{}", plan.destination, plan.id))?;
        log_run_summary(&sink);
    }
    Ok(())
}
