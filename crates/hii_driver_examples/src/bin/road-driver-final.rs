use chrono::NaiveDate;
use hii_driver::prelude::*;
use hii_driver_examples::{demo_grid, init_tracing, log_run_summary, PngExporter, SyntheticCatalog};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let task_date = NaiveDate::from_ymd_opt(2021, 1, 1).ok_or_else(|| anyhow::anyhow!("bad date"))?;
    let plan = DriverPlan::road_v3()?;
    let catalog = SyntheticCatalog::new(demo_grid(), 7).build(&plan, task_date);

    let config = RunConfig::new(demo_grid()).with_task_date(task_date);
    let mut pipeline = DriverPipeline::try_new(config, &catalog)?;

    let mut exporter = PngExporter::new("road-driver-final");
    let mut sink = VecSink::new();
    let raster = pipeline.run_and_export(&plan, &mut exporter, &mut sink)?;

    log_run_summary(&sink);
    if let Some(peak) = raster.max_value() {
        println!("road driver peak: {peak} (x{} quantized)", Quantization::default().scale);
    }
    Ok(())
}
