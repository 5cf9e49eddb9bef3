#![forbid(unsafe_code)]

mod rendering;
mod synthetic;

pub use rendering::{init_tracing, log_run_summary, render_driver_to_png, PngExporter};
pub use synthetic::{demo_grid, SyntheticCatalog};
