use std::path::{Path, PathBuf};

use hii_driver::prelude::{
    DriverEvent, DriverEventKind, DriverRaster, Error, RasterExporter, Result, VecSink,
};
use image::{Rgb, RgbImage};
use tracing::info;
use tracing_subscriber::EnvFilter;

const WATER: [u8; 3] = [38, 84, 124];

/// Colour stops of the land ramp, from no pressure to the highest driver value.
const RAMP: [[u8; 3]; 5] = [
    [250, 250, 240],
    [253, 219, 146],
    [244, 150, 83],
    [213, 62, 79],
    [110, 20, 60],
];

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .try_init();
}

fn ramp(t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0) * (RAMP.len() - 1) as f32;
    let i = (t.floor() as usize).min(RAMP.len() - 2);
    let f = t - i as f32;
    let (a, b) = (RAMP[i], RAMP[i + 1]);
    [0, 1, 2].map(|c| (a[c] as f32 + (b[c] as f32 - a[c] as f32) * f).round() as u8)
}

/// Renders `raster` with north up: water in blue, land on a ramp scaled to the raster maximum.
pub fn render_driver_to_png(raster: &DriverRaster, path: impl AsRef<Path>) -> Result<()> {
    let (w, h) = (raster.width() as u32, raster.height() as u32);
    let max = raster.max_value().filter(|m| *m > 0.0).unwrap_or(1.0);

    let mut img = RgbImage::new(w, h);
    for (ix, iy, value) in raster.cells() {
        let color = match value {
            Some(v) => ramp(v / max),
            None => WATER,
        };
        img.put_pixel(ix as u32, h - 1 - iy as u32, Rgb(color));
    }

    img.save(path.as_ref())
        .map_err(|e| Error::Other(format!("failed to write {}: {e}", path.as_ref().display())))
}

/// Exporter that writes each destination as a PNG below an output directory.
///
/// `driver/infrastructure/sumatra_poc` becomes `<dir>/driver_infrastructure_sumatra_poc.png`.
pub struct PngExporter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl PngExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn path_for(&self, destination: &str) -> PathBuf {
        let stem: String = destination
            .trim_matches('/')
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.dir.join(format!("{stem}.png"))
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl RasterExporter for PngExporter {
    fn export(&mut self, raster: &DriverRaster, destination: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(destination);
        render_driver_to_png(raster, &path)?;
        info!(destination, path = %path.display(), "wrote png");
        self.written.push(path);
        Ok(())
    }
}

/// Logs resolved inputs, fallbacks, empty categories and the final statistics of a run.
pub fn log_run_summary(sink: &VecSink) {
    for event in sink.as_slice() {
        match event {
            DriverEvent::InputResolved {
                key,
                effective_date,
            } => match effective_date {
                Some(date) => info!("input {key}: asset of {date}"),
                None => info!("input {key}: static"),
            },
            DriverEvent::FallbackApplied { driver, categories } => {
                info!("{driver}: fell back to {}", categories.join(", "));
            }
            DriverEvent::RunFinished {
                driver,
                defined_cells,
                max_value,
            } => info!(
                "{driver}: {defined_cells} land cells, max {}",
                max_value.map_or_else(|| "-".to_string(), |m| m.to_string())
            ),
            _ => {}
        }
    }
    info!(
        empty_categories = sink.count(DriverEventKind::CategoryEmpty),
        baked_fields = sink.count(DriverEventKind::FieldBaked),
        "run summary"
    );
}
