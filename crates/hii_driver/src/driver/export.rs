//! Final driver rasters and the export boundary.
use std::collections::HashMap;

use tracing::debug;

use crate::driver::combine::Quantization;
use crate::error::Result;
use crate::fieldgraph::{Raster, RasterGrid};

/// Cell values of a [`DriverRaster`]; `None` marks an undefined (water) cell.
#[derive(Clone, Debug, PartialEq)]
pub enum DriverValues {
    Continuous(Vec<Option<f32>>),
    Quantized { scale: f32, values: Vec<Option<i32>> },
}

impl DriverValues {
    pub fn len(&self) -> usize {
        match self {
            DriverValues::Continuous(v) => v.len(),
            DriverValues::Quantized { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The single output grid of a driver run, cropped to the interior of the run grid.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverRaster {
    /// Id of the driver plan that produced the raster.
    pub driver: String,
    /// Interior grid (no halo).
    pub grid: RasterGrid,
    pub values: DriverValues,
}

impl DriverRaster {
    /// Crops `raw` to its interior and applies `quantization` if given.
    pub fn from_raster(
        driver: impl Into<String>,
        raw: &Raster,
        quantization: Option<Quantization>,
    ) -> Self {
        let grid = raw.grid.interior();
        let (tw, _) = raw.size();
        let halo = raw.grid.halo;

        let interior = (0..grid.height).flat_map(|iy| {
            let row = (iy + halo) * tw + halo;
            raw.data[row..row + grid.width].iter().copied()
        });

        let values = match quantization {
            Some(q) => DriverValues::Quantized {
                scale: q.scale,
                values: interior.map(|v| q.apply(v)).collect(),
            },
            None => DriverValues::Continuous(
                interior.map(|v| if v.is_nan() { None } else { Some(v) }).collect(),
            ),
        };

        Self {
            driver: driver.into(),
            grid,
            values,
        }
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    pub fn is_quantized(&self) -> bool {
        matches!(self.values, DriverValues::Quantized { .. })
    }

    fn index(&self, ix: usize, iy: usize) -> Option<usize> {
        (ix < self.grid.width && iy < self.grid.height).then(|| iy * self.grid.width + ix)
    }

    /// Stored value of a cell as `f32`; quantized rasters return the integer value.
    pub fn value(&self, ix: usize, iy: usize) -> Option<f32> {
        let i = self.index(ix, iy)?;
        match &self.values {
            DriverValues::Continuous(v) => v[i],
            DriverValues::Quantized { values, .. } => values[i].map(|q| q as f32),
        }
    }

    /// Integer value of a cell of a quantized raster.
    pub fn quantized(&self, ix: usize, iy: usize) -> Option<i32> {
        let i = self.index(ix, iy)?;
        match &self.values {
            DriverValues::Quantized { values, .. } => values[i],
            DriverValues::Continuous(_) => None,
        }
    }

    /// Iterates `(ix, iy, value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Option<f32>)> + '_ {
        let w = self.grid.width;
        (0..self.values.len()).map(move |i| {
            let (ix, iy) = (i % w, i / w);
            (ix, iy, self.value(ix, iy))
        })
    }

    pub fn defined_count(&self) -> usize {
        self.cells().filter(|(_, _, v)| v.is_some()).count()
    }

    pub fn max_value(&self) -> Option<f32> {
        self.cells().filter_map(|(_, _, v)| v).reduce(f32::max)
    }
}

/// Receives finished driver rasters.
pub trait RasterExporter {
    /// Hands `raster` off under `destination`, a hierarchical path such as `driver/roads`.
    fn export(&mut self, raster: &DriverRaster, destination: &str) -> Result<()>;
}

/// Exporter that keeps every raster in memory, keyed by destination.
#[derive(Default)]
pub struct MemoryExporter {
    exports: HashMap<String, DriverRaster>,
}

impl MemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, destination: &str) -> Option<&DriverRaster> {
        self.exports.get(destination)
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    pub fn destinations(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.exports.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}

impl RasterExporter for MemoryExporter {
    fn export(&mut self, raster: &DriverRaster, destination: &str) -> Result<()> {
        debug!(destination, driver = %raster.driver, "storing raster in memory");
        self.exports.insert(destination.to_string(), raster.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    fn haloed() -> Raster {
        let grid = RasterGrid::new(Vec2::ZERO, 1.0, 2, 2).with_halo(1);
        Raster::from_fn(grid, |ix, iy| match (ix, iy) {
            (1, 1) => 1.234,
            (2, 1) => f32::NAN,
            (1, 2) => 0.0,
            (2, 2) => 7.5,
            _ => 99.0,
        })
    }

    #[test]
    fn crops_halo_and_keeps_row_order() {
        let raster = DriverRaster::from_raster("t", &haloed(), None);
        assert_eq!((raster.width(), raster.height()), (2, 2));
        assert_eq!(raster.grid.halo, 0);
        assert_eq!(raster.value(0, 0), Some(1.234));
        assert_eq!(raster.value(1, 0), None);
        assert_eq!(raster.value(0, 1), Some(0.0));
        assert_eq!(raster.value(1, 1), Some(7.5));
        assert_eq!(raster.value(2, 0), None);
        assert_eq!(raster.defined_count(), 3);
        assert_eq!(raster.max_value(), Some(7.5));
        assert!(!raster.is_quantized());
    }

    #[test]
    fn quantizes_by_truncation() {
        let raster = DriverRaster::from_raster("t", &haloed(), Some(Quantization::default()));
        assert!(raster.is_quantized());
        assert_eq!(raster.quantized(0, 0), Some(123));
        assert_eq!(raster.quantized(1, 0), None);
        assert_eq!(raster.quantized(1, 1), Some(750));
        assert_eq!(raster.value(1, 1), Some(750.0));
    }

    #[test]
    fn memory_exporter_keeps_latest_per_destination() {
        let mut exporter = MemoryExporter::new();
        let raster = DriverRaster::from_raster("t", &haloed(), None);
        exporter.export(&raster, "driver/roads").unwrap();
        exporter.export(&raster, "driver/roads").unwrap();
        exporter.export(&raster, "driver/infrastructure/sumatra").unwrap();
        assert_eq!(exporter.len(), 2);
        assert_eq!(
            exporter.destinations(),
            vec!["driver/infrastructure/sumatra", "driver/roads"]
        );
        assert_eq!(exporter.get("driver/roads"), Some(&raster));
    }
}
