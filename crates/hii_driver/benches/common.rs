use std::time::Duration;

use criterion::{Criterion, Throughput};
use glam::Vec2;
use hii_driver::prelude::{Raster, RasterGrid};

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

/// Cell size of the benchmark grids, in world units.
pub const CELL_SIZE: f32 = 100.0;

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

pub fn square_grid(size: usize) -> RasterGrid {
    RasterGrid::new(Vec2::ZERO, CELL_SIZE, size, size)
}

/// Presence raster with one horizontal and one diagonal "road" per `spacing` cells.
pub fn road_network(grid: &RasterGrid, spacing: usize) -> Raster {
    let spacing = spacing.max(1);
    Raster::from_fn(grid.clone(), |ix, iy| {
        if iy % spacing == 0 || (ix + iy) % (2 * spacing) == 0 {
            1.0
        } else {
            0.0
        }
    })
}
