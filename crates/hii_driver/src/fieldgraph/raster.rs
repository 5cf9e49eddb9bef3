//! Raster storage for influence fields.
//!
//! Stores one `f32` per cell over a [`RasterGrid`]. A `NaN` value marks a masked
//! (undefined) cell; reducers that skip masked cells and operators that propagate
//! them both rely on this convention.
use glam::Vec2;

use super::grid::RasterGrid;

/// A raster grid with floating point values and the grid it covers.
#[derive(Clone, Debug)]
pub struct Raster {
    pub grid: RasterGrid,
    pub data: Vec<f32>,
}

impl Raster {
    /// Create a new raster over the given grid, initializing all values to zero.
    pub fn new(grid: RasterGrid) -> Self {
        Self::filled(grid, 0.0)
    }

    /// Create a raster with every cell set to `value`.
    pub fn filled(grid: RasterGrid, value: f32) -> Self {
        let len = grid.len();
        Self {
            grid,
            data: vec![value; len],
        }
    }

    /// Create a raster with every cell masked.
    pub fn masked(grid: RasterGrid) -> Self {
        Self::filled(grid, f32::NAN)
    }

    /// Create a raster by evaluating `f` at every `(ix, iy)` including halo cells.
    pub fn from_fn(grid: RasterGrid, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let (w, h) = (grid.total_width(), grid.total_height());
        let mut data = Vec::with_capacity(w * h);
        for iy in 0..h {
            for ix in 0..w {
                data.push(f(ix, iy));
            }
        }
        Self { grid, data }
    }

    /// Get the size of the raster as `(width, height)`, including halo regions.
    pub fn size(&self) -> (usize, usize) {
        (self.grid.total_width(), self.grid.total_height())
    }

    /// Get the value at the given grid indices, returning `0.0` if out of bounds.
    pub fn get(&self, ix: isize, iy: isize) -> f32 {
        let (w, h) = self.size();
        if ix < 0 || iy < 0 || ix >= w as isize || iy >= h as isize {
            return 0.0;
        }
        let i = (iy as usize) * w + (ix as usize);
        self.data[i]
    }

    /// Sample the raster at a world position using the cell that contains it.
    pub fn sample_domain(&self, p: Vec2) -> f32 {
        let (ix, iy) = self.grid.world_to_index(p);
        self.get(ix, iy)
    }

    /// Applies `f` to every cell, producing a new raster on the same grid.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Raster {
        Raster {
            grid: self.grid.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combines two rasters cell by cell.
    pub fn zip_with(&self, other: &Raster, f: impl Fn(f32, f32) -> f32) -> Raster {
        debug_assert_eq!(self.data.len(), other.data.len(), "raster shapes differ");
        Raster {
            grid: self.grid.clone(),
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Number of cells holding a defined (non-masked) value.
    pub fn count_defined(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Number of cells holding a defined, non-zero value.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|v| is_source(**v)).count()
    }

    /// Largest defined value, if any.
    pub fn max_value(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f32::max)
    }
}

/// A defined, non-zero cell value.
#[inline]
pub(crate) fn is_source(v: f32) -> bool {
    !v.is_nan() && v != 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_grid() -> RasterGrid {
        RasterGrid::new(Vec2::ZERO, 1.0, 2, 2).with_halo(1)
    }

    #[test]
    fn new_initializes_with_zeroes() {
        let raster = Raster::new(make_grid());
        assert_eq!(raster.size(), (4, 4));
        assert!(raster.data.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn get_returns_zero_outside_bounds() {
        let raster = Raster::masked(make_grid());
        assert_eq!(raster.get(-1, -1), 0.0);
        assert_eq!(raster.get(10, 10), 0.0);
        assert!(raster.get(0, 0).is_nan());
    }

    #[test]
    fn sample_domain_uses_world_to_index() {
        let grid = make_grid();
        let mut raster = Raster::new(grid.clone());
        let idx = grid.world_to_index(Vec2::new(0.25, 0.25));
        let w = grid.total_width();
        raster.data[idx.1 as usize * w + idx.0 as usize] = 0.75;
        assert_eq!(raster.sample_domain(Vec2::new(0.5, 0.5)), 0.75);
    }

    #[test]
    fn from_fn_visits_rows_in_order() {
        let grid = RasterGrid::new(Vec2::ZERO, 1.0, 3, 2);
        let raster = Raster::from_fn(grid, |ix, iy| (iy * 10 + ix) as f32);
        assert_eq!(raster.data, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn counters_skip_masked_cells() {
        let grid = RasterGrid::new(Vec2::ZERO, 1.0, 4, 1);
        let mut raster = Raster::new(grid);
        raster.data = vec![f32::NAN, 0.0, 2.0, 5.0];
        assert_eq!(raster.count_defined(), 3);
        assert_eq!(raster.count_nonzero(), 2);
        assert_eq!(raster.max_value(), Some(5.0));
        assert_eq!(Raster::masked(raster.grid.clone()).max_value(), None);
    }
}
