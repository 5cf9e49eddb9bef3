//! Grid geometry shared by every raster in a run.
//!
//! [`RasterGrid`] fixes the extent, resolution and halo of all fields evaluated for one
//! driver computation. The halo pads the output extent so that features just outside the
//! area of interest still contribute distance-based influence inside it.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A regular 2D grid of square cells with optional halo cells on each side.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RasterGrid {
    /// World-space lower-left corner of the interior (halo excluded).
    pub origin: Vec2,
    /// Cell size in world units (the export `scale`).
    pub cell_size: f32,
    /// Number of interior cells in X.
    pub width: usize,
    /// Number of interior cells in Y.
    pub height: usize,
    /// Halo cell count on each side.
    pub halo: usize,
}

impl RasterGrid {
    /// Creates a grid without halo.
    pub fn new(origin: Vec2, cell_size: f32, width: usize, height: usize) -> Self {
        Self {
            origin,
            cell_size,
            width,
            height,
            halo: 0,
        }
    }

    /// Sets the halo cell count.
    pub fn with_halo(mut self, halo: usize) -> Self {
        self.halo = halo;
        self
    }

    /// Total width including halo regions.
    pub fn total_width(&self) -> usize {
        self.width + 2 * self.halo
    }

    /// Total height including halo regions.
    pub fn total_height(&self) -> usize {
        self.height + 2 * self.halo
    }

    /// Number of cells including halo regions.
    pub fn len(&self) -> usize {
        self.total_width() * self.total_height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts a world position to grid cell indices, accounting for halo.
    pub fn world_to_index(&self, p: Vec2) -> (isize, isize) {
        let px = (p.x - self.origin.x) / self.cell_size + self.halo as f32;
        let py = (p.y - self.origin.y) / self.cell_size + self.halo as f32;
        (px.floor() as isize, py.floor() as isize)
    }

    /// Converts grid cell indices to the world position of the cell center, accounting for halo.
    pub fn index_to_world(&self, ix: isize, iy: isize) -> Vec2 {
        Vec2::new(
            self.origin.x + (ix as f32 - self.halo as f32 + 0.5) * self.cell_size,
            self.origin.y + (iy as f32 - self.halo as f32 + 0.5) * self.cell_size,
        )
    }

    /// Whether the given indices fall inside the interior (non-halo) region.
    pub fn is_interior(&self, ix: usize, iy: usize) -> bool {
        ix >= self.halo
            && iy >= self.halo
            && ix < self.halo + self.width
            && iy < self.halo + self.height
    }

    /// The same extent without halo cells.
    pub fn interior(&self) -> RasterGrid {
        RasterGrid {
            halo: 0,
            ..self.clone()
        }
    }

    /// Number of whole cells needed to cover `distance` world units.
    pub fn cells_for_distance(&self, distance: f32) -> usize {
        if distance <= 0.0 || self.cell_size <= 0.0 {
            return 0;
        }
        (distance / self.cell_size).ceil() as usize
    }
}
