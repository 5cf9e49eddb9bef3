//! Neighborhood (focal) reducers over rasters.
use super::raster::Raster;

/// Maximum over a square `(2r + 1) x (2r + 1)` neighborhood around each cell.
///
/// Masked cells are skipped; a cell whose whole neighborhood is masked stays masked.
/// The square kernel is separable, so the filter runs as a row pass and a column pass.
pub fn focal_max(input: &Raster, radius_px: usize) -> Raster {
    if radius_px == 0 {
        return input.clone();
    }
    let (w, h) = input.size();
    let mut rows = vec![f32::NAN; w * h];

    for y in 0..h {
        for x in 0..w {
            let lo = x.saturating_sub(radius_px);
            let hi = (x + radius_px).min(w.saturating_sub(1));
            rows[y * w + x] = input.data[y * w + lo..=y * w + hi]
                .iter()
                .copied()
                .fold(f32::NAN, f32::max);
        }
    }

    Raster::from_fn(input.grid.clone(), |x, y| {
        let lo = y.saturating_sub(radius_px);
        let hi = (y + radius_px).min(h.saturating_sub(1));
        (lo..=hi).map(|yy| rows[yy * w + x]).fold(f32::NAN, f32::max)
    })
}
