//! Euclidean Distance Transform (EDT) for influence fields.
//!
//! Computes, for every cell, the Euclidean distance in world units to the nearest
//! source cell (defined and non-zero), truncated at a maximum search distance.
//!
//! This implementation is based on the Felzenszwalb-Huttenlocher algorithm,
//! which computes exact Euclidean distances using a separable approach with
//! two 1D passes.
use super::raster::{is_source, Raster};

/// Distance from each cell to the nearest source cell of `input`, in world units.
///
/// Cells farther than `max_distance` from every source, and every cell when the input has
/// no source at all, are masked. Masked input cells are never sources but still receive a
/// distance.
pub fn distance_to_sources(input: &Raster, max_distance: f32) -> Raster {
    let (w, h) = input.size();
    let mut out = Raster::masked(input.grid.clone());
    if w == 0 || h == 0 || !input.data.iter().any(|v| is_source(*v)) {
        return out;
    }

    let mask: Vec<bool> = input.data.iter().map(|v| is_source(*v)).collect();
    let squared = edt_squared(&mask, w, h);
    let cell_size = input.grid.cell_size;

    for (dst, d2) in out.data.iter_mut().zip(squared) {
        let d = (d2.sqrt() as f32) * cell_size;
        if d <= max_distance {
            *dst = d;
        }
    }
    out
}

/// Computes the 1D squared distance transform of `f` using the lower envelope of parabolas.
fn edt_1d(f: &[f64], output: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }

    debug_assert_eq!(n, output.len(), "Input and output must have same length");
    debug_assert!(v.len() >= n && z.len() > n, "scratch buffers too small");

    let mut k = 0;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    for q in 1..n {
        let mut s = intersection(f, q, v[k]);
        while k > 0 && s <= z[k] {
            k -= 1;
            s = intersection(f, q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, dq) in output.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dx = q as f64 - v[k] as f64;
        *dq = dx * dx + f[v[k]];
    }
}

/// Horizontal position where the parabolas rooted at `q` and `p` intersect.
fn intersection(f: &[f64], q: usize, p: usize) -> f64 {
    if q == p {
        return f64::INFINITY;
    }
    let (qf, pf) = (q as f64, p as f64);
    ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf))
}

/// Computes the 2D squared EDT in cell units; `true` cells are sources.
fn edt_squared(sources: &[bool], w: usize, h: usize) -> Vec<f64> {
    debug_assert_eq!(sources.len(), w * h, "Mask size must match dimensions");

    // Larger than any squared distance inside the grid.
    let far = ((w * w + h * h) as f64) + 1.0;
    let mut f: Vec<f64> = sources
        .iter()
        .map(|&s| if s { 0.0 } else { far })
        .collect();

    let n = w.max(h);
    let mut v = vec![0usize; n];
    let mut z = vec![0.0f64; n + 1];

    let mut row_out = vec![0.0f64; w];
    for y in 0..h {
        let row = &mut f[y * w..(y + 1) * w];
        edt_1d(row, &mut row_out, &mut v, &mut z);
        row.copy_from_slice(&row_out);
    }

    let mut col_in = vec![0.0f64; h];
    let mut col_out = vec![0.0f64; h];
    for x in 0..w {
        for y in 0..h {
            col_in[y] = f[y * w + x];
        }
        edt_1d(&col_in, &mut col_out, &mut v, &mut z);
        for y in 0..h {
            f[y * w + x] = col_out[y];
        }
    }

    f
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::fieldgraph::RasterGrid;

    fn run_1d(f: &[f64]) -> Vec<f64> {
        let n = f.len();
        let mut out = vec![0.0; n];
        let mut v = vec![0; n];
        let mut z = vec![0.0; n + 1];
        edt_1d(f, &mut out, &mut v, &mut z);
        out
    }

    #[test]
    fn edt_1d_computes_squared_distance_to_nearest_zero() {
        let large = 1000.0;
        assert_eq!(run_1d(&[0.0, large, large, 0.0]), vec![0.0, 1.0, 1.0, 0.0]);
        assert_eq!(run_1d(&[large, large, 0.0]), vec![4.0, 1.0, 0.0]);
    }

    #[test]
    fn intersection_handles_same_indices() {
        assert_eq!(intersection(&[0.0, 1.0], 1, 1), f64::INFINITY);
    }

    #[test]
    fn edt_produces_correct_distances_for_single_source() {
        let mut sources = vec![false; 25];
        sources[12] = true;
        let d2 = edt_squared(&sources, 5, 5);

        assert_eq!(d2[12], 0.0);
        for idx in [7, 11, 13, 17] {
            assert_eq!(d2[idx], 1.0);
        }
        for idx in [6, 8, 16, 18] {
            assert_eq!(d2[idx], 2.0);
        }
        assert_eq!(d2[0], 8.0);
    }

    #[test]
    fn distance_scales_by_cell_size_and_masks_beyond_cutoff() {
        let grid = RasterGrid::new(Vec2::ZERO, 100.0, 6, 1);
        let mut input = Raster::new(grid);
        input.data[0] = 3.0;

        let d = distance_to_sources(&input, 250.0);
        assert_eq!(&d.data[..3], &[0.0, 100.0, 200.0]);
        assert!(d.data[3..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn masked_cells_are_not_sources() {
        let grid = RasterGrid::new(Vec2::ZERO, 1.0, 3, 1);
        let mut input = Raster::masked(grid);
        input.data[2] = 1.0;

        let d = distance_to_sources(&input, 10.0);
        assert_eq!(d.data, vec![2.0, 1.0, 0.0]);
    }

    #[test]
    fn no_sources_yields_fully_masked_raster() {
        let grid = RasterGrid::new(Vec2::ZERO, 1.0, 4, 4);
        let d = distance_to_sources(&Raster::new(grid), 100.0);
        assert_eq!(d.count_defined(), 0);
    }

    #[test]
    fn distances_match_brute_force() {
        let grid = RasterGrid::new(Vec2::ZERO, 1.0, 9, 7);
        let mut input = Raster::new(grid);
        let sources = [(1usize, 1usize), (7, 2), (4, 6)];
        for &(x, y) in &sources {
            input.data[y * 9 + x] = 1.0;
        }

        let d = distance_to_sources(&input, f32::INFINITY);
        for y in 0..7 {
            for x in 0..9 {
                let expected = sources
                    .iter()
                    .map(|&(sx, sy)| {
                        let dx = x as f32 - sx as f32;
                        let dy = y as f32 - sy as f32;
                        (dx * dx + dy * dy).sqrt()
                    })
                    .fold(f32::INFINITY, f32::min);
                let got = d.data[y * 9 + x];
                assert!((got - expected).abs() < 1e-4, "({x},{y}): {got} vs {expected}");
            }
        }
    }
}
