use chrono::{Days, NaiveDate};
use glam::Vec2;
use hii_driver::prelude::{AssetKind, DriverPlan, InMemoryCatalog, Raster, RasterGrid};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A 20 km square at 100 m resolution, with a 2 km halo.
pub fn demo_grid() -> RasterGrid {
    RasterGrid::new(Vec2::ZERO, 100.0, 200, 200).with_halo(20)
}

fn rand01(rng: &mut dyn Rng) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Builds reproducible in-memory catalogs for a plan.
///
/// Every weighted category gets a handful of random-walk "features". Time-stamped
/// categories receive one asset `asset_age_days` before the task date; runs dated before
/// the plan's freshness cutoff get empty collections instead, which triggers the fill
/// fallback on road plans.
pub struct SyntheticCatalog {
    grid: RasterGrid,
    seed: u64,
    asset_age_days: u64,
    walks_per_category: usize,
}

impl SyntheticCatalog {
    pub fn new(grid: RasterGrid, seed: u64) -> Self {
        Self {
            grid,
            seed,
            asset_age_days: 30,
            walks_per_category: 2,
        }
    }

    pub fn with_asset_age_days(mut self, days: u64) -> Self {
        self.asset_age_days = days;
        self
    }

    pub fn with_walks_per_category(mut self, walks: usize) -> Self {
        self.walks_per_category = walks;
        self
    }

    pub fn build(&self, plan: &DriverPlan, task_date: NaiveDate) -> InMemoryCatalog {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut catalog = InMemoryCatalog::new();
        catalog.insert_static(plan.water_mask.clone(), self.water_mask(&mut rng));

        let asset_date = task_date
            .checked_sub_days(Days::new(self.asset_age_days))
            .unwrap_or(task_date);
        let has_survey = plan.freshness_applies(task_date);

        for category in plan.weights.iter() {
            let walks = if category.is_fill() {
                self.walks_per_category * 3
            } else {
                self.walks_per_category
            };
            let features = self.random_walks(&mut rng, walks);
            match category.asset {
                AssetKind::Static => {
                    catalog.insert_static(category.key.clone(), features);
                }
                AssetKind::TimeStamped { .. } if has_survey => {
                    catalog.insert_dated(category.key.clone(), asset_date, features);
                }
                AssetKind::TimeStamped { .. } => {
                    catalog.declare_collection(category.key.clone());
                }
            }
        }
        catalog
    }

    /// Land everywhere except a lake and a strip of sea along the southern edge.
    fn water_mask(&self, rng: &mut dyn Rng) -> Raster {
        let grid = self.grid.interior();
        let (w, h) = (grid.width as f32, grid.height as f32);
        let lake = Vec2::new(w * (0.25 + 0.5 * rand01(rng)), h * (0.4 + 0.4 * rand01(rng)));
        let lake_radius = w.min(h) * 0.08;
        Raster::from_fn(grid, |ix, iy| {
            let p = Vec2::new(ix as f32 + 0.5, iy as f32 + 0.5);
            let coast = h * 0.06 * (1.0 + (p.x / w * std::f32::consts::TAU).sin() * 0.5);
            if p.y < coast || p.distance(lake) < lake_radius {
                0.0
            } else {
                1.0
            }
        })
    }

    fn random_walks(&self, rng: &mut dyn Rng, walks: usize) -> Raster {
        let grid = self.grid.interior();
        let (w, h) = (grid.width as isize, grid.height as isize);
        let mut raster = Raster::new(grid);
        for _ in 0..walks {
            let mut x = (rand01(rng) * w as f32) as isize;
            let mut y = (rand01(rng) * h as f32) as isize;
            let mut heading = rand01(rng) * std::f32::consts::TAU;
            let steps = (w + h) as usize;
            for _ in 0..steps {
                if x < 0 || y < 0 || x >= w || y >= h {
                    break;
                }
                raster.data[(y * w + x) as usize] = 1.0;
                heading += (rand01(rng) - 0.5) * 0.4;
                x += heading.cos().round() as isize;
                y += heading.sin().round() as isize;
            }
        }
        raster
    }
}
