//! High-level pipeline for computing one driver raster.
//!
//! A run resolves every weighted category through a [`RasterCatalog`], validates weights
//! and freshness before any influence is computed, builds the plan's field graph,
//! evaluates it over the run grid and returns (or exports) the finished [`DriverRaster`].
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::driver::catalog::{check_freshness, AssetKind, RasterCatalog};
use crate::driver::category::CategoryWeightTable;
use crate::driver::direct::presence_field;
use crate::driver::events::{DriverEvent, DriverEventKind, EventSink};
use crate::driver::export::{DriverRaster, RasterExporter};
use crate::driver::plan::DriverPlan;
use crate::error::{Error, Result};
use crate::fieldgraph::cache::FieldProgramCache;
use crate::fieldgraph::spec::FieldSemantics;
use crate::fieldgraph::{FieldRuntime, PresenceLayer, PresenceRegistry, Raster, RasterGrid};

/// Configuration for one driver run.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Extent and resolution of the run; the halo is cropped on output.
    pub grid: RasterGrid,
    /// Reference date for time-stamped inputs.
    pub task_date: NaiveDate,
    /// Optional realm appended to the export destination.
    pub realm: Option<String>,
}

impl RunConfig {
    /// Creates a [`RunConfig`] over `grid`, dated today (UTC).
    pub fn new(grid: RasterGrid) -> Self {
        Self {
            grid,
            task_date: Utc::now().date_naive(),
            realm: None,
        }
    }

    pub fn with_task_date(mut self, task_date: NaiveDate) -> Self {
        self.task_date = task_date;
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Sets the halo cell count of the run grid.
    pub fn with_grid_halo(mut self, halo: usize) -> Self {
        self.grid.halo = halo;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.grid.cell_size.is_finite() || self.grid.cell_size <= 0.0 {
            return Err(Error::InvalidConfig("cell_size must be > 0".into()));
        }
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(Error::InvalidConfig(
                "grid must have at least one cell in both directions".into(),
            ));
        }
        if !self.grid.origin.is_finite() {
            return Err(Error::InvalidConfig("grid origin must be finite".into()));
        }
        Ok(())
    }
}

/// A presence input resolved during pre-flight.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInput {
    pub key: String,
    /// Effective date of a time-stamped asset; `None` for static data.
    pub effective_date: Option<NaiveDate>,
}

/// Output of pre-flight validation: everything a run needs before computing influence.
pub struct PreparedInputs {
    /// Weight table used for the run; the fill-only table when the fallback applied.
    pub table: CategoryWeightTable,
    /// Presence layers keyed by category key, plus the water mask.
    pub layers: PresenceRegistry,
    /// Resolved inputs in category order, water mask last.
    pub resolved: Vec<ResolvedInput>,
    /// Whether the run fell back to fill categories only.
    pub fallback: bool,
}

/// Runs [`DriverPlan`]s against a catalog, reusing compiled graphs between runs.
pub struct DriverPipeline<'a> {
    /// Run configuration applied to this pipeline.
    pub config: RunConfig,
    /// Catalog that resolves presence rasters.
    pub catalog: &'a dyn RasterCatalog,
    cache: FieldProgramCache,
}

impl<'a> DriverPipeline<'a> {
    pub fn try_new(config: RunConfig, catalog: &'a dyn RasterCatalog) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            catalog,
            cache: FieldProgramCache::new(),
        })
    }

    /// Compiled programs kept by this pipeline.
    pub fn cache(&self) -> &FieldProgramCache {
        &self.cache
    }

    /// Runs the given plan, returning the driver raster.
    pub fn run(&mut self, plan: &DriverPlan) -> Result<DriverRaster> {
        self.run_with_events(plan, &mut ())
    }

    /// Runs the plan and hands the raster to `exporter` under the plan's destination.
    pub fn run_and_export(
        &mut self,
        plan: &DriverPlan,
        exporter: &mut dyn RasterExporter,
        sink: &mut dyn EventSink,
    ) -> Result<DriverRaster> {
        let raster = self.run_with_events(plan, sink)?;
        let destination = plan.destination_for(self.config.realm.as_deref());
        exporter.export(&raster, &destination)?;
        info!(driver = %plan.id, destination = %destination, "exported driver raster");
        emit(sink, DriverEventKind::Exported, || DriverEvent::Exported { destination });
        Ok(raster)
    }

    pub fn run_with_events(
        &mut self,
        plan: &DriverPlan,
        sink: &mut dyn EventSink,
    ) -> Result<DriverRaster> {
        plan.validate()?;
        let task_date = self.config.task_date;
        info!(
            driver = %plan.id,
            policy = plan.policy.name(),
            %task_date,
            categories = plan.weights.len(),
            "starting driver run"
        );
        emit(sink, DriverEventKind::RunStarted, || DriverEvent::RunStarted {
            driver: plan.id.clone(),
            task_date,
            category_count: plan.weights.len(),
        });

        let prepared = self.preflight(plan, sink)?;

        let graph = plan
            .policy
            .build_graph(&prepared.table, &plan.influence, &plan.water_mask)?;
        let cache_id = if prepared.fallback {
            format!("{}/fill_only", plan.id)
        } else {
            plan.id.clone()
        };
        let program = self.cache.get_or_compile(&cache_id, &graph)?;

        let mut runtime =
            FieldRuntime::new(Arc::clone(&program), &prepared.layers, self.config.grid.clone());

        for key in prepared.table.keys() {
            let field = presence_field(key);
            if !program.nodes.contains_key(&field) {
                continue;
            }
            if runtime.bake(&field)?.count_nonzero() == 0 {
                warn!(driver = %plan.id, category = key, "category has no features in extent");
                emit(sink, DriverEventKind::CategoryEmpty, || DriverEvent::CategoryEmpty {
                    key: key.to_string(),
                });
            }
        }

        for semantics in [FieldSemantics::Direct, FieldSemantics::Indirect] {
            for field in program.fields_with(semantics) {
                let nonzero_cells = runtime.bake(&field)?.count_nonzero();
                emit(sink, DriverEventKind::FieldBaked, || DriverEvent::FieldBaked {
                    field: field.clone(),
                    semantics,
                    nonzero_cells,
                });
            }
        }

        let driver_field = program.driver_field()?;
        let raw = runtime.bake(&driver_field)?;
        let raster = DriverRaster::from_raster(plan.id.clone(), &raw, plan.quantization);

        let defined_cells = raster.defined_count();
        let max_value = raster.max_value();
        info!(
            driver = %plan.id,
            defined_cells,
            max_value = max_value.unwrap_or(f32::NAN),
            fields = runtime.baked_count(),
            "driver run finished"
        );
        emit(sink, DriverEventKind::RunFinished, || DriverEvent::RunFinished {
            driver: plan.id.clone(),
            defined_cells,
            max_value,
        });

        Ok(raster)
    }

    /// Validates weights against the catalog and resolves every input of `plan`.
    ///
    /// All fatal input conditions surface here, before any influence is computed.
    pub fn preflight(
        &self,
        plan: &DriverPlan,
        sink: &mut dyn EventSink,
    ) -> Result<PreparedInputs> {
        let task_date = self.config.task_date;
        plan.weights.validate_against(&self.catalog.presence_keys())?;

        let enforce_freshness = plan.freshness_applies(task_date);
        if let (false, Some(cutoff)) = (enforce_freshness, plan.freshness_cutoff) {
            debug!(driver = %plan.id, %task_date, %cutoff, "freshness check skipped");
            emit(sink, DriverEventKind::FreshnessCheckSkipped, || {
                DriverEvent::FreshnessCheckSkipped { task_date, cutoff }
            });
        }

        let mut found: Vec<(ResolvedInput, Arc<Raster>)> = Vec::with_capacity(plan.weights.len());
        let mut missing: Vec<(String, String)> = Vec::new();
        for category in plan.weights.iter() {
            match self.resolve_input(&category.key, category.asset, enforce_freshness) {
                Ok(input) => found.push(input),
                Err(Error::NotFound { key, detail }) => missing.push((key, detail)),
                Err(err) => return Err(err),
            }
        }

        let mut table = plan.weights.clone();
        let mut fallback = false;
        if let Some((key, detail)) = missing.first() {
            let primaries_missing = plan
                .weights
                .primaries()
                .all(|c| missing.iter().any(|(k, _)| *k == c.key));
            let fills_present = plan
                .weights
                .fills()
                .all(|c| !missing.iter().any(|(k, _)| *k == c.key));

            if plan.fill_only_fallback && !enforce_freshness && primaries_missing && fills_present
            {
                table = plan.weights.fill_only()?;
                fallback = true;
                let categories: Vec<String> = table.keys().map(str::to_string).collect();
                warn!(
                    driver = %plan.id,
                    %task_date,
                    fills = ?categories,
                    "primary categories unavailable; using fill categories only"
                );
                emit(sink, DriverEventKind::FallbackApplied, || {
                    DriverEvent::FallbackApplied {
                        driver: plan.id.clone(),
                        categories,
                    }
                });
                found.retain(|(input, _)| table.get(&input.key).is_some());
            } else {
                return Err(Error::CategoryUnresolvable {
                    key: key.clone(),
                    reason: detail.clone(),
                });
            }
        }

        let water = match self.catalog.resolve(&plan.water_mask) {
            Ok(raster) => raster,
            Err(Error::NotFound { key, detail }) => {
                return Err(Error::CategoryUnresolvable { key, reason: detail })
            }
            Err(err) => return Err(err),
        };
        found.push((
            ResolvedInput {
                key: plan.water_mask.clone(),
                effective_date: None,
            },
            water,
        ));

        let mut layers = PresenceRegistry::with_capacity(found.len());
        let mut resolved = Vec::with_capacity(found.len());
        for (input, raster) in found {
            debug!(key = %input.key, effective_date = ?input.effective_date, "resolved input");
            emit(sink, DriverEventKind::InputResolved, || DriverEvent::InputResolved {
                key: input.key.clone(),
                effective_date: input.effective_date,
            });
            let layer: Arc<dyn PresenceLayer> = raster;
            layers.register_arc(input.key.clone(), layer);
            resolved.push(input);
        }

        Ok(PreparedInputs {
            table,
            layers,
            resolved,
            fallback,
        })
    }

    fn resolve_input(
        &self,
        key: &str,
        asset: AssetKind,
        enforce_freshness: bool,
    ) -> Result<(ResolvedInput, Arc<Raster>)> {
        match asset {
            AssetKind::Static => {
                let raster = self.catalog.resolve(key)?;
                Ok((
                    ResolvedInput {
                        key: key.to_string(),
                        effective_date: None,
                    },
                    raster,
                ))
            }
            AssetKind::TimeStamped { max_age_days } => {
                let as_of = self.config.task_date;
                let (raster, effective) = self.catalog.resolve_latest(key, as_of)?;
                if let (true, Some(max_age)) = (enforce_freshness, max_age_days) {
                    check_freshness(key, as_of, effective, max_age)?;
                }
                Ok((
                    ResolvedInput {
                        key: key.to_string(),
                        effective_date: Some(effective),
                    },
                    raster,
                ))
            }
        }
    }
}

/// Sends the event built by `event` if the sink wants events of `kind`.
#[inline]
fn emit(sink: &mut dyn EventSink, kind: DriverEventKind, event: impl FnOnce() -> DriverEvent) {
    if sink.wants(kind) {
        sink.send(event());
    }
}
