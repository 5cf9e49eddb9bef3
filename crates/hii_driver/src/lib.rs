#![forbid(unsafe_code)]
//! hii_driver: weighted spatial-influence aggregation for human-footprint driver rasters.
//!
//! Modules:
//! - fieldgraph: author, compile, and bake raster-algebra DAGs (incl. EDT and focal maximum)
//! - driver: weight tables, direct/indirect influence, combination policies, pipeline, events
//!
//! Runnable demos live in the `hii_driver_examples` crate.
pub mod driver;
pub mod error;
pub mod fieldgraph;

/// Convenient re-exports for common types. Import with `use hii_driver::prelude::*;`.
pub mod prelude {
    pub use crate::driver::catalog::{check_freshness, AssetKind, InMemoryCatalog, RasterCatalog};
    pub use crate::driver::category::{
        Category, CategoryRole, CategoryWeightTable, InfluenceClass, InfraGroup,
    };
    pub use crate::driver::combine::{
        CombinationPolicy, MaxLocalPolicy, PerClassMaxPolicy, Quantization, SumClampPolicy,
    };
    pub use crate::driver::direct::InfluenceParams;
    pub use crate::driver::events::{
        DriverEvent, DriverEventKind, EventSink, FnSink, MultiSink, VecSink,
    };
    pub use crate::driver::export::{DriverRaster, DriverValues, MemoryExporter, RasterExporter};
    pub use crate::driver::indirect::ClassDecay;
    pub use crate::driver::pipeline::{DriverPipeline, PreparedInputs, ResolvedInput, RunConfig};
    pub use crate::driver::plan::{osm_start, DriverPlan, BUILTIN_PLANS, WATER_MASK_KEY};
    pub use crate::error::{Error, Result};
    pub use crate::fieldgraph::cache::FieldProgramCache;
    pub use crate::fieldgraph::compiler::FieldGraphCompiler;
    pub use crate::fieldgraph::spec::{FieldGraphSpec, FieldSemantics};
    pub use crate::fieldgraph::{
        EmptyLayer, FieldRuntime, NodeSpec, PresenceLayer, PresenceRegistry, Raster, RasterGrid,
    };
}
