//! Human-footprint driver computation: weighted categories, direct and indirect influence,
//! combination policies and the run pipeline.
//!
//! Each driver generation is a [`plan::DriverPlan`]: a versioned weight table plus a
//! [`combine::CombinationPolicy`] that turns it into a field graph. The
//! [`pipeline::DriverPipeline`] resolves inputs, evaluates the graph and exports the result.
pub mod catalog;
pub mod category;
pub mod combine;
pub mod direct;
pub mod events;
pub mod export;
pub mod indirect;
pub mod pipeline;
pub mod plan;
pub mod weights;

pub use catalog::{AssetKind, InMemoryCatalog, RasterCatalog};
pub use category::{Category, CategoryRole, CategoryWeightTable, InfluenceClass, InfraGroup};
pub use combine::{CombinationPolicy, Quantization};
pub use direct::InfluenceParams;
pub use export::{DriverRaster, DriverValues, MemoryExporter, RasterExporter};
pub use indirect::ClassDecay;
pub use pipeline::{DriverPipeline, RunConfig};
pub use plan::DriverPlan;
