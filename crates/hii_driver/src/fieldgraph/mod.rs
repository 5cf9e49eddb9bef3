//! Field graph subsystem for defining and evaluating influence rasters.
//!
//! This module groups types for authoring a directed acyclic graph (DAG) of raster-algebra
//! nodes, compiling it into an executable program, and baking it over a [`RasterGrid`].
//! Driver generations are expressed as graphs built by [`crate::driver`].
pub mod cache;
pub mod compiler;
pub mod edt;
pub mod focal;
pub mod grid;
pub mod node;
pub mod presence;
pub mod program;
pub mod raster;
pub mod runtime;
pub mod spec;

pub use grid::RasterGrid;
pub use node::{
    ClampParams, ConstantParams, DecayParams, DistanceParams, FocalParams, NodeSpec,
    PresenceParams, ScaleParams, ThresholdParams, UnmaskParams,
};
pub use presence::{EmptyLayer, PresenceLayer, PresenceRegistry};
pub use program::{FieldProgram, NodeMeta};
pub use raster::Raster;
pub use runtime::FieldRuntime;

pub type FieldId = String;
