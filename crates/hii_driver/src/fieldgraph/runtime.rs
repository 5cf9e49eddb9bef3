//! Runtime for evaluating field programs and baking rasters.
//!
//! This module interprets compiled [`FieldProgram`]s over one [`RasterGrid`]. Every node is
//! baked into a [`Raster`] at most once per runtime and shared with its dependents, so a
//! direct field feeding both a merge and a distance transform is computed a single time.
//! Presence inputs come from a [`PresenceRegistry`].
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::fieldgraph::edt::distance_to_sources;
use crate::fieldgraph::focal::focal_max;
use crate::fieldgraph::program::FieldProgram;
use crate::fieldgraph::raster::is_source;
use crate::fieldgraph::{FieldId, NodeSpec, PresenceRegistry, Raster, RasterGrid};

/// Runtime for evaluating field programs, managing presence layers and baked rasters.
pub struct FieldRuntime<'a> {
    pub program: Arc<FieldProgram>,
    pub layers: &'a PresenceRegistry,
    grid: RasterGrid,
    baked: HashMap<FieldId, Arc<Raster>>,
}

impl<'a> FieldRuntime<'a> {
    /// Create a new field runtime evaluating `program` over `grid`.
    pub fn new(program: Arc<FieldProgram>, layers: &'a PresenceRegistry, grid: RasterGrid) -> Self {
        Self {
            program,
            layers,
            grid,
            baked: HashMap::new(),
        }
    }

    pub fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    /// Number of fields baked so far.
    pub fn baked_count(&self) -> usize {
        self.baked.len()
    }

    /// Bake `field` and every field it depends on, returning the shared raster.
    pub fn bake(&mut self, field: &str) -> Result<Arc<Raster>> {
        if let Some(raster) = self.baked.get(field) {
            return Ok(Arc::clone(raster));
        }

        let Some(meta) = self.program.nodes.get(field) else {
            return Err(Error::UnknownField {
                id: field.to_string(),
            });
        };
        let spec = meta.spec.clone();

        let mut inputs = Vec::with_capacity(spec.inputs().len());
        for input in spec.inputs() {
            inputs.push(self.bake(input)?);
        }

        let raster = self.eval(field, &spec, &inputs)?;
        debug!(
            field,
            op = spec.op_name(),
            nonzero = raster.count_nonzero(),
            "baked field"
        );

        let raster = Arc::new(raster);
        self.baked.insert(field.to_string(), Arc::clone(&raster));
        Ok(raster)
    }

    fn eval(&self, field: &str, spec: &NodeSpec, inputs: &[Arc<Raster>]) -> Result<Raster> {
        let first = || {
            inputs.first().map(|r| r.as_ref()).ok_or_else(|| {
                Error::Runtime(format!("Node '{}' evaluated without inputs", field))
            })
        };
        let second = || {
            inputs.get(1).map(|r| r.as_ref()).ok_or_else(|| {
                Error::Runtime(format!("Node '{}' requires a second input", field))
            })
        };

        let raster = match spec {
            NodeSpec::Presence { params } => self.eval_presence(&params.layer_id)?,
            NodeSpec::Constant { params } => Raster::filled(self.grid.clone(), params.value),
            NodeSpec::Add { .. } => fold(inputs, |a, b| a + b)?,
            NodeSpec::Mul { .. } => fold(inputs, |a, b| a * b)?,
            // f32::max returns the other operand when one side is NaN.
            NodeSpec::Max { .. } => fold(inputs, f32::max)?,
            NodeSpec::Scale { params, .. } => first()?.map(|v| v * params.factor),
            NodeSpec::Clamp { params, .. } => first()?.map(|v| v.clamp(params.min, params.max)),
            NodeSpec::GreaterThan { params, .. } => {
                first()?.map(|v| indicator(v, |v| v > params.threshold))
            }
            NodeSpec::LessOrEqual { params, .. } => {
                first()?.map(|v| indicator(v, |v| v <= params.threshold))
            }
            NodeSpec::Distance { params, .. } => distance_to_sources(first()?, params.max_distance),
            NodeSpec::Decay { params, .. } => first()?.map(|v| (params.constant * v).exp()),
            NodeSpec::FocalMax { params, .. } => focal_max(first()?, params.radius_px),
            NodeSpec::Suppress { .. } => first()?.zip_with(second()?, |v, by| {
                if is_source(by) {
                    f32::NAN
                } else {
                    v
                }
            }),
            NodeSpec::Mask { .. } => first()?.zip_with(second()?, |v, m| {
                if m.is_nan() || m == 0.0 {
                    f32::NAN
                } else {
                    v
                }
            }),
            NodeSpec::Unmask { params, .. } => {
                first()?.map(|v| if v.is_nan() { params.value } else { v })
            }
        };
        Ok(raster)
    }

    fn eval_presence(&self, layer_id: &str) -> Result<Raster> {
        let Some(layer) = self.layers.get(layer_id) else {
            return Err(Error::MissingPresence {
                id: layer_id.to_string(),
            });
        };
        let grid = self.grid.clone();
        Ok(Raster::from_fn(self.grid.clone(), |ix, iy| {
            let p = grid.index_to_world(ix as isize, iy as isize);
            if is_source(layer.sample(p)) {
                1.0
            } else {
                0.0
            }
        }))
    }
}

fn fold(inputs: &[Arc<Raster>], f: impl Fn(f32, f32) -> f32) -> Result<Raster> {
    let mut iter = inputs.iter();
    let Some(first) = iter.next() else {
        return Err(Error::Runtime("reduction over zero inputs".into()));
    };
    let mut acc = first.as_ref().clone();
    for r in iter {
        acc = acc.zip_with(r, &f);
    }
    Ok(acc)
}

#[inline]
fn indicator(v: f32, pred: impl Fn(f32) -> bool) -> f32 {
    if v.is_nan() {
        v
    } else if pred(v) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldgraph::compiler::FieldGraphCompiler;
    use crate::fieldgraph::spec::FieldGraphSpec;
    use glam::Vec2;

    fn grid() -> RasterGrid {
        RasterGrid::new(Vec2::ZERO, 100.0, 5, 1)
    }

    fn line_layer(cells: &[f32]) -> Raster {
        let mut r = Raster::new(grid());
        r.data.copy_from_slice(cells);
        r
    }

    fn runtime_for<'a>(spec: &FieldGraphSpec, layers: &'a PresenceRegistry) -> FieldRuntime<'a> {
        let program = FieldGraphCompiler::compile(spec).expect("compile");
        FieldRuntime::new(Arc::new(program), layers, grid())
    }

    #[test]
    fn presence_is_normalized_to_indicator() {
        let mut layers = PresenceRegistry::new();
        layers.register("a", line_layer(&[0.0, 7.0, f32::NAN, -1.0, 0.0]));
        let mut spec = FieldGraphSpec::default();
        spec.add("p", NodeSpec::presence("a"));

        let mut rt = runtime_for(&spec, &layers);
        let r = rt.bake("p").unwrap();
        assert_eq!(r.data, vec![0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_presence_layer_is_an_error() {
        let layers = PresenceRegistry::new();
        let mut spec = FieldGraphSpec::default();
        spec.add("p", NodeSpec::presence("nowhere"));

        let mut rt = runtime_for(&spec, &layers);
        assert!(matches!(
            rt.bake("p"),
            Err(Error::MissingPresence { id }) if id == "nowhere"
        ));
    }

    #[test]
    fn max_skips_masked_and_add_propagates() {
        let layers = PresenceRegistry::new();
        let mut spec = FieldGraphSpec::default();
        spec.add("c", NodeSpec::constant(2.0));
        spec.add("m", NodeSpec::constant(f32::NAN));
        spec.add("max", NodeSpec::max(vec!["c".into(), "m".into()]));
        spec.add("sum", NodeSpec::add(vec!["c".into(), "m".into()]));
        spec.add("filled", NodeSpec::unmask("sum".into(), 0.0));

        let mut rt = runtime_for(&spec, &layers);
        assert!(rt.bake("max").unwrap().data.iter().all(|v| *v == 2.0));
        assert!(rt.bake("sum").unwrap().data.iter().all(|v| v.is_nan()));
        assert!(rt.bake("filled").unwrap().data.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn suppress_and_mask_follow_their_inputs() {
        let mut layers = PresenceRegistry::new();
        layers.register("primary", line_layer(&[1.0, 1.0, 0.0, 0.0, 0.0]));
        layers.register("fill", line_layer(&[0.0, 1.0, 1.0, 0.0, 0.0]));
        layers.register("land", line_layer(&[1.0, 1.0, 1.0, 1.0, 0.0]));

        let mut spec = FieldGraphSpec::default();
        spec.add("primary", NodeSpec::presence("primary"));
        spec.add("fill", NodeSpec::presence("fill"));
        spec.add("land", NodeSpec::presence("land"));
        spec.add("fill_only", NodeSpec::suppress("fill".into(), "primary".into()));
        spec.add("on_land", NodeSpec::mask("fill".into(), "land".into()));

        let mut rt = runtime_for(&spec, &layers);
        let fill_only = rt.bake("fill_only").unwrap();
        assert!(fill_only.data[0].is_nan());
        assert!(fill_only.data[1].is_nan());
        assert_eq!(fill_only.data[2], 1.0);
        assert_eq!(fill_only.data[3], 0.0);

        let on_land = rt.bake("on_land").unwrap();
        assert_eq!(on_land.data[2], 1.0);
        assert!(on_land.data[4].is_nan());
    }

    #[test]
    fn distance_then_decay() {
        let mut layers = PresenceRegistry::new();
        layers.register("a", line_layer(&[1.0, 0.0, 0.0, 0.0, 0.0]));
        let mut spec = FieldGraphSpec::default();
        spec.add("p", NodeSpec::presence("a"));
        spec.add("d", NodeSpec::distance("p".into(), 250.0));
        spec.add("k", NodeSpec::decay("d".into(), -0.001));

        let mut rt = runtime_for(&spec, &layers);
        let k = rt.bake("k").unwrap();
        assert!((k.data[0] - 1.0).abs() < 1e-6);
        assert!((k.data[1] - (-0.1f32).exp()).abs() < 1e-6);
        assert!((k.data[2] - (-0.2f32).exp()).abs() < 1e-6);
        assert!(k.data[3].is_nan());
    }

    #[test]
    fn threshold_nodes_keep_masked_cells() {
        let layers = PresenceRegistry::new();
        let mut spec = FieldGraphSpec::default();
        spec.add("c", NodeSpec::constant(3.0));
        spec.add("gt", NodeSpec::greater_than("c".into(), 2.0));
        spec.add("le", NodeSpec::less_or_equal("c".into(), 2.0));
        spec.add("m", NodeSpec::constant(f32::NAN));
        spec.add("gt_m", NodeSpec::greater_than("m".into(), 0.0));

        let mut rt = runtime_for(&spec, &layers);
        assert_eq!(rt.bake("gt").unwrap().data[0], 1.0);
        assert_eq!(rt.bake("le").unwrap().data[0], 0.0);
        assert!(rt.bake("gt_m").unwrap().data[0].is_nan());
    }

    #[test]
    fn shared_inputs_are_baked_once() {
        let mut layers = PresenceRegistry::new();
        layers.register("a", line_layer(&[1.0, 0.0, 0.0, 0.0, 0.0]));
        let mut spec = FieldGraphSpec::default();
        spec.add("p", NodeSpec::presence("a"));
        spec.add("s1", NodeSpec::scale("p".into(), 2.0));
        spec.add("s2", NodeSpec::scale("p".into(), 3.0));
        spec.add("out", NodeSpec::add(vec!["s1".into(), "s2".into()]));

        let mut rt = runtime_for(&spec, &layers);
        let out = rt.bake("out").unwrap();
        assert_eq!(out.data[0], 5.0);
        assert_eq!(rt.baked_count(), 4);
        let again = rt.bake("p").unwrap();
        assert_eq!(rt.baked_count(), 4);
        assert_eq!(again.data[0], 1.0);
    }
}
