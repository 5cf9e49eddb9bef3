//! Compiler for field graph specifications into executable programs.
//!
//! This module turns a [`FieldGraphSpec`] into a runnable [`FieldProgram`].
//! It validates node arity and parameters and computes a topological order for
//! evaluation.
//!
//! Typical usage:
//! - [`FieldGraphCompiler`] with [`FieldGraphCompiler::compile`]
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::fieldgraph::spec::FieldGraphSpec;
use crate::fieldgraph::{FieldId, FieldProgram, NodeMeta, NodeSpec};

/// Compiler for field graph specifications into executable programs.
pub struct FieldGraphCompiler;

impl FieldGraphCompiler {
    /// Compiles a field graph specification into a [`FieldProgram`].
    pub fn compile(spec: &FieldGraphSpec) -> Result<FieldProgram> {
        let mut nodes: HashMap<FieldId, NodeMeta> = HashMap::new();

        for (id, node_spec) in &spec.nodes {
            for input in node_spec.inputs() {
                if !spec.nodes.contains_key(input) {
                    return Err(Error::Compile(format!(
                        "Node '{}' references unknown input '{}'",
                        id, input
                    )));
                }
            }

            validate_node_inputs(id, node_spec)?;
            validate_node_params(id, node_spec)?;

            nodes.insert(
                id.clone(),
                NodeMeta {
                    id: id.clone(),
                    spec: node_spec.clone(),
                    semantics: spec.semantics.get(id).copied(),
                },
            );
        }

        for id in spec.semantics.keys() {
            if !nodes.contains_key(id) {
                return Err(Error::Compile(format!(
                    "Semantics assigned to unknown node '{}'",
                    id
                )));
            }
        }

        let topo = topo_sort(&nodes)?;
        Ok(FieldProgram { nodes, topo })
    }
}

fn validate_node_inputs(id: &str, node_spec: &NodeSpec) -> Result<()> {
    let inputs = node_spec.inputs();
    let variant = node_spec.op_name();

    let ensure_at_least_one = || {
        if inputs.is_empty() {
            Err(Error::Compile(format!(
                "Node '{}' ({}) requires at least one input",
                id, variant
            )))
        } else {
            Ok(())
        }
    };

    let ensure_exactly = |n: usize| {
        if inputs.len() != n {
            Err(Error::Compile(format!(
                "Node '{}' ({}) requires exactly {} input(s) but found {}",
                id,
                variant,
                n,
                inputs.len()
            )))
        } else {
            Ok(())
        }
    };

    match node_spec {
        NodeSpec::Presence { .. } | NodeSpec::Constant { .. } => Ok(()),
        NodeSpec::Add { .. } | NodeSpec::Mul { .. } | NodeSpec::Max { .. } => {
            ensure_at_least_one()
        }
        NodeSpec::Suppress { .. } | NodeSpec::Mask { .. } => ensure_exactly(2),
        NodeSpec::Scale { .. }
        | NodeSpec::Clamp { .. }
        | NodeSpec::GreaterThan { .. }
        | NodeSpec::LessOrEqual { .. }
        | NodeSpec::Distance { .. }
        | NodeSpec::Decay { .. }
        | NodeSpec::FocalMax { .. }
        | NodeSpec::Unmask { .. } => ensure_exactly(1),
    }
}

fn validate_node_params(id: &str, node_spec: &NodeSpec) -> Result<()> {
    let invalid =
        |msg: &str| -> Result<()> { Err(Error::Compile(format!("Node '{}': {}", id, msg))) };

    match node_spec {
        NodeSpec::Presence { params } if params.layer_id.is_empty() => {
            invalid("presence layer id is empty")
        }
        NodeSpec::Distance { params, .. } if !(params.max_distance > 0.0) => {
            invalid("distance search radius must be > 0")
        }
        NodeSpec::Decay { params, .. }
            if !params.constant.is_finite() || params.constant > 0.0 =>
        {
            invalid("decay constant must be finite and <= 0")
        }
        NodeSpec::Clamp { params, .. } if params.min > params.max => {
            invalid("clamp min exceeds max")
        }
        NodeSpec::Scale { params, .. } if !params.factor.is_finite() => {
            invalid("scale factor must be finite")
        }
        _ => Ok(()),
    }
}

fn topo_sort(nodes: &HashMap<FieldId, NodeMeta>) -> Result<Vec<FieldId>> {
    let mut indeg: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, HashMap<&str, usize>> = HashMap::new();

    for (id, meta) in nodes {
        let id_str = id.as_str();
        let inputs = meta.spec.inputs();
        indeg.insert(id_str, inputs.len());

        for input in inputs {
            dependents
                .entry(input.as_str())
                .or_default()
                .entry(id_str)
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }
    }

    let mut q: Vec<&str> = indeg
        .iter()
        .filter_map(|(k, &v)| if v == 0 { Some(*k) } else { None })
        .collect();
    // Reverse-sorted so that pops come out in id order.
    q.sort_unstable_by(|a, b| b.cmp(a));
    let mut out: Vec<FieldId> = Vec::new();

    while let Some(n) = q.pop() {
        out.push(n.to_string());

        if let Some(children) = dependents.get(n) {
            let mut ready: Vec<&str> = Vec::new();
            for (child, count) in children {
                if let Some(e) = indeg.get_mut(child) {
                    *e = e.saturating_sub(*count);
                    if *e == 0 {
                        ready.push(*child);
                    }
                }
            }
            ready.sort_unstable_by(|a, b| b.cmp(a));
            q.extend(ready);
        }
    }

    if out.len() != nodes.len() {
        return Err(Error::Compile("Cycle detected or missing nodes".into()));
    }

    Ok(out)
}
