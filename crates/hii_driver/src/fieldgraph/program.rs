//! Program representation for compiled field graphs.
//!
//! This module defines the data structures produced by compiling a
//! [`crate::fieldgraph::spec::FieldGraphSpec`] of [`crate::fieldgraph::NodeSpec`]s into an
//! executable program.
use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
pub use crate::fieldgraph::spec::FieldSemantics;
pub use crate::fieldgraph::{FieldId, NodeSpec};

/// Metadata about a node in the field program.
#[derive(Clone, Debug)]
pub struct NodeMeta {
    /// Field id for this node.
    pub id: FieldId,
    /// Node specification for this field.
    pub spec: NodeSpec,
    /// Optional semantic tag for this field.
    pub semantics: Option<FieldSemantics>,
}

impl NodeMeta {
    #[inline]
    pub fn is_driver(&self) -> bool {
        matches!(self.semantics, Some(FieldSemantics::Driver))
    }
}

/// A field program, consisting of nodes and their topological order.
#[derive(Clone, Debug)]
pub struct FieldProgram {
    /// Node metadata keyed by field id.
    pub nodes: HashMap<FieldId, NodeMeta>,
    /// Topological order of node evaluation.
    pub topo: Vec<FieldId>,
}

impl FieldProgram {
    /// Field ids tagged with `semantics`, in evaluation order.
    pub fn fields_with(&self, semantics: FieldSemantics) -> Vec<FieldId> {
        self.topo
            .iter()
            .filter(|id| {
                self.nodes
                    .get(id.as_str())
                    .is_some_and(|m| m.semantics == Some(semantics))
            })
            .cloned()
            .collect()
    }

    /// The single field tagged [`FieldSemantics::Driver`].
    pub fn driver_field(&self) -> Result<FieldId> {
        let mut drivers = self.fields_with(FieldSemantics::Driver);
        match drivers.len() {
            1 => Ok(drivers.remove(0)),
            0 => Err(Error::Compile("program has no Driver field".into())),
            n => Err(Error::Compile(format!(
                "program has {n} Driver fields: {drivers:?}"
            ))),
        }
    }

    /// Presence layer ids read by the program.
    pub fn presence_layers(&self) -> BTreeSet<&str> {
        self.nodes
            .values()
            .filter_map(|meta| match &meta.spec {
                NodeSpec::Presence { params } => Some(params.layer_id.as_str()),
                _ => None,
            })
            .collect()
    }
}
