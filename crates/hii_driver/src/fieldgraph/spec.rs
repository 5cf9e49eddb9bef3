//! Specification types for authoring field graphs.
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::fieldgraph::{FieldId, NodeSpec};

/// A specification of a field graph, including nodes and their semantics.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct FieldGraphSpec {
    pub nodes: HashMap<FieldId, NodeSpec>,
    pub semantics: HashMap<FieldId, FieldSemantics>,
}

impl FieldGraphSpec {
    /// Add a node to the field graph specification.
    pub fn add(&mut self, id: &str, spec: NodeSpec) -> &mut Self {
        self.nodes.insert(id.to_string(), spec);
        self
    }

    /// Set the semantics for a node in the field graph specification.
    pub fn set_semantics(&mut self, id: &str, semantics: FieldSemantics) -> &mut Self {
        self.semantics.insert(id.to_string(), semantics);
        self
    }

    /// Add a node with semantics to the field graph specification.
    pub fn add_with_semantics(
        &mut self,
        id: &str,
        spec: NodeSpec,
        semantics: FieldSemantics,
    ) -> &mut Self {
        self.add(id, spec);
        self.set_semantics(id, semantics);
        self
    }

    /// Adds `spec` under `id` and returns the id, for chaining graph construction.
    pub fn push(&mut self, id: impl Into<FieldId>, spec: NodeSpec) -> FieldId {
        let id = id.into();
        self.nodes.insert(id.clone(), spec);
        id
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }
}

/// The role of a field in a driver graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FieldSemantics {
    /// A merged direct-influence field.
    Direct,
    /// A merged indirect-influence field.
    Indirect,
    /// The final driver field handed to quantization and export.
    Driver,
}

impl FieldSemantics {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSemantics::Direct => "direct",
            FieldSemantics::Indirect => "indirect",
            FieldSemantics::Driver => "driver",
        }
    }
}
