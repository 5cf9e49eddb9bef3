//! Cache for compiled field graph programs.
//!
//! This module provides a cache that maps driver ids to compiled [`FieldProgram`]s,
//! recompiling entries when the associated [`FieldGraphSpec`] fingerprint changes.
//!
//! Typical usage:
//! - Look up a program with [`FieldProgramCache::get_or_compile`].
//! - Reuse cached programs across pipeline runs (e.g. several realms or task dates of the
//!   same driver) to avoid recompilation.
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::Result;
use crate::fieldgraph::compiler::FieldGraphCompiler;
use crate::fieldgraph::spec::{FieldGraphSpec, FieldSemantics};
use crate::fieldgraph::{FieldProgram, NodeSpec};

struct ProgramEntry {
    program: Arc<FieldProgram>,
    fingerprint: u64,
}

/// Cache for compiled field programs, keyed by driver id and invalidated by graph fingerprint.
pub struct FieldProgramCache {
    entries: HashMap<String, ProgramEntry>,
}

impl FieldProgramCache {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets the compiled program cached under `id`, if any.
    pub fn get(&self, id: &str) -> Option<Arc<FieldProgram>> {
        self.entries.get(id).map(|e| Arc::clone(&e.program))
    }

    /// Inserts a compiled program with the given graph fingerprint.
    pub fn insert(&mut self, id: impl Into<String>, fingerprint: u64, program: FieldProgram) {
        self.entries.insert(
            id.into(),
            ProgramEntry {
                fingerprint,
                program: Arc::new(program),
            },
        );
    }

    /// Removes the compiled program for `id`, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<Arc<FieldProgram>> {
        self.entries.remove(id).map(|e| e.program)
    }

    /// Clears all entries from the cache.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Gets the compiled program for `id`, compiling and caching `spec` if the cached
    /// entry is missing or was compiled from a different graph.
    pub fn get_or_compile(&mut self, id: &str, spec: &FieldGraphSpec) -> Result<Arc<FieldProgram>> {
        let fp = fingerprint(spec);

        if let Some(entry) = self.entries.get(id) {
            if entry.fingerprint == fp {
                return Ok(Arc::clone(&entry.program));
            }
        }

        let program = Arc::new(FieldGraphCompiler::compile(spec)?);
        self.entries.insert(
            id.to_string(),
            ProgramEntry {
                fingerprint: fp,
                program: Arc::clone(&program),
            },
        );
        Ok(program)
    }
}

impl Default for FieldProgramCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Order-independent hash of a graph's nodes, parameters and semantics.
pub fn fingerprint(spec: &FieldGraphSpec) -> u64 {
    let mut hasher = DefaultHasher::new();

    let mut ids: Vec<&String> = spec.nodes.keys().collect();
    ids.sort();

    for id in ids {
        id.hash(&mut hasher);
        let node = &spec.nodes[id];

        let kind_tag: u8 = match node {
            NodeSpec::Presence { .. } => 1,
            NodeSpec::Constant { .. } => 2,
            NodeSpec::Add { .. } => 3,
            NodeSpec::Mul { .. } => 4,
            NodeSpec::Max { .. } => 5,
            NodeSpec::Scale { .. } => 6,
            NodeSpec::Clamp { .. } => 7,
            NodeSpec::GreaterThan { .. } => 8,
            NodeSpec::LessOrEqual { .. } => 9,
            NodeSpec::Distance { .. } => 10,
            NodeSpec::Decay { .. } => 11,
            NodeSpec::FocalMax { .. } => 12,
            NodeSpec::Suppress { .. } => 13,
            NodeSpec::Mask { .. } => 14,
            NodeSpec::Unmask { .. } => 15,
        };
        kind_tag.hash(&mut hasher);

        let semantics_tag: u8 = match spec.semantics.get(id) {
            Some(FieldSemantics::Direct) => 0,
            Some(FieldSemantics::Indirect) => 1,
            Some(FieldSemantics::Driver) => 2,
            None => 255,
        };
        semantics_tag.hash(&mut hasher);

        for input in node.inputs() {
            input.hash(&mut hasher);
        }

        match node {
            NodeSpec::Presence { params } => params.layer_id.hash(&mut hasher),
            NodeSpec::Constant { params } => params.value.to_bits().hash(&mut hasher),
            NodeSpec::Scale { params, .. } => params.factor.to_bits().hash(&mut hasher),
            NodeSpec::Clamp { params, .. } => {
                params.min.to_bits().hash(&mut hasher);
                params.max.to_bits().hash(&mut hasher);
            }
            NodeSpec::GreaterThan { params, .. } | NodeSpec::LessOrEqual { params, .. } => {
                params.threshold.to_bits().hash(&mut hasher)
            }
            NodeSpec::Distance { params, .. } => params.max_distance.to_bits().hash(&mut hasher),
            NodeSpec::Decay { params, .. } => params.constant.to_bits().hash(&mut hasher),
            NodeSpec::FocalMax { params, .. } => params.radius_px.hash(&mut hasher),
            NodeSpec::Unmask { params, .. } => params.value.to_bits().hash(&mut hasher),
            NodeSpec::Add { .. }
            | NodeSpec::Mul { .. }
            | NodeSpec::Max { .. }
            | NodeSpec::Suppress { .. }
            | NodeSpec::Mask { .. } => {}
        }
    }

    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_weight(weight: f32) -> FieldGraphSpec {
        let mut spec = FieldGraphSpec::default();
        spec.add("road", NodeSpec::presence("highway_primary"));
        spec.add_with_semantics(
            "driver",
            NodeSpec::scale("road".into(), weight),
            FieldSemantics::Driver,
        );
        spec
    }

    fn weight_from_program(program: &FieldProgram) -> f32 {
        if let Some(meta) = program.nodes.get("driver") {
            if let NodeSpec::Scale { params, .. } = &meta.spec {
                return params.factor;
            }
        }
        panic!("expected scale node");
    }

    #[test]
    fn caches_and_returns_compiled_programs() {
        let mut cache = FieldProgramCache::new();
        let spec = spec_with_weight(9.0);
        let program = cache.get_or_compile("road_v3", &spec).expect("compile succeeds");
        assert_eq!(weight_from_program(&program), 9.0);

        let again = cache.get_or_compile("road_v3", &spec).unwrap();
        assert!(Arc::ptr_eq(&program, &again));

        assert!(cache.remove("road_v3").is_some());
        assert!(cache.get("road_v3").is_none());

        let compiled = FieldGraphCompiler::compile(&spec).unwrap();
        cache.insert("road_v3", fingerprint(&spec), compiled);
        assert!(cache.get("road_v3").is_some());
    }

    #[test]
    fn recompiles_when_spec_fingerprint_changes() {
        let mut cache = FieldProgramCache::new();
        let v1 = cache.get_or_compile("roads", &spec_with_weight(9.0)).unwrap();
        let v2 = cache.get_or_compile("roads", &spec_with_weight(10.0)).unwrap();
        assert_eq!(weight_from_program(&v1), 9.0);
        assert_eq!(weight_from_program(&v2), 10.0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fingerprint_tracks_semantics() {
        let a = spec_with_weight(1.0);
        let mut b = spec_with_weight(1.0);
        b.set_semantics("road", FieldSemantics::Direct);
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a), fingerprint(&spec_with_weight(1.0)));
    }

    #[test]
    fn clear_removes_all_entries() {
        let mut cache = FieldProgramCache::default();
        cache.get_or_compile("a", &spec_with_weight(1.0)).unwrap();
        cache.get_or_compile("b", &spec_with_weight(2.0)).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
