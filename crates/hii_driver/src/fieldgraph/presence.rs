//! Presence layer traits and registry for field inputs.
//!
//! This module defines how externally sourced presence rasters enter the field graph:
//! - Define custom sources by implementing [`PresenceLayer`].
//! - Manage resolved instances for one run with [`PresenceRegistry`].
use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;
use tracing::warn;

use crate::fieldgraph::Raster;

/// A presence raster sampled at a position in world coordinates.
///
/// Implementors map the world position to their own cell space, so layers at a coarser or
/// finer resolution than the run grid can be used directly. A non-zero, non-`NaN` sample
/// means the category is present.
pub trait PresenceLayer: Send + Sync {
    fn sample(&self, p: Vec2) -> f32;
}

impl PresenceLayer for Raster {
    fn sample(&self, p: Vec2) -> f32 {
        self.sample_domain(p)
    }
}

/// A layer with no features anywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyLayer;

impl PresenceLayer for EmptyLayer {
    fn sample(&self, _p: Vec2) -> f32 {
        0.0
    }
}

/// Registry of presence layers keyed by layer id.
#[non_exhaustive]
pub struct PresenceRegistry {
    layers: HashMap<String, Arc<dyn PresenceLayer>>,
}

impl PresenceRegistry {
    /// Creates a new, empty [`PresenceRegistry`].
    pub fn new() -> Self {
        Self {
            layers: HashMap::new(),
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            layers: HashMap::with_capacity(n),
        }
    }

    /// Returns the number of registered layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if there are no registered layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Registers a layer with the given identifier.
    pub fn register<T>(&mut self, id: impl Into<String>, layer: T)
    where
        T: PresenceLayer + 'static,
    {
        self.layers.insert(id.into(), Arc::new(layer));
    }

    /// Registers a shared layer with the given identifier.
    pub fn register_arc(&mut self, id: impl Into<String>, layer: Arc<dyn PresenceLayer>) {
        self.layers.insert(id.into(), layer);
    }

    /// Checks if a layer with the given identifier exists.
    pub fn contains(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    /// Retrieves a layer by its identifier.
    pub fn get(&self, id: &str) -> Option<Arc<dyn PresenceLayer>> {
        self.layers.get(id).cloned()
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.layers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Samples the given layer; unknown ids read as absent.
    #[inline]
    pub fn sample(&self, id: &str, p: Vec2) -> f32 {
        if let Some(layer) = self.layers.get(id) {
            layer.sample(p)
        } else {
            warn!("Unknown presence layer '{}'.", id);
            0.0
        }
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
