//! # Pipeline Deduplication
//!
//! Pipelines are keyed by value-equality of their shader pair: two requests
//! naming the same (vertex, fragment) handles get the same pipeline back,
//! not a duplicate. Entries whose pipeline has been released fall out of
//! the cache on the next lookup.

use std::collections::HashMap;

use crate::owner::{Accessor, ResourceHandle};
use crate::resource::{Pipeline, Shader};

/// Value-equal key of a pipeline: its shader pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineDesc {
    /// Vertex stage shader.
    pub vertex: ResourceHandle<Shader>,
    /// Fragment stage shader.
    pub fragment: ResourceHandle<Shader>,
}

/// Shader-pair keyed pipeline cache. Render thread only.
#[derive(Default)]
pub(crate) struct PipelineCache {
    entries: HashMap<PipelineDesc, Accessor<Pipeline>>,
}

impl PipelineCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cached pipeline for `desc`, dropping a stale entry.
    pub(crate) fn get(&mut self, desc: PipelineDesc) -> Option<Accessor<Pipeline>> {
        match self.entries.get(&desc) {
            Some(accessor) if accessor.exists() => Some(accessor.clone()),
            Some(_) => {
                self.entries.remove(&desc);
                None
            }
            None => None,
        }
    }

    pub(crate) fn insert(&mut self, desc: PipelineDesc, accessor: Accessor<Pipeline>) {
        self.entries.insert(desc, accessor);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
