//! Construction options.

use std::path::PathBuf;

/// Sizing and storage options for building a [`RoadGraph`](crate::RoadGraph).
///
/// Capacities are hints: node arrays grow geometrically and the edge store
/// appends segments as needed, but the edge capacity fixes the segment
/// size, which becomes part of the on-disk format.
#[derive(Clone, Debug)]
pub struct GraphConfig {
    pub node_capacity: usize,
    pub edge_capacity: usize,
    pub storage_dir: Option<PathBuf>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::in_memory(1024)
    }
}

impl GraphConfig {
    /// A purely in-memory graph sized for `node_capacity` nodes and twice
    /// as many edges.
    pub fn in_memory(node_capacity: usize) -> Self {
        Self {
            node_capacity,
            edge_capacity: 2 * node_capacity,
            storage_dir: None,
        }
    }

    /// A graph backed by `dir`: loaded from it when the directory exists,
    /// flushed to it later either way.
    pub fn stored(dir: impl Into<PathBuf>, node_capacity: usize) -> Self {
        Self {
            storage_dir: Some(dir.into()),
            ..Self::in_memory(node_capacity)
        }
    }

    pub fn edge_capacity(mut self, edge_capacity: usize) -> Self {
        self.edge_capacity = edge_capacity;
        self
    }
}
