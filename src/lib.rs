//! Compact in-memory road-network graph storage for routing workloads.
//!
//! Geo-located nodes and weighted, optionally directional edges live in a
//! segmented integer store with per-node intrusive adjacency lists. Nodes
//! are deleted lazily and compacted in place; the whole graph can be
//! flushed to and reloaded from a plain on-disk file set.
//!
//! Routing algorithms, weight functions and import pipelines are external
//! collaborators; this crate only stores and traverses the graph.

pub mod bitset;
pub mod bounds;
pub mod config;
pub mod error;
pub mod flags;
pub mod graph;
pub mod storage;

pub use crate::bounds::BBox;
pub use crate::config::GraphConfig;
pub use crate::error::{GraphError, Result};
pub use crate::flags::{CarFlags, FlagCodec};
pub use crate::graph::{AllEdges, EdgeIter, EdgeRecord, EdgeRef, RoadGraph};
