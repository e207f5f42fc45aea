//! The graph facade: node and edge insertion, filtered traversal, lazy
//! deletion, compaction and persistence lifecycle.
//!
//! The store is single-writer/many-reader by construction: read
//! operations take `&self`, write operations `&mut self`, and no internal
//! locking exists. Embedders that share a graph across threads supply
//! their own read/write lock.

mod compact;
mod iter;

pub use iter::{AllEdges, EdgeIter, EdgeRecord, EdgeRef};

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::bitset::BitSet;
use crate::bounds::BBox;
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::flags::{CarFlags, FlagCodec};
use crate::storage::persist::{self, Settings};
use crate::storage::record::{quantize_distance, EDGE_UNITS, EMPTY_LINK};
use crate::storage::{EdgeArea, NodeTable};

/// Hard cap on adjacency-list walks; exceeding it signals a cycle or a
/// corrupted link field, not a functional limit.
pub(crate) const MAX_LIST_WALK: usize = 1000;

/// An in-memory, persistable road-network graph.
///
/// Nodes are dense non-negative ids carrying a coordinate; edges are
/// weighted, optionally directional, and live in a segmented integer
/// store threaded with per-node intrusive linked lists. Node deletion is
/// two-phase: [`mark_deleted`](Self::mark_deleted) is O(1), and
/// [`optimize`](Self::optimize) compacts in place, renumbering moved
/// nodes. The flag codec `F` interprets the opaque per-edge flags.
pub struct RoadGraph<F: FlagCodec = CarFlags> {
    nodes: NodeTable,
    edges: EdgeArea,
    next_global_pointer: i32,
    deleted: BitSet,
    bounds: BBox,
    created_ms: i64,
    storage_dir: Option<PathBuf>,
    _codec: PhantomData<F>,
}

impl<F: FlagCodec> RoadGraph<F> {
    /// Creates an in-memory graph sized for `node_cap` nodes and twice as
    /// many edges.
    pub fn new(node_cap: usize) -> Self {
        Self::with_capacity(node_cap, 2 * node_cap)
    }

    pub fn with_capacity(node_cap: usize, edge_cap: usize) -> Self {
        Self {
            nodes: NodeTable::with_capacity(node_cap),
            edges: EdgeArea::with_edge_capacity(edge_cap),
            next_global_pointer: 0,
            deleted: BitSet::with_capacity(node_cap),
            bounds: BBox::INVERSE,
            created_ms: now_millis(),
            storage_dir: None,
            _codec: PhantomData,
        }
    }

    /// Builds a graph from a [`GraphConfig`].
    pub fn with_config(config: GraphConfig) -> Result<Self> {
        match config.storage_dir {
            Some(dir) => Self::open(dir, config.node_capacity, config.edge_capacity),
            None => Ok(Self::with_capacity(config.node_capacity, config.edge_capacity)),
        }
    }

    /// Opens a graph backed by `dir`: loads the existing file set if the
    /// directory exists, otherwise starts fresh with the given capacities.
    /// Either way, subsequent [`flush`](Self::flush) calls write to `dir`.
    pub fn open(dir: impl Into<PathBuf>, node_cap: usize, edge_cap: usize) -> Result<Self> {
        let dir = dir.into();
        match persist::load_graph(&dir)? {
            Some(loaded) => Ok(Self {
                deleted: BitSet::with_capacity(loaded.nodes.count()),
                nodes: loaded.nodes,
                edges: loaded.edges,
                next_global_pointer: loaded.next_global_pointer,
                bounds: loaded.bounds,
                created_ms: loaded.created_ms,
                storage_dir: Some(dir),
                _codec: PhantomData,
            }),
            None => {
                let mut graph = Self::with_capacity(node_cap, edge_cap);
                graph.storage_dir = Some(dir);
                Ok(graph)
            }
        }
    }

    /// Number of valid node ids; ids are dense in `[0, node_count)`.
    pub fn node_count(&self) -> usize {
        self.nodes.count()
    }

    /// Number of inserted edge records.
    pub fn edge_count(&self) -> usize {
        (self.next_global_pointer / EDGE_UNITS) as usize
    }

    pub fn bounds(&self) -> BBox {
        self.bounds
    }

    pub fn latitude(&self, node: usize) -> f64 {
        self.nodes.lat(node)
    }

    pub fn longitude(&self, node: usize) -> f64 {
        self.nodes.lon(node)
    }

    pub fn storage_location(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    pub fn segment_count(&self) -> usize {
        self.edges.segment_count()
    }

    pub fn segment_size(&self) -> usize {
        self.edges.segment_size()
    }

    /// Sets a node's coordinate, growing the id space to include `index`.
    /// The bounding box widens to contain the coordinate and never
    /// shrinks, not even through compaction.
    pub fn set_node(&mut self, index: usize, lat: f64, lon: f64) {
        self.ensure_node_index(index);
        self.nodes.set_coords(index, lat, lon);
        self.bounds.extend(lat, lon);
    }

    /// Inserts an edge with the codec's default flags.
    pub fn edge_default(
        &mut self,
        a: usize,
        b: usize,
        distance_m: f64,
        both_directions: bool,
    ) -> Result<()> {
        self.edge(a, b, distance_m, F::default_flags(both_directions))
    }

    /// Inserts an edge between `a` and `b`, creating either node id if it
    /// does not exist yet. `flags` are interpreted relative to `a`; the
    /// stored record is canonicalized to its lower endpoint. Duplicate
    /// edges are allowed.
    pub fn edge(&mut self, a: usize, b: usize, distance_m: f64, flags: i32) -> Result<()> {
        if a.max(b) > i32::MAX as usize {
            return Err(GraphError::CapacityExhausted(
                "node id exceeds 32-bit record space",
            ));
        }
        self.ensure_node_index(a.max(b));
        self.internal_edge_add(a as i32, b as i32, quantize_distance(distance_m), flags)
    }

    /// All edges incident to `node`, regardless of direction.
    pub fn edges(&self, node: usize) -> EdgeIter<'_, F> {
        EdgeIter::new(&self.edges, node, self.nodes.head(node), true, true)
    }

    /// Edges entering `node`.
    pub fn incoming(&self, node: usize) -> EdgeIter<'_, F> {
        EdgeIter::new(&self.edges, node, self.nodes.head(node), true, false)
    }

    /// Edges leaving `node`.
    pub fn outgoing(&self, node: usize) -> EdgeIter<'_, F> {
        EdgeIter::new(&self.edges, node, self.nodes.head(node), false, true)
    }

    /// Linear scan over all edge records; see [`AllEdges`] for when the
    /// result is meaningful.
    pub fn all_edges(&self) -> AllEdges<'_> {
        AllEdges::new(&self.edges, self.next_global_pointer)
    }

    /// Marks a node for removal by the next [`optimize`](Self::optimize).
    /// `index` must be a valid node id.
    pub fn mark_deleted(&mut self, index: usize) {
        self.deleted.insert(index);
    }

    pub fn is_deleted(&self, index: usize) -> bool {
        self.deleted.contains(index)
    }

    /// Compacts away marked nodes, then writes the file set if a storage
    /// directory is attached.
    pub fn flush(&mut self) -> Result<()> {
        self.optimize()?;
        self.save()?;
        Ok(())
    }

    /// Equivalent to [`flush`](Self::flush).
    pub fn close(&mut self) -> Result<()> {
        self.flush()
    }

    /// Writes the backing arrays and settings to the storage directory.
    /// Returns `false` when the graph has no storage directory attached.
    /// On-disk state is undefined after a partial failure.
    pub fn save(&self) -> Result<bool> {
        let Some(dir) = &self.storage_dir else {
            return Ok(false);
        };
        let settings = Settings {
            node_count: self.nodes.count() as i32,
            created_ms: self.created_ms,
            next_global_pointer: self.next_global_pointer,
            current_segment: self.edges.segment_count() as i32 - 1,
            segment_size: self.edges.segment_size() as i32,
            min_lon: self.bounds.min_lon,
            max_lon: self.bounds.max_lon,
            min_lat: self.bounds.min_lat,
            max_lat: self.bounds.max_lat,
        };
        persist::save_graph(dir, &self.nodes, &self.edges, &settings)?;
        Ok(true)
    }

    fn ensure_node_index(&mut self, index: usize) {
        if let Some(cap) = self.nodes.ensure_index(index) {
            self.deleted.ensure_capacity(cap);
        }
    }

    fn internal_edge_add(&mut self, a: i32, b: i32, dist_q: i32, flags: i32) -> Result<()> {
        let new_pointer = self.next_edge_pointer()?;
        self.connect_new_edge(a, new_pointer)?;
        self.connect_new_edge(b, new_pointer)?;
        self.edges.write_record::<F>(
            new_pointer,
            a,
            b,
            EMPTY_LINK,
            EMPTY_LINK,
            flags,
            dist_q,
        );
        Ok(())
    }

    /// Advances the global pointer by one record. The pointer space is a
    /// signed 32-bit integer; going negative means the store is full.
    fn next_edge_pointer(&mut self) -> Result<i32> {
        let next = self
            .next_global_pointer
            .checked_add(EDGE_UNITS)
            .filter(|pointer| *pointer >= 0)
            .ok_or(GraphError::CapacityExhausted("edge pointer space exhausted"))?;
        self.next_global_pointer = next;
        Ok(next)
    }

    /// Appends `new_pointer` to `node`'s adjacency list. The new record's
    /// own link fields are still zero, so the list terminates there.
    fn connect_new_edge(&mut self, node: i32, new_pointer: i32) -> Result<()> {
        let head = self.nodes.head(node as usize);
        if head > EMPTY_LINK {
            let last_link = self.last_edge_link_pos(node, head)?;
            self.edges.set(last_link, new_pointer);
        } else {
            self.nodes.set_head(node as usize, new_pointer);
        }
        Ok(())
    }

    /// Walks `node`'s list to its tail and returns the position of the
    /// tail's link field.
    fn last_edge_link_pos(&self, node: i32, mut pointer: i32) -> Result<i32> {
        for _ in 0..MAX_LIST_WALK {
            let other = self.edges.other_node(node, pointer);
            let last_link = EdgeArea::link_pos(node, other, pointer);
            pointer = self.edges.get(last_link);
            if pointer == EMPTY_LINK {
                return Ok(last_link);
            }
        }
        Err(GraphError::Corruption(
            "no end of adjacency list found while connecting edge",
        ))
    }
}

impl<F: FlagCodec> Clone for RoadGraph<F> {
    /// Deep copy: fresh node arrays and edge segments with identical
    /// contents and geometry. The storage location and deletion marks are
    /// not inherited.
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            next_global_pointer: self.next_global_pointer,
            deleted: BitSet::with_capacity(self.nodes.capacity()),
            bounds: self.bounds,
            created_ms: now_millis(),
            storage_dir: None,
            _codec: PhantomData,
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
