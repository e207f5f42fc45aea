//! Direction-filtered adjacency iteration and the linear all-edges scan.

use std::marker::PhantomData;

use crate::error::{GraphError, Result};
use crate::flags::FlagCodec;
use crate::storage::record::{EDGE_UNITS, EMPTY_LINK};
use crate::storage::EdgeArea;

use super::MAX_LIST_WALK;

/// One edge as seen from the node it was iterated from.
///
/// Flags and the neighbor id are relative to the base node: for an edge
/// stored with the base as its higher endpoint, the direction bits have
/// already been swapped back.
#[derive(Clone, Copy, Debug)]
pub struct EdgeRef {
    base_node: usize,
    node: usize,
    distance: f64,
    flags: i32,
}

impl EdgeRef {
    /// The node this iteration started from.
    pub fn base_node(&self) -> usize {
        self.base_node
    }

    /// The other endpoint.
    pub fn node(&self) -> usize {
        self.node
    }

    /// Distance in meters.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Flags relative to the base node.
    pub fn flags(&self) -> i32 {
        self.flags
    }
}

/// Walks one node's adjacency list, yielding edges that pass the
/// direction filter.
///
/// The iterator borrows the graph; results are only meaningful while the
/// graph is not mutated, which the borrow checker enforces. A list longer
/// than the walk cap or a record that does not contain the base node
/// yields a corruption error and the iterator should be discarded.
pub struct EdgeIter<'g, F: FlagCodec> {
    edges: &'g EdgeArea,
    base_node: i32,
    next_pointer: i32,
    accept_in: bool,
    accept_out: bool,
    _codec: PhantomData<F>,
}

impl<'g, F: FlagCodec> EdgeIter<'g, F> {
    pub(crate) fn new(
        edges: &'g EdgeArea,
        base_node: usize,
        head: i32,
        accept_in: bool,
        accept_out: bool,
    ) -> Self {
        Self {
            edges,
            base_node: base_node as i32,
            next_pointer: head,
            accept_in,
            accept_out,
            _codec: PhantomData,
        }
    }
}

impl<F: FlagCodec> Iterator for EdgeIter<'_, F> {
    type Item = Result<EdgeRef>;

    fn next(&mut self) -> Option<Result<EdgeRef>> {
        let mut hops = 0;
        while self.next_pointer != EMPTY_LINK {
            if hops >= MAX_LIST_WALK {
                self.next_pointer = EMPTY_LINK;
                return Some(Err(GraphError::Corruption(
                    "no end of adjacency list found",
                )));
            }
            hops += 1;

            let pointer = self.next_pointer;
            let other = self.edges.other_node(self.base_node, pointer);
            if self.edges.other_node(other, pointer) != self.base_node {
                self.next_pointer = EMPTY_LINK;
                return Some(Err(GraphError::Corruption(
                    "iterated node not stored in edge record",
                )));
            }

            self.next_pointer = self
                .edges
                .get(EdgeArea::link_pos(self.base_node, other, pointer));

            let mut flags = self.edges.flags(pointer);
            if self.base_node > other {
                flags = F::swap_direction(flags);
            }

            if (self.accept_out && F::is_forward(flags))
                || (self.accept_in && F::is_backward(flags))
            {
                return Some(Ok(EdgeRef {
                    base_node: self.base_node as usize,
                    node: other as usize,
                    distance: self.edges.distance(pointer),
                    flags,
                }));
            }
        }
        None
    }
}

/// One raw edge record from the linear scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeRecord {
    node_a: usize,
    node_b: usize,
    distance: f64,
    flags: i32,
}

impl EdgeRecord {
    /// The lower endpoint.
    pub fn node_a(&self) -> usize {
        self.node_a
    }

    /// The higher endpoint.
    pub fn node_b(&self) -> usize {
        self.node_b
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Flags relative to the lower endpoint.
    pub fn flags(&self) -> i32 {
        self.flags
    }
}

/// Scans the edge store linearly; each edge appears exactly once,
/// bidirectional or not.
///
/// Unlinked records are not zeroed during compaction, so this scan is
/// only valid right after `optimize` or when no node was ever deleted.
pub struct AllEdges<'g> {
    edges: &'g EdgeArea,
    pointer: i32,
    max_pointer: i32,
}

impl<'g> AllEdges<'g> {
    pub(crate) fn new(edges: &'g EdgeArea, next_global_pointer: i32) -> Self {
        Self {
            edges,
            pointer: 0,
            max_pointer: next_global_pointer,
        }
    }
}

impl Iterator for AllEdges<'_> {
    type Item = EdgeRecord;

    fn next(&mut self) -> Option<EdgeRecord> {
        self.pointer += EDGE_UNITS;
        if self.pointer > self.max_pointer {
            return None;
        }
        Some(EdgeRecord {
            node_a: self.edges.node_a(self.pointer) as usize,
            node_b: self.edges.node_b(self.pointer) as usize,
            distance: self.edges.distance(self.pointer),
            flags: self.edges.flags(self.pointer),
        })
    }
}
