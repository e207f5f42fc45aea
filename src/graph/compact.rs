//! In-place compaction of lazily deleted nodes.
//!
//! Deleted ids leave holes in the dense id space. Compaction fills each
//! hole from the top: the lowest deleted id is paired with the highest
//! live id, the live node's payload moves down, and every edge record
//! touching a moved or disconnected node is rewritten through the normal
//! write path. The edge store itself is never reallocated; unlinked
//! records simply become unreachable.

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::bitset::BitSet;
use crate::error::{GraphError, Result};
use crate::flags::FlagCodec;
use crate::storage::record::{EDGE_UNITS, EMPTY_LINK};
use crate::storage::EdgeArea;

use super::{RoadGraph, MAX_LIST_WALK};

impl<F: FlagCodec> RoadGraph<F> {
    /// Removes all marked nodes, renumbering moved nodes so ids stay
    /// dense. A no-op when nothing is marked. Afterwards the deleted set
    /// is empty and ids are `[0, node_count)`.
    pub fn optimize(&mut self) -> Result<()> {
        self.optimize_with(|_, _| {})
    }

    /// Like [`optimize`](Self::optimize), but invokes `hook(old, new)` for
    /// every node moved to a new id, so embedders can relocate per-node
    /// payload they keep outside the graph.
    pub fn optimize_with(&mut self, hook: impl FnMut(usize, usize)) -> Result<()> {
        let deleted = self.deleted.cardinality();
        if deleted == 0 {
            debug!("graph.compact.noop");
            return Ok(());
        }
        self.in_place_delete(deleted, hook)
    }

    fn in_place_delete(&mut self, deleted: usize, mut hook: impl FnMut(usize, usize)) -> Result<()> {
        let node_count = self.nodes.count();
        let max_moves = deleted.min(node_count.saturating_sub(deleted));
        let mut old_indices = Vec::with_capacity(max_moves);
        let mut new_indices = Vec::with_capacity(max_moves);
        let mut old_to_new: FxHashMap<i32, i32> = FxHashMap::default();
        let mut to_update = BitSet::with_capacity(deleted * 3);

        // Pair each deleted slot (ascending) with the greatest live id
        // above it. Pairing stops once the candidate sinks to or below the
        // slot; the remaining deleted ids sit at the top and vanish with
        // the count cut. Live neighbors of every deleted node are
        // collected either way, so their lists can be spliced.
        let mut move_source = node_count;
        let mut pairing_done = false;
        let mut cursor = self.deleted.next_set_bit(0);
        while let Some(del_node) = cursor {
            self.collect_live_neighbors(del_node, &mut to_update)?;

            if !pairing_done {
                let live = loop {
                    if move_source == 0 {
                        break None;
                    }
                    move_source -= 1;
                    if !self.deleted.contains(move_source) {
                        break Some(move_source);
                    }
                };
                match live {
                    Some(live) if live > del_node => {
                        old_indices.push(live);
                        new_indices.push(del_node);
                        old_to_new.insert(live as i32, del_node as i32);
                    }
                    _ => pairing_done = true,
                }
            }

            cursor = self.deleted.next_set_bit(del_node + 1);
        }

        // Splice every edge leading to a deleted node out of the live
        // endpoint's list.
        let mut cursor = to_update.next_set_bit(0);
        while let Some(node) = cursor {
            self.remove_edges_to_deleted(node)?;
            cursor = to_update.next_set_bit(node + 1);
        }
        to_update.clear();

        // Moved nodes keep their edges; the records still carry the old
        // id, so every neighbor of a moved node marks the record for the
        // rewrite pass below.
        for &old_index in &old_indices {
            let mut pointer = self.nodes.head(old_index);
            let mut hops = 0;
            while pointer != EMPTY_LINK {
                if hops >= MAX_LIST_WALK {
                    return Err(GraphError::Corruption(
                        "no end of adjacency list found during compaction",
                    ));
                }
                hops += 1;
                let other = self.edges.other_node(old_index as i32, pointer);
                if self.deleted.contains(other as usize) {
                    return Err(GraphError::Corruption(
                        "edge to a deleted node survived unlinking",
                    ));
                }
                to_update.insert(other as usize);
                pointer = self
                    .edges
                    .get(EdgeArea::link_pos(old_index as i32, other, pointer));
            }
        }

        // Move node payloads into the freed slots.
        for (&old_index, &new_index) in old_indices.iter().zip(&new_indices) {
            self.nodes.move_entry(old_index, new_index);
            hook(old_index, new_index);
        }

        // Rewrite affected records with remapped ids. The write path
        // re-canonicalizes endpoint order, exchanging links and swapping
        // direction flags when the order flipped.
        let mut pointer = EDGE_UNITS;
        while pointer <= self.next_global_pointer {
            let node_a = self.edges.node_a(pointer);
            let node_b = self.edges.node_b(pointer);
            if to_update.contains(node_a as usize) || to_update.contains(node_b as usize) {
                let updated_a = old_to_new.get(&node_a).copied().unwrap_or(node_a);
                let updated_b = old_to_new.get(&node_b).copied().unwrap_or(node_b);
                let link_a = self.edges.get(EdgeArea::link_pos(node_a, node_b, pointer));
                let link_b = self.edges.get(EdgeArea::link_pos(node_b, node_a, pointer));
                let flags = self.edges.flags(pointer);
                let dist_q = self.edges.distance_q(pointer);
                self.edges
                    .write_record::<F>(pointer, updated_a, updated_b, link_a, link_b, flags, dist_q);
            }
            pointer += EDGE_UNITS;
        }

        self.nodes.truncate_count(node_count - deleted);
        self.deleted = BitSet::with_capacity(self.nodes.count());
        info!(
            removed = deleted,
            moved = old_indices.len(),
            nodes = self.nodes.count(),
            "graph.compacted"
        );
        Ok(())
    }

    /// Adds the live endpoints of all edges at `node` to `set`.
    fn collect_live_neighbors(&self, node: usize, set: &mut BitSet) -> Result<()> {
        let mut pointer = self.nodes.head(node);
        let mut hops = 0;
        while pointer != EMPTY_LINK {
            if hops >= MAX_LIST_WALK {
                return Err(GraphError::Corruption(
                    "no end of adjacency list found during compaction",
                ));
            }
            hops += 1;
            let other = self.edges.other_node(node as i32, pointer);
            if !self.deleted.contains(other as usize) {
                set.insert(other as usize);
            }
            pointer = self.edges.get(EdgeArea::link_pos(node as i32, other, pointer));
        }
        Ok(())
    }

    /// Walks `node`'s list and unlinks every edge whose other endpoint is
    /// deleted, splicing in place instead of restarting the walk.
    fn remove_edges_to_deleted(&mut self, node: usize) -> Result<()> {
        let node_i = node as i32;
        let mut prev_pointer = -1;
        let mut pointer = self.nodes.head(node);
        let mut hops = 0;
        while pointer != EMPTY_LINK {
            if hops >= MAX_LIST_WALK {
                return Err(GraphError::Corruption(
                    "no end of adjacency list found during compaction",
                ));
            }
            hops += 1;
            let other = self.edges.other_node(node_i, pointer);
            let next = self.edges.get(EdgeArea::link_pos(node_i, other, pointer));
            if self.deleted.contains(other as usize) {
                self.unlink_edge(pointer, prev_pointer, node);
            } else {
                prev_pointer = pointer;
            }
            pointer = next;
        }
        Ok(())
    }

    /// Unlinks the edge at `edge_pointer` from `node`'s list. A negative
    /// `prev_pointer` means the edge is the list head. The record itself
    /// is not zeroed; it merely becomes unreachable from any head.
    fn unlink_edge(&mut self, edge_pointer: i32, prev_pointer: i32, node: usize) {
        let node_i = node as i32;
        let other = self.edges.other_node(node_i, edge_pointer);
        let next = self.edges.get(EdgeArea::link_pos(node_i, other, edge_pointer));
        if prev_pointer < 0 {
            self.nodes.set_head(node, next);
        } else {
            let prev_other = self.edges.other_node(node_i, prev_pointer);
            let link = EdgeArea::link_pos(node_i, prev_other, prev_pointer);
            self.edges.set(link, next);
        }
    }
}
