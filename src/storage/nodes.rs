//! Node table: parallel arrays of coordinates and adjacency-list heads.

use crate::storage::record::EMPTY_LINK;

const MIN_CAPACITY: usize = 10;
const GROWTH_FACTOR: f64 = 1.5;

/// Dense per-node storage, indexed by node id.
///
/// Coordinates are narrowed to `f32`; the head pointer is `0` for nodes
/// without edges. The arrays are kept at capacity length (zero-filled past
/// `count`) so growth is a plain resize.
#[derive(Clone, Debug)]
pub struct NodeTable {
    lats: Vec<f32>,
    lons: Vec<f32>,
    heads: Vec<i32>,
    count: usize,
}

impl NodeTable {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            lats: vec![0.0; cap],
            lons: vec![0.0; cap],
            heads: vec![EMPTY_LINK; cap],
            count: 0,
        }
    }

    /// Reassembles a table from loaded arrays.
    pub fn from_parts(lats: Vec<f32>, lons: Vec<f32>, heads: Vec<i32>, count: usize) -> Self {
        Self {
            lats,
            lons,
            heads,
            count,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.lats.len()
    }

    /// Makes `index` a valid node id, growing the arrays geometrically when
    /// needed. Returns the new capacity if the arrays grew.
    pub fn ensure_index(&mut self, index: usize) -> Option<usize> {
        if index < self.count {
            return None;
        }
        self.count = index + 1;
        if self.count <= self.lats.len() {
            return None;
        }
        let cap = MIN_CAPACITY.max((self.count as f64 * GROWTH_FACTOR).ceil() as usize);
        self.lats.resize(cap, 0.0);
        self.lons.resize(cap, 0.0);
        self.heads.resize(cap, EMPTY_LINK);
        Some(cap)
    }

    pub fn set_coords(&mut self, index: usize, lat: f64, lon: f64) {
        self.lats[index] = lat as f32;
        self.lons[index] = lon as f32;
    }

    pub fn lat(&self, index: usize) -> f64 {
        f64::from(self.lats[index])
    }

    pub fn lon(&self, index: usize) -> f64 {
        f64::from(self.lons[index])
    }

    pub fn head(&self, index: usize) -> i32 {
        self.heads[index]
    }

    pub fn set_head(&mut self, index: usize, pointer: i32) {
        self.heads[index] = pointer;
    }

    /// Copies one node's payload (coordinates and list head) over another.
    pub fn move_entry(&mut self, old_index: usize, new_index: usize) {
        self.lats[new_index] = self.lats[old_index];
        self.lons[new_index] = self.lons[old_index];
        self.heads[new_index] = self.heads[old_index];
    }

    /// Shrinks the logical node count after compaction. Capacity is kept.
    pub fn truncate_count(&mut self, count: usize) {
        debug_assert!(count <= self.count);
        self.count = count;
    }

    pub fn lats(&self) -> &[f32] {
        &self.lats
    }

    pub fn lons(&self) -> &[f32] {
        &self.lons
    }

    pub fn heads(&self) -> &[i32] {
        &self.heads
    }
}
