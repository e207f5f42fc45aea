//! Segmented backing store for edge records.
//!
//! A logical flat array of `i32` addressed by a single integer pointer,
//! physically backed by fixed-size segments so growth never reallocates or
//! moves existing data. Pointer units are integers, not bytes, and pointer
//! `0` is reserved as the empty-link sentinel.

use tracing::info;

use super::record::EDGE_UNITS;

/// Smallest segment, in integers.
const MIN_SEGMENT_SIZE: usize = 1 << 13;

/// The segmented `i32` store holding all edge records.
#[derive(Clone, Debug)]
pub struct EdgeArea {
    segments: Vec<Box<[i32]>>,
    segment_size: usize,
}

impl EdgeArea {
    /// Creates a store sized for roughly `edge_cap` edges.
    ///
    /// The segment size is the next power of two above `edge_cap * 7`
    /// integers, floored at 8192, and is fixed for the lifetime of the
    /// store (it is part of the on-disk format).
    pub fn with_edge_capacity(edge_cap: usize) -> Self {
        let wanted = (edge_cap * EDGE_UNITS as usize).max(1);
        let segment_size = wanted.next_power_of_two().max(MIN_SEGMENT_SIZE);
        Self {
            segments: vec![vec![0; segment_size].into_boxed_slice()],
            segment_size,
        }
    }

    /// Reassembles a store from loaded segments.
    pub fn from_parts(segments: Vec<Box<[i32]>>, segment_size: usize) -> Self {
        Self {
            segments,
            segment_size,
        }
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Box<[i32]>] {
        &self.segments
    }

    /// Total addressable integers.
    pub fn capacity(&self) -> usize {
        self.segment_size * self.segments.len()
    }

    pub fn get(&self, pointer: i32) -> i32 {
        let p = pointer as usize;
        self.segments[p / self.segment_size][p % self.segment_size]
    }

    pub fn set(&mut self, pointer: i32, value: i32) {
        let p = pointer as usize;
        self.segments[p / self.segment_size][p % self.segment_size] = value;
    }

    /// Makes sure a full edge record starting at `pointer` fits, appending a
    /// zero-filled segment if not. Segments are never resized or freed.
    pub fn ensure_pointer(&mut self, pointer: i32) {
        if (pointer as usize) + (EDGE_UNITS as usize) < self.capacity() {
            return;
        }
        info!(
            segment = self.segments.len(),
            mb = self.segment_size as f32 * 4.0 / (1 << 20) as f32,
            "edge_area.segment_added"
        );
        self.segments
            .push(vec![0; self.segment_size].into_boxed_slice());
    }
}
