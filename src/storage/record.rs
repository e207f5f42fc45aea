//! Edge record layout and codec.
//!
//! One edge occupies seven consecutive integers in the [`EdgeArea`]:
//!
//! ```text
//! +--------+--------+--------+--------+-------+--------+---------+
//! | node_a | node_b | link_a | link_b | flags | dist_q | sc_node |
//! +--------+--------+--------+--------+-------+--------+---------+
//! ```
//!
//! `node_a <= node_b` always holds; flags are stored relative to `node_a`.
//! `link_a`/`link_b` thread the two endpoints' adjacency lists through the
//! record. `dist_q` is the distance in units of 0.1 mm. `sc_node` is a
//! reserved slot (shortcut node); the write path leaves it untouched so it
//! survives compaction rewrites.

use crate::flags::FlagCodec;

use super::segments::EdgeArea;

/// Field offsets within a record.
const NODE_A: i32 = 0;
const NODE_B: i32 = 1;
const LINK_A: i32 = 2;
const LINK_B: i32 = 3;
const FLAGS: i32 = 4;
const DIST: i32 = 5;
const SC_NODE: i32 = 6;

/// Record length in integers.
pub const EDGE_UNITS: i32 = 7;

/// Sentinel pointer meaning "no edge" / "end of list".
pub const EMPTY_LINK: i32 = 0;

/// Quantization factor: stored distance is `round(meters * DIST_UNIT)`.
pub const DIST_UNIT: f64 = 10_000.0;

pub fn quantize_distance(meters: f64) -> i32 {
    (meters * DIST_UNIT).round() as i32
}

impl EdgeArea {
    pub fn node_a(&self, pointer: i32) -> i32 {
        self.get(pointer + NODE_A)
    }

    pub fn node_b(&self, pointer: i32) -> i32 {
        self.get(pointer + NODE_B)
    }

    /// The endpoint of the record at `pointer` that is not `this_node`.
    pub fn other_node(&self, this_node: i32, pointer: i32) -> i32 {
        let node_a = self.node_a(pointer);
        if node_a == this_node {
            self.node_b(pointer)
        } else {
            node_a
        }
    }

    /// Position of the next-edge link belonging to `this_node`'s adjacency
    /// list within the record at `pointer`.
    pub fn link_pos(this_node: i32, other_node: i32, pointer: i32) -> i32 {
        if this_node <= other_node {
            pointer + LINK_A
        } else {
            pointer + LINK_B
        }
    }

    pub fn flags(&self, pointer: i32) -> i32 {
        self.get(pointer + FLAGS)
    }

    pub fn distance_q(&self, pointer: i32) -> i32 {
        self.get(pointer + DIST)
    }

    pub fn distance(&self, pointer: i32) -> f64 {
        f64::from(self.distance_q(pointer)) / DIST_UNIT
    }

    /// The reserved shortcut-node slot, zero unless a higher layer set it.
    pub fn shortcut_node(&self, pointer: i32) -> i32 {
        self.get(pointer + SC_NODE)
    }

    /// Writes a record, canonicalizing the endpoint order.
    ///
    /// If `node_this > node_other` the endpoints and their links are
    /// exchanged and the flags direction-swapped, so the stored record
    /// always satisfies `node_a <= node_b`. The reserved seventh slot is
    /// not written.
    #[allow(clippy::too_many_arguments)]
    pub fn write_record<F: FlagCodec>(
        &mut self,
        pointer: i32,
        node_this: i32,
        node_other: i32,
        link_this: i32,
        link_other: i32,
        flags: i32,
        dist_q: i32,
    ) {
        self.ensure_pointer(pointer);

        let (node_a, node_b, link_a, link_b, flags) = if node_this > node_other {
            (
                node_other,
                node_this,
                link_other,
                link_this,
                F::swap_direction(flags),
            )
        } else {
            (node_this, node_other, link_this, link_other, flags)
        };

        self.set(pointer + NODE_A, node_a);
        self.set(pointer + NODE_B, node_b);
        self.set(pointer + LINK_A, link_a);
        self.set(pointer + LINK_B, link_b);
        self.set(pointer + FLAGS, flags);
        self.set(pointer + DIST, dist_q);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::CarFlags;

    #[test]
    fn write_in_order_keeps_fields() {
        let mut area = EdgeArea::with_edge_capacity(10);
        let flags = CarFlags::flags(60, false);
        area.write_record::<CarFlags>(7, 1, 5, 21, 0, flags, quantize_distance(3.5));

        assert_eq!(area.node_a(7), 1);
        assert_eq!(area.node_b(7), 5);
        assert_eq!(area.get(7 + 2), 21);
        assert_eq!(area.get(7 + 3), 0);
        assert_eq!(area.flags(7), flags);
        assert_eq!(area.distance(7), 3.5);
    }

    #[test]
    fn write_swapped_canonicalizes() {
        let mut area = EdgeArea::with_edge_capacity(10);
        let flags = CarFlags::flags(60, false);
        area.write_record::<CarFlags>(7, 5, 1, 21, 14, flags, quantize_distance(3.5));

        assert_eq!(area.node_a(7), 1);
        assert_eq!(area.node_b(7), 5);
        // Links follow their endpoints.
        assert_eq!(area.get(7 + 2), 14);
        assert_eq!(area.get(7 + 3), 21);
        // One-way flags are re-expressed relative to the lower endpoint.
        assert_eq!(area.flags(7), CarFlags::swap_direction(flags));
    }

    #[test]
    fn other_node_and_link_pos() {
        let mut area = EdgeArea::with_edge_capacity(10);
        area.write_record::<CarFlags>(7, 2, 9, 0, 0, CarFlags::BOTH, 10_000);

        assert_eq!(area.other_node(2, 7), 9);
        assert_eq!(area.other_node(9, 7), 2);
        assert_eq!(EdgeArea::link_pos(2, 9, 7), 9);
        assert_eq!(EdgeArea::link_pos(9, 2, 7), 10);
    }

    #[test]
    fn distance_quantization_round_trips_within_tolerance() {
        let mut area = EdgeArea::with_edge_capacity(10);
        for meters in [0.0, 0.00004, 0.00006, 1.23456789, 5000.5] {
            area.write_record::<CarFlags>(7, 0, 1, 0, 0, 0, quantize_distance(meters));
            assert!((area.distance(7) - meters).abs() <= 0.5 / DIST_UNIT);
        }
    }
}
