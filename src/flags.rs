//! Edge flag encoding.
//!
//! The graph core treats flags as an opaque `i32` and only needs three
//! operations on them: swapping the direction bits when an edge is stored
//! or read from its higher endpoint, and the two direction predicates the
//! filtered iterators use. Everything else (speed, street type) belongs to
//! the codec implementation.

/// Direction-bit operations the storage core calls into.
///
/// Implementations are stateless; the codec is chosen as a type parameter
/// of [`RoadGraph`](crate::RoadGraph).
pub trait FlagCodec {
    /// Exchanges the forward and backward bits, leaving the rest untouched.
    fn swap_direction(flags: i32) -> i32;

    /// True if the edge is traversable from its lower endpoint.
    fn is_forward(flags: i32) -> bool;

    /// True if the edge is traversable towards its lower endpoint.
    fn is_backward(flags: i32) -> bool;

    /// Flags for a plain edge in one or both directions.
    fn default_flags(both_directions: bool) -> i32;
}

/// Default road-vehicle codec: bit 0 forward, bit 1 backward, speed in
/// km/h in the bits above.
pub struct CarFlags;

impl CarFlags {
    pub const FORWARD: i32 = 1;
    pub const BACKWARD: i32 = 2;
    pub const BOTH: i32 = Self::FORWARD | Self::BACKWARD;

    pub const DEFAULT_SPEED: i32 = 50;
    pub const MAX_SPEED: i32 = 120;

    /// Encodes a speed and direction combination.
    pub fn flags(speed: i32, both_directions: bool) -> i32 {
        let dir = if both_directions {
            Self::BOTH
        } else {
            Self::FORWARD
        };
        (speed << 2) | dir
    }

    /// Speed in km/h carried by the flags.
    pub fn speed_part(flags: i32) -> i32 {
        let speed = flags >> 2;
        if speed == 0 {
            Self::DEFAULT_SPEED
        } else {
            speed
        }
    }
}

impl FlagCodec for CarFlags {
    fn swap_direction(flags: i32) -> i32 {
        let dir = flags & Self::BOTH;
        if dir == Self::BOTH || dir == 0 {
            return flags;
        }
        flags ^ Self::BOTH
    }

    fn is_forward(flags: i32) -> bool {
        flags & Self::FORWARD != 0
    }

    fn is_backward(flags: i32) -> bool {
        flags & Self::BACKWARD != 0
    }

    fn default_flags(both_directions: bool) -> i32 {
        Self::flags(Self::DEFAULT_SPEED, both_directions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_flips_one_way_only() {
        let fwd = CarFlags::flags(70, false);
        let swapped = CarFlags::swap_direction(fwd);
        assert!(!CarFlags::is_forward(swapped));
        assert!(CarFlags::is_backward(swapped));
        assert_eq!(CarFlags::speed_part(swapped), 70);
        assert_eq!(CarFlags::swap_direction(swapped), fwd);

        let both = CarFlags::flags(70, true);
        assert_eq!(CarFlags::swap_direction(both), both);
    }

    #[test]
    fn default_flags_directions() {
        let both = CarFlags::default_flags(true);
        assert!(CarFlags::is_forward(both));
        assert!(CarFlags::is_backward(both));

        let one_way = CarFlags::default_flags(false);
        assert!(CarFlags::is_forward(one_way));
        assert!(!CarFlags::is_backward(one_way));
    }

    #[test]
    fn zero_speed_falls_back_to_default() {
        assert_eq!(CarFlags::speed_part(CarFlags::BOTH), CarFlags::DEFAULT_SPEED);
    }
}
