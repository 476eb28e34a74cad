mod producer;
mod token;

pub use producer::*;
pub use token::*;

/// Number of counter slots a [producer](FrameTrackerProducer) exposes.
pub const TRACKER_SLOTS: usize = 64;

/// Whether the hardware counter `current` has reached or passed `hold`, assuming both live in a
/// wrapping window of half the counter range.
pub fn tracker_reached(hold: u32, current: u32) -> bool {
    (hold.wrapping_sub(current) as i32) <= 0
}

/// The later of two wrapping counter values.
pub(crate) fn tracker_max(lhs: u32, rhs: u32) -> u32 {
    if tracker_reached(lhs, rhs) { rhs } else { lhs }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reached_handles_wraparound() {
        assert!(tracker_reached(5, 5));
        assert!(tracker_reached(5, 6));
        assert!(!tracker_reached(6, 5));

        assert!(!tracker_reached(2, u32::MAX - 1));
        assert!(tracker_reached(u32::MAX - 1, 2));
    }

    #[test]
    fn max_handles_wraparound() {
        assert_eq!(tracker_max(3, 7), 7);
        assert_eq!(tracker_max(7, 3), 7);
        assert_eq!(tracker_max(u32::MAX, 1), 1);
    }
}
