use super::{TRACKER_SLOTS, TrackerData, tracker_max, tracker_reached};
use crate::error::{HeapError, Result};
use alloc::sync::Arc;
use hashbrown::HashMap;

/// The tracker values a piece of work must wait for, one per producer slot.
///
/// A token without producer or without any recorded slot is already expired. A token made
/// sticky never expires.
#[derive(Clone, Debug, Default)]
pub struct FrameTrackerToken {
    producer: Option<Arc<TrackerData>>,
    holds: HashMap<u32, u32>,
    stick: bool,
}

impl FrameTrackerToken {
    /// Create an empty token bound to the producer slots.
    pub fn new(producer: Arc<TrackerData>) -> Self {
        Self {
            producer: Some(producer),
            holds: HashMap::new(),
            stick: false,
        }
    }

    /// Bind the token to the producer slots.
    pub fn set_producer(&mut self, producer: Arc<TrackerData>) {
        self.producer = Some(producer);
    }

    /// Whether the token is bound to a producer.
    pub fn is_valid(&self) -> bool {
        self.producer.is_some()
    }

    /// Record the value to wait for on a slot, replacing any previous value.
    pub fn merge(&mut self, index: u32, value: u32) -> Result<()> {
        if index as usize >= TRACKER_SLOTS {
            return Err(HeapError::NotEnoughBuffer { index });
        }
        if value == 0 {
            return Err(HeapError::invalid("Tracker value 0 is reserved"));
        }

        self.holds.insert(index, value);
        Ok(())
    }

    /// Union with another token, keeping the later value of every slot.
    pub fn merge_token(&mut self, other: &FrameTrackerToken) {
        if self.producer.is_none() {
            self.producer = other.producer.clone();
        }

        for (index, value) in other.holds.iter() {
            self.holds
                .entry(*index)
                .and_modify(|hold| *hold = tracker_max(*hold, *value))
                .or_insert(*value);
        }
    }

    /// Whether hardware has passed every recorded value.
    pub fn is_expired(&self) -> bool {
        if self.stick {
            return false;
        }

        let producer = match &self.producer {
            Some(producer) => producer,
            None => return true,
        };

        self.holds.iter().all(|(index, hold)| {
            // Indices are checked on merge.
            let current = producer.current(*index).unwrap_or(*hold);
            tracker_reached(*hold, current)
        })
    }

    /// Pin the token so it never expires, or release the pin.
    pub fn set_stick(&mut self, stick: bool) {
        self.stick = stick;
    }

    /// Whether the token is pinned.
    pub fn is_stick(&self) -> bool {
        self.stick
    }

    /// The value recorded for a slot.
    pub fn hold(&self, index: u32) -> Option<u32> {
        self.holds.get(&index).copied()
    }

    /// Number of recorded slots.
    pub fn len(&self) -> usize {
        self.holds.len()
    }

    /// Whether no slot is recorded.
    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }

    /// Forget every recorded slot and the pin. The producer binding is kept.
    pub fn clear(&mut self) {
        self.holds.clear();
        self.stick = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::Ordering;

    fn signal(data: &TrackerData, index: u32, value: u32) {
        data.slot(index).unwrap().store(value, Ordering::Relaxed);
    }

    #[test]
    fn empty_token_is_expired() {
        assert!(FrameTrackerToken::default().is_expired());

        let data = Arc::new(TrackerData::default());
        assert!(FrameTrackerToken::new(data).is_expired());
    }

    #[test]
    fn expires_once_every_slot_is_reached() {
        let data = Arc::new(TrackerData::default());
        let mut token = FrameTrackerToken::new(data.clone());
        token.merge(1, 5).unwrap();
        token.merge(2, 3).unwrap();

        signal(&data, 1, 5);
        assert!(!token.is_expired());

        signal(&data, 2, 4);
        assert!(token.is_expired());
    }

    #[test]
    fn expiry_survives_counter_wraparound() {
        let data = Arc::new(TrackerData::default());
        let mut token = FrameTrackerToken::new(data.clone());
        token.merge(1, 2).unwrap();

        signal(&data, 1, u32::MAX - 1);
        assert!(!token.is_expired());

        signal(&data, 1, 2);
        assert!(token.is_expired());
    }

    #[test]
    fn merge_token_keeps_latest_values() {
        let data = Arc::new(TrackerData::default());
        let mut lhs = FrameTrackerToken::new(data.clone());
        lhs.merge(1, 10).unwrap();
        lhs.merge(2, 4).unwrap();

        let mut rhs = FrameTrackerToken::default();
        rhs.merge(1, 7).unwrap();
        rhs.merge(3, 9).unwrap();

        lhs.merge_token(&rhs);

        assert_eq!(lhs.hold(1), Some(10));
        assert_eq!(lhs.hold(2), Some(4));
        assert_eq!(lhs.hold(3), Some(9));
        assert_eq!(lhs.len(), 3);
    }

    #[test]
    fn sticky_token_never_expires() {
        let data = Arc::new(TrackerData::default());
        let mut token = FrameTrackerToken::new(data);
        token.set_stick(true);

        assert!(!token.is_expired());

        token.clear();
        assert!(token.is_expired());
    }

    #[test]
    fn invalid_merges_are_rejected() {
        let mut token = FrameTrackerToken::default();

        assert!(matches!(
            token.merge(64, 1),
            Err(HeapError::NotEnoughBuffer { index: 64 })
        ));
        assert!(token.merge(1, 0).is_err());
        assert!(token.is_empty());
    }
}
