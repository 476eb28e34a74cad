use super::TRACKER_SLOTS;
use crate::error::{HeapError, Result};
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};

/// GPU-visible counter slots.
///
/// Hardware stores the last completed value of each slot; the CPU side only ever loads them.
#[derive(Debug)]
pub struct TrackerData {
    slots: [AtomicU32; TRACKER_SLOTS],
}

impl Default for TrackerData {
    fn default() -> Self {
        Self {
            slots: core::array::from_fn(|_| AtomicU32::new(0)),
        }
    }
}

impl TrackerData {
    /// The slot at the given index.
    pub fn slot(&self, index: u32) -> Result<&AtomicU32> {
        self.slots
            .get(index as usize)
            .ok_or(HeapError::NotEnoughBuffer { index })
    }

    /// The last value written by hardware into the slot.
    pub fn current(&self, index: u32) -> Result<u32> {
        self.slot(index).map(|slot| slot.load(Ordering::Relaxed))
    }
}

/// Owner of the tracker slots shared by every submission.
///
/// Each slot pairs a CPU-side next value with the GPU-visible current value. Slot `0` and value
/// `0` are reserved to mean "unassigned".
#[derive(Debug)]
pub struct FrameTrackerProducer {
    data: Arc<TrackerData>,
    next: [u32; TRACKER_SLOTS],
    in_use: [bool; TRACKER_SLOTS],
    last_assigned: usize,
}

impl Default for FrameTrackerProducer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTrackerProducer {
    /// Create a producer with every slot unassigned.
    pub fn new() -> Self {
        Self {
            data: Arc::new(TrackerData::default()),
            next: [1; TRACKER_SLOTS],
            in_use: [false; TRACKER_SLOTS],
            last_assigned: 0,
        }
    }

    /// Shared handle on the GPU-visible slots.
    pub fn data(&self) -> Arc<TrackerData> {
        self.data.clone()
    }

    /// Reserve an unused slot, searching round robin after the last one handed out.
    pub fn assign_new_tracker(&mut self) -> Result<u32> {
        for step in 1..=TRACKER_SLOTS {
            let index = (self.last_assigned + step) % TRACKER_SLOTS;
            if index == 0 || self.in_use[index] {
                continue;
            }

            self.in_use[index] = true;
            self.last_assigned = index;
            log::trace!("Assigned tracker slot {index}");
            return Ok(index as u32);
        }

        Err(HeapError::NotEnoughBuffer {
            index: TRACKER_SLOTS as u32,
        })
    }

    /// Give a slot back so it can be assigned again.
    pub fn release_tracker(&mut self, index: u32) -> Result<()> {
        let slot = self.check(index)?;
        if index == 0 || !self.in_use[slot] {
            return Err(HeapError::invalid(alloc::format!(
                "Tracker slot {index} isn't assigned"
            )));
        }
        self.in_use[slot] = false;
        Ok(())
    }

    /// Whether the slot is currently assigned.
    pub fn is_assigned(&self, index: u32) -> bool {
        self.in_use.get(index as usize).copied().unwrap_or(false)
    }

    /// Advance the CPU counter of the slot. The value `0` is skipped on wraparound.
    pub fn step_forward(&mut self, index: u32) -> Result<()> {
        let slot = self.check(index)?;
        self.next[slot] = match self.next[slot].wrapping_add(1) {
            0 => 1,
            value => value,
        };
        Ok(())
    }

    /// The value the next submission on the slot will signal.
    pub fn next_tracker(&self, index: u32) -> Result<u32> {
        let slot = self.check(index)?;
        Ok(self.next[slot])
    }

    /// The GPU-visible counter of the slot.
    pub fn latest_tracker_address(&self, index: u32) -> Result<&AtomicU32> {
        self.data.slot(index)
    }

    fn check(&self, index: u32) -> Result<usize> {
        match index as usize {
            slot if slot < TRACKER_SLOTS => Ok(slot),
            _ => Err(HeapError::NotEnoughBuffer { index }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_skips_slot_zero() {
        let mut producer = FrameTrackerProducer::new();

        assert_eq!(producer.assign_new_tracker().unwrap(), 1);
        assert_eq!(producer.assign_new_tracker().unwrap(), 2);
        assert!(!producer.is_assigned(0));
    }

    #[test]
    fn assignment_fails_when_full() {
        let mut producer = FrameTrackerProducer::new();

        for _ in 1..TRACKER_SLOTS {
            producer.assign_new_tracker().unwrap();
        }

        assert!(matches!(
            producer.assign_new_tracker(),
            Err(HeapError::NotEnoughBuffer { .. })
        ));
    }

    #[test]
    fn released_slot_is_reused_round_robin() {
        let mut producer = FrameTrackerProducer::new();
        let first = producer.assign_new_tracker().unwrap();
        let _second = producer.assign_new_tracker().unwrap();

        producer.release_tracker(first).unwrap();

        // The search continues after the last assigned slot.
        assert_eq!(producer.assign_new_tracker().unwrap(), 3);
        assert!(producer.release_tracker(first).is_err());
    }

    #[test]
    fn step_forward_skips_zero() {
        let mut producer = FrameTrackerProducer::new();
        let index = producer.assign_new_tracker().unwrap();
        assert_eq!(producer.next_tracker(index).unwrap(), 1);

        producer.next[index as usize] = u32::MAX;
        producer.step_forward(index).unwrap();

        assert_eq!(producer.next_tracker(index).unwrap(), 1);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut producer = FrameTrackerProducer::new();

        assert!(matches!(
            producer.step_forward(64),
            Err(HeapError::NotEnoughBuffer { index: 64 })
        ));
        assert!(producer.next_tracker(100).is_err());
        assert!(producer.latest_tracker_address(64).is_err());
    }

    #[test]
    fn hardware_writes_are_visible() {
        let producer = FrameTrackerProducer::new();

        producer
            .latest_tracker_address(3)
            .unwrap()
            .store(42, Ordering::Relaxed);

        assert_eq!(producer.data().current(3).unwrap(), 42);
    }
}
