use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dsh_heap::memory_management::{AcquireParams, MemoryBlockManager, MemoryBlockManagerOptions};
use dsh_heap::storage::BytesBackend;

const MB: u64 = 1024 * 1024;
const FRAMES_IN_FLIGHT: u32 = 3;

fn main() {
    let start = std::time::Instant::now();
    let counter = Arc::new(AtomicU32::new(0));
    let mut mm =
        MemoryBlockManager::new(BytesBackend::default(), MemoryBlockManagerOptions::default());
    mm.register_tracker_data(counter.clone()).unwrap();
    mm.register_heap(0, 16 * MB, false).unwrap();

    let mut in_flight = VecDeque::new();
    for frame in 1..=20_000u32 {
        let params = AcquireParams::new(frame, vec![256, 1024, 64, 4096, 512]);
        let blocks = loop {
            match mm.acquire_space(params.clone()) {
                Ok(blocks) => break blocks,
                Err(err) if err.is_not_enough_space() => match in_flight.pop_front() {
                    Some(done) => counter.store(done, Ordering::Relaxed),
                    None => panic!("{err}"),
                },
                Err(err) => panic!("{err}"),
            }
        };
        mm.submit_blocks(&blocks).unwrap();
        in_flight.push_back(frame);

        if in_flight.len() > FRAMES_IN_FLIGHT as usize
            && let Some(done) = in_flight.pop_front()
        {
            counter.store(done, Ordering::Relaxed);
        }
    }

    mm.print_memory_usage();
    println!("{:?}", start.elapsed());
}
