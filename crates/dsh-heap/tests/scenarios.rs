use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dsh_heap::HeapError;
use dsh_heap::memory_management::{
    AcquireParams, BlockState, MemoryBlockManager, MemoryBlockManagerOptions,
};
use dsh_heap::storage::BytesBackend;

fn manager_with_counter() -> (MemoryBlockManager<BytesBackend>, Arc<AtomicU32>) {
    let counter = Arc::new(AtomicU32::new(0));
    let mut manager =
        MemoryBlockManager::new(BytesBackend::default(), MemoryBlockManagerOptions::default());
    manager.register_tracker_data(counter.clone()).unwrap();
    (manager, counter)
}

#[test_log::test]
fn single_block_is_aligned_at_heap_start() {
    let (mut manager, _counter) = manager_with_counter();
    manager.register_heap(0, 4096, false).unwrap();

    let blocks = manager
        .acquire_space(AcquireParams::new(5, vec![100]))
        .unwrap();

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].offset(), 0);
    assert_eq!(blocks[0].size(), 128);
    assert_eq!(blocks[0].tracker_id(), 5);
    assert_eq!(manager.heap(0).unwrap().used(), 128);
    assert_eq!(manager.block_state(&blocks[0]).unwrap(), BlockState::Allocated);
    manager.validate().unwrap();
}

#[test_log::test]
fn completed_block_coalesces_back_into_one_free_block() {
    let (mut manager, counter) = manager_with_counter();
    manager.register_heap(0, 4096, false).unwrap();

    let blocks = manager
        .acquire_space(AcquireParams::new(5, vec![100]))
        .unwrap();
    manager.submit_blocks(&blocks).unwrap();
    assert_eq!(manager.block_stats(BlockState::Free).size, 3968);

    counter.store(5, Ordering::Relaxed);
    let updated = manager.refresh_block_states().unwrap();

    assert_eq!(updated, 1);
    assert_eq!(manager.heap(0).unwrap().used(), 0);
    let free = manager.block_stats(BlockState::Free);
    assert_eq!(free.count, 1);
    assert_eq!(free.size, 4096);
    assert_eq!(manager.block_count(BlockState::Submitted), 0);
    manager.validate().unwrap();
}

#[test_log::test]
fn blocks_are_returned_in_request_order() {
    let (mut manager, _counter) = manager_with_counter();
    manager.register_heap(0, 1024, false).unwrap();

    let blocks = manager
        .acquire_space(AcquireParams::new(1, vec![200, 50, 300]))
        .unwrap();

    let sizes: Vec<u64> = blocks.iter().map(|block| block.size()).collect();
    assert_eq!(sizes, vec![256, 64, 320]);

    // Placed largest first.
    assert_eq!(blocks[2].offset(), 0);
    assert_eq!(blocks[0].offset(), 320);
    assert_eq!(blocks[1].offset(), 576);
    assert_eq!(manager.heap(0).unwrap().used(), 640);
    manager.validate().unwrap();
}

#[test_log::test]
fn shortfall_leaves_every_heap_untouched() {
    let (mut manager, _counter) = manager_with_counter();
    manager.register_heap(0, 4096, false).unwrap();
    manager.register_heap(1, 4096, false).unwrap();
    manager
        .acquire_space(AcquireParams::new(1, vec![512]).heap_affinity(0))
        .unwrap();

    // 4096 fits in heap 1, nothing holds 8192.
    let free_before = manager.block_stats(BlockState::Free);
    let err = manager
        .acquire_space(AcquireParams::new(2, vec![4096, 8192]))
        .unwrap_err();

    match &err {
        HeapError::NotEnoughSpace { needed } => assert_eq!(*needed, 8192),
        err => panic!("Unexpected error {err}"),
    }
    assert!(err.is_not_enough_space());
    assert_eq!(manager.heap(0).unwrap().used(), 512);
    assert_eq!(manager.heap(1).unwrap().used(), 0);
    assert_eq!(manager.block_stats(BlockState::Free), free_before);
    assert_eq!(manager.block_count(BlockState::Allocated), 1);
    manager.validate().unwrap();
}

#[test_log::test]
fn static_block_survives_reclamation() {
    let (mut manager, counter) = manager_with_counter();
    manager.register_heap(0, 4096, false).unwrap();

    let blocks = manager
        .acquire_space(AcquireParams::new(3, vec![256]).static_blocks())
        .unwrap();
    assert!(blocks[0].is_static());

    manager.submit_blocks(&blocks).unwrap();
    counter.store(10, Ordering::Relaxed);
    manager.refresh_block_states().unwrap();

    assert_eq!(manager.block_state(&blocks[0]).unwrap(), BlockState::Allocated);
    assert_eq!(manager.heap(0).unwrap().used(), 256);
    manager.validate().unwrap();
}

#[test_log::test]
fn retired_heap_is_deleted_once_drained() {
    let (mut manager, counter) = manager_with_counter();
    manager.register_heap(7, 4096, false).unwrap();

    let blocks = manager
        .acquire_space(AcquireParams::new(1, vec![4096]))
        .unwrap();
    manager.unregister_heap(7).unwrap();

    assert!(manager.is_pending_deletion(7));
    assert!(manager.heap(7).unwrap().is_free_in_progress());
    assert_eq!(manager.heap_count(), 1);
    manager.validate().unwrap();

    manager.submit_blocks(&blocks).unwrap();
    assert_eq!(manager.refresh_block_states().unwrap(), 0);
    assert_eq!(manager.heap_count(), 1);

    counter.store(1, Ordering::Relaxed);
    assert_eq!(manager.refresh_block_states().unwrap(), 1);

    assert_eq!(manager.heap_count(), 0);
    assert!(!manager.is_pending_deletion(7));
    assert_eq!(manager.total_size(), 0);
    assert_eq!(manager.backend().num_resources(), 0);
    assert!(manager.block_state(&blocks[0]).is_err());
    manager.validate().unwrap();
}
