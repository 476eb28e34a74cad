use super::arena::{BlockArena, ListStats};
use super::{AcquireParams, BlockState, MemoryBlock, MemoryBlockManagerOptions, MemoryUsage};
use crate::HeapId;
use crate::config::GlobalConfig;
use crate::error::{HeapError, Result};
use crate::heap::Heap;
use crate::id::BlockKey;
use crate::logging::AllocLogger;
use crate::storage::ResourceBackend;
use crate::tracker::{FrameTrackerProducer, TRACKER_SLOTS, TrackerData, tracker_reached};
use alloc::format;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};
use hashbrown::{HashMap, HashSet};

/// Where hardware completion is read from.
enum TrackerSource {
    /// One counter shared by every submission.
    Counter(Arc<AtomicU32>),
    /// Producer slots, each block carrying a token.
    Producer(Arc<TrackerData>),
}

struct HeapEntry {
    heap: Heap,
    sentinel: BlockKey,
}

/// Sub-allocates blocks out of registered heaps and reclaims them once hardware is done with them.
///
/// Blocks go through `free → allocated → submitted → free`. Acquired blocks are written by the
/// CPU, then [submitted](MemoryBlockManager::submit_blocks) along with the GPU work reading them.
/// [Refreshing](MemoryBlockManager::refresh_block_states) compares their tracker values against
/// the hardware counters and frees, then coalesces, every block whose work completed.
pub struct MemoryBlockManager<B: ResourceBackend> {
    backend: B,
    heaps: HashMap<HeapId, HeapEntry>,
    arena: BlockArena,
    pending_deletion: Vec<HeapId>,
    tracker: Option<TrackerSource>,
    options: MemoryBlockManagerOptions,
    total_size: u64,
    logger: AllocLogger,
}

impl<B: ResourceBackend> MemoryBlockManager<B> {
    /// Create a manager without heap nor tracker.
    pub fn new(backend: B, options: MemoryBlockManagerOptions) -> Self {
        let arena = BlockArena::new(
            options.pool_initial_count,
            options.pool_increment,
            options.pool_max_count,
        );
        let logger = AllocLogger::new(&options.logger);

        Self {
            backend,
            heaps: HashMap::new(),
            arena,
            pending_deletion: Vec::new(),
            tracker: None,
            options,
            total_size: 0,
            logger,
        }
    }

    /// Create a manager with the options of the [global configuration](GlobalConfig).
    pub fn from_global_config(backend: B) -> Self {
        let config = GlobalConfig::get();
        Self::new(backend, MemoryBlockManagerOptions::from_config(&config.memory))
    }

    /// Use a single hardware counter to track completion.
    pub fn register_tracker_data(&mut self, counter: Arc<AtomicU32>) -> Result<()> {
        if let Some(TrackerSource::Producer(_)) = self.tracker {
            return Err(HeapError::invalid(
                "A tracker producer is already registered",
            ));
        }

        self.tracker = Some(TrackerSource::Counter(counter));
        Ok(())
    }

    /// Use the slots of a producer to track completion.
    pub fn register_tracker_producer(&mut self, producer: &FrameTrackerProducer) -> Result<()> {
        if let Some(TrackerSource::Counter(_)) = self.tracker {
            return Err(HeapError::invalid("A tracker counter is already registered"));
        }

        self.tracker = Some(TrackerSource::Producer(producer.data()));
        Ok(())
    }

    /// Allocate a heap of at least `size` bytes and make its whole span available.
    pub fn register_heap(&mut self, id: HeapId, size: u64, hw_write_only: bool) -> Result<()> {
        if size == 0 {
            return Err(HeapError::invalid("Heap size can't be zero"));
        }
        if self.heaps.contains_key(&id) {
            return Err(HeapError::invalid(format!("Heap {id} is already registered")));
        }
        let size = size
            .checked_next_multiple_of(self.options.page_size)
            .ok_or_else(|| HeapError::invalid(format!("Heap size {size} overflows")))?;
        if self.arena.pool_capacity() < 2 {
            return Err(HeapError::BlockPoolExhausted {
                max: self.arena.max_count(),
            });
        }

        let mut heap = Heap::new(id);
        heap.allocate(
            &mut self.backend,
            size,
            self.options.lock_heaps_on_allocate,
            hw_write_only,
        )?;

        let sentinel = self.arena.take_from_pool()?;
        self.arena.create_sentinel(sentinel, &heap)?;
        let block = self.arena.take_from_pool()?;
        self.arena
            .create(block, &mut heap, BlockState::Free, Some(sentinel), 0, size, 0)?;
        self.arena.attach(block, BlockState::Free)?;

        self.total_size += size;
        self.heaps.insert(id, HeapEntry { heap, sentinel });
        self.logger
            .heap(format_args!("Registered heap {id} of {size} bytes"));

        Ok(())
    }

    /// Retire a heap. Its free blocks are released right away and the heap itself once every
    /// remaining block is reclaimed.
    pub fn unregister_heap(&mut self, id: HeapId) -> Result<()> {
        let entry = self
            .heaps
            .get(&id)
            .ok_or_else(|| HeapError::invalid(format!("Heap {id} isn't registered")))?;
        if entry.heap.is_free_in_progress() {
            return Ok(());
        }

        if self.tracker.is_some() {
            self.refresh_block_states()?;
        }

        let entry = self
            .heaps
            .get_mut(&id)
            .ok_or_else(|| HeapError::internal(format!("Heap {id} vanished during refresh")))?;
        entry.heap.prepare_for_free();

        let free: Vec<BlockKey> = self
            .arena
            .iter(BlockState::Free)
            .filter(|key| self.arena.node(*key).heap == Some(id))
            .collect();
        for key in free {
            self.arena.detach(key)?;
            self.arena.delete(key, &mut entry.heap)?;
            self.arena.attach(key, BlockState::Deleted)?;
        }

        self.logger.heap(format_args!(
            "Heap {id} pending deletion, {} bytes still used",
            entry.heap.used()
        ));
        self.pending_deletion.push(id);
        self.complete_heap_deletion()
    }

    /// Reserve one block per requested size, or none at all.
    ///
    /// Sizes are aligned, then placed from the largest to the smallest in the first free block
    /// that fits, free blocks being walked from the smallest. The returned blocks follow the
    /// request order.
    pub fn acquire_space(&mut self, params: AcquireParams) -> Result<Vec<MemoryBlock>> {
        let AcquireParams {
            tracker_id,
            tracker_index,
            block_sizes,
            alignment,
            is_static,
            heap_affinity,
        } = params;

        if block_sizes.is_empty() {
            return Err(HeapError::invalid("No block size requested"));
        }
        if block_sizes.contains(&0) {
            return Err(HeapError::invalid("Block sizes can't be zero"));
        }

        let producer = match &self.tracker {
            None => return Err(HeapError::MissingTracker),
            Some(TrackerSource::Counter(_)) => None,
            Some(TrackerSource::Producer(data)) => Some(data.clone()),
        };
        if !is_static && tracker_id == 0 {
            return Err(HeapError::invalid("Non-static blocks need a tracker id"));
        }
        let slot = match (&producer, tracker_index) {
            (Some(_), Some(index)) if index as usize >= TRACKER_SLOTS => {
                return Err(HeapError::NotEnoughBuffer { index });
            }
            (Some(_), None) if tracker_id != 0 => {
                return Err(HeapError::invalid(
                    "A tracker index is required with a tracker producer",
                ));
            }
            (_, index) => index.unwrap_or(0),
        };
        if let Some(id) = heap_affinity {
            match self.heaps.get(&id) {
                Some(entry) if !entry.heap.is_free_in_progress() => {}
                _ => {
                    return Err(HeapError::invalid(format!(
                        "Heap {id} can't take new allocations"
                    )));
                }
            }
        }

        let base = self.options.block_alignment;
        let alignment = alignment
            .checked_next_multiple_of(base)
            .ok_or_else(|| HeapError::invalid(format!("Alignment {alignment} overflows")))?
            .max(base);
        let sizes = block_sizes
            .iter()
            .map(|size| {
                size.checked_next_multiple_of(alignment)
                    .ok_or_else(|| HeapError::invalid(format!("Block size {size} overflows")))
            })
            .collect::<Result<Vec<u64>>>()?;

        let mut order: Vec<usize> = (0..sizes.len()).collect();
        order.sort_by(|lhs, rhs| sizes[*rhs].cmp(&sizes[*lhs]));

        if self.arena.stats(BlockState::Submitted).count > self.options.refresh_threshold as usize {
            self.refresh_block_states()?;
        }
        if self.arena.stats(BlockState::Free).count == 0 {
            self.refresh_block_states()?;
        }

        self.is_space_available(&sizes, &order, heap_affinity)?;

        let mut blocks: Vec<Option<MemoryBlock>> = vec![None; sizes.len()];
        for index in order {
            let size = sizes[index];
            let key = self
                .arena
                .find_free(size, heap_affinity)
                .ok_or_else(|| HeapError::internal(format!("No free block of {size} bytes")))?;
            let heap_id = self.heap_of(key)?;
            let entry = self
                .heaps
                .get_mut(&heap_id)
                .ok_or_else(|| unknown_heap(heap_id))?;

            self.arena.detach(key)?;
            if self.arena.node(key).size > size {
                let tail = self.arena.take_from_pool()?;
                self.arena.split(key, tail, &mut entry.heap, size)?;
                self.arena.attach(tail, BlockState::Free)?;
            }

            self.arena.node_mut(key).is_static = is_static;
            match &producer {
                Some(data) => self.arena.allocate_with_token(
                    key,
                    &mut entry.heap,
                    slot,
                    tracker_id,
                    data.clone(),
                )?,
                None => self.arena.allocate(key, &mut entry.heap, tracker_id)?,
            }
            self.arena.attach(key, BlockState::Allocated)?;

            let resource = *entry
                .heap
                .resource()
                .ok_or(HeapError::MissingResource { heap: heap_id })?;
            let node = self.arena.node(key);
            if self.logger.blocks_activated() {
                self.logger.block(format_args!(
                    "Allocated {} bytes at {} of heap {heap_id}",
                    node.size, node.offset
                ));
            }
            blocks[index] = Some(MemoryBlock::new(
                key,
                node.generation,
                heap_id,
                resource,
                node.offset,
                node.size,
                tracker_id,
                is_static,
            ));
        }

        blocks
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| HeapError::internal("A requested block wasn't placed"))
    }

    /// Hand allocated blocks over to the hardware. Invalidated handles are skipped, static blocks
    /// stay allocated.
    pub fn submit_blocks(&mut self, blocks: &[MemoryBlock]) -> Result<()> {
        let mut keys = Vec::with_capacity(blocks.len());
        let mut seen = HashSet::new();

        for block in blocks.iter().filter(|block| block.is_valid()) {
            let key = self.resolve(block)?;
            let state = self.arena.node(key).state;
            if state != BlockState::Allocated {
                return Err(HeapError::invalid(format!(
                    "Block at {} of heap {} is {state:?}, not allocated",
                    block.offset(),
                    block.heap_id()
                )));
            }
            if !seen.insert(key) {
                return Err(HeapError::invalid(format!(
                    "Block at {} of heap {} is submitted twice",
                    block.offset(),
                    block.heap_id()
                )));
            }
            keys.push(key);
        }

        for key in keys {
            if self.arena.node(key).is_static {
                continue;
            }
            self.arena.detach(key)?;
            self.arena.submit(key)?;
            self.arena.attach(key, BlockState::Submitted)?;
        }

        Ok(())
    }

    /// Release a block into the reclaim cycle, static or not, and invalidate the handle.
    pub fn clear_space(&mut self, block: &mut MemoryBlock) -> Result<()> {
        let key = self.resolve(block)?;

        match self.arena.node(key).state {
            BlockState::Allocated => {
                self.arena.detach(key)?;
                self.arena.node_mut(key).is_static = false;
                self.arena.submit(key)?;
                self.arena.attach(key, BlockState::Submitted)?;
            }
            BlockState::Submitted => {}
            state => {
                return Err(HeapError::invalid(format!(
                    "Blocks in state {state:?} can't be cleared"
                )));
            }
        }

        self.refresh_block_states()?;
        block.valid = false;
        Ok(())
    }

    /// Reclaim every submitted block whose tracker value was reached by the hardware.
    ///
    /// Returns the number of reclaimed blocks.
    pub fn refresh_block_states(&mut self) -> Result<u32> {
        let current = match &self.tracker {
            None => return Err(HeapError::MissingTracker),
            Some(TrackerSource::Counter(counter)) => Some(counter.load(Ordering::Relaxed)),
            Some(TrackerSource::Producer(_)) => None,
        };

        let submitted: Vec<BlockKey> = self.arena.iter(BlockState::Submitted).collect();
        let mut updated = 0;

        for key in submitted {
            let node = self.arena.node(key);
            let expired = match current {
                Some(current) => node.tracker_id == 0 || tracker_reached(node.tracker_id, current),
                None => node.token.is_expired(),
            };
            if !expired {
                continue;
            }

            let heap_id = self.heap_of(key)?;
            let entry = self
                .heaps
                .get_mut(&heap_id)
                .ok_or_else(|| unknown_heap(heap_id))?;

            self.arena.detach(key)?;
            if entry.heap.is_free_in_progress() {
                self.arena.delete(key, &mut entry.heap)?;
                self.arena.attach(key, BlockState::Deleted)?;
            } else {
                self.arena.free(key, &mut entry.heap)?;
                self.arena.coalesce(key)?;
                self.arena.attach(key, BlockState::Free)?;
            }
            updated += 1;
        }

        if updated > 0 && self.logger.blocks_activated() {
            self.logger
                .block(format_args!("Reclaimed {updated} submitted blocks"));
        }

        self.complete_heap_deletion()?;
        Ok(updated)
    }

    /// Copy `data` into an allocated block at `offset`.
    pub fn add_data(&mut self, block: &MemoryBlock, offset: u64, data: &[u8]) -> Result<()> {
        let (heap, start) = self.data_range(block, offset, data.len() as u64, true)?;
        let entry = self.heaps.get_mut(&heap).ok_or_else(|| unknown_heap(heap))?;
        entry.heap.write(&mut self.backend, start, data)
    }

    /// Write one plain structure into an allocated block at `offset`.
    pub fn add_pod<T: bytemuck::Pod>(
        &mut self,
        block: &MemoryBlock,
        offset: u64,
        value: &T,
    ) -> Result<()> {
        self.add_data(block, offset, bytemuck::bytes_of(value))
    }

    /// Zero a whole allocated block.
    pub fn zero_block(&mut self, block: &MemoryBlock) -> Result<()> {
        let (heap, start) = self.data_range(block, 0, block.size(), true)?;
        let entry = self.heaps.get_mut(&heap).ok_or_else(|| unknown_heap(heap))?;
        entry.heap.fill_zero(&mut self.backend, start, block.size())
    }

    /// Copy block content at `offset` into `data`.
    pub fn read_data(&mut self, block: &MemoryBlock, offset: u64, data: &mut [u8]) -> Result<()> {
        let (heap, start) = self.data_range(block, offset, data.len() as u64, false)?;
        let entry = self.heaps.get_mut(&heap).ok_or_else(|| unknown_heap(heap))?;
        entry.heap.read(&mut self.backend, start, data)
    }

    /// The whole content of a block.
    pub fn dump(&mut self, block: &MemoryBlock) -> Result<Vec<u8>> {
        let size = usize::try_from(block.size())
            .map_err(|_| HeapError::invalid("Block is too big to be dumped"))?;
        let mut data = vec![0; size];
        self.read_data(block, 0, &mut data)?;
        Ok(data)
    }

    /// Current state of the block behind a handle.
    pub fn block_state(&self, block: &MemoryBlock) -> Result<BlockState> {
        let key = self.resolve(block)?;
        Ok(self.arena.node(key).state)
    }

    /// A registered heap.
    pub fn heap(&self, id: HeapId) -> Option<&Heap> {
        self.heaps.get(&id).map(|entry| &entry.heap)
    }

    /// Ids of the registered heaps, draining ones included, in ascending order.
    pub fn heap_ids(&self) -> Vec<HeapId> {
        let mut ids: Vec<HeapId> = self.heaps.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered heaps.
    pub fn heap_count(&self) -> usize {
        self.heaps.len()
    }

    /// Whether the heap is draining.
    pub fn is_pending_deletion(&self, id: HeapId) -> bool {
        self.pending_deletion.contains(&id)
    }

    /// Sum of the sizes of every registered heap.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Number of blocks and bytes in a state.
    pub fn block_stats(&self, state: BlockState) -> ListStats {
        self.arena.stats(state)
    }

    /// Number of blocks in a state.
    pub fn block_count(&self, state: BlockState) -> usize {
        self.arena.stats(state).count
    }

    /// The manager options.
    pub fn options(&self) -> &MemoryBlockManagerOptions {
        &self.options
    }

    /// The resource backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the current memory usage.
    pub fn memory_usage(&self) -> MemoryUsage {
        let allocated = self.arena.stats(BlockState::Allocated);
        let submitted = self.arena.stats(BlockState::Submitted);
        let bytes_retiring = self
            .pending_deletion
            .iter()
            .filter_map(|id| self.heap(*id))
            .map(|heap| heap.size())
            .sum();

        MemoryUsage {
            number_allocs: (allocated.count + submitted.count) as u64,
            bytes_in_use: allocated.size + submitted.size,
            bytes_free: self.arena.stats(BlockState::Free).size,
            bytes_reserved: self.total_size,
            bytes_retiring,
        }
    }

    /// Print out a report of the current memory usage.
    pub fn print_memory_usage(&self) {
        log::info!("{}", self.memory_usage());
    }

    /// Check the consistency of every heap chain and state list.
    pub fn validate(&self) -> Result<()> {
        let mut chained = 0;

        for (id, entry) in self.heaps.iter() {
            let heap = &entry.heap;
            let mut prev = None;
            let mut end = 0;
            let mut consumed = 0;

            for key in self.arena.chain(entry.sentinel) {
                let node = self.arena.node(key);
                if node.heap != Some(*id) || node.prev != prev {
                    return Err(HeapError::internal(format!(
                        "Block {key:?} is chained in heap {id} it doesn't belong to"
                    )));
                }

                if key == entry.sentinel {
                    if !node.is_sentinel() || node.is_linked() {
                        return Err(HeapError::internal(format!(
                            "Heap {id} sentinel is corrupted"
                        )));
                    }
                } else {
                    if node.offset != end {
                        return Err(HeapError::internal(format!(
                            "Heap {id} has a gap or overlap at offset {end}"
                        )));
                    }
                    if node.list != Some(node.state) {
                        return Err(HeapError::internal(format!(
                            "Block {key:?} in state {:?} is linked in {:?}",
                            node.state, node.list
                        )));
                    }
                    end += node.size;
                    chained += 1;
                    if node.state.is_consuming() {
                        consumed += node.size;
                    }
                }

                prev = Some(key);
            }

            if end != heap.size() || consumed != heap.used() {
                return Err(HeapError::internal(format!(
                    "Heap {id} accounting is off: blocks span {end} and hold {consumed}, \
                     heap has {} bytes with {} used",
                    heap.size(),
                    heap.used()
                )));
            }
        }

        let mut linked = 0;
        for state in BlockState::ALL {
            let mut stats = ListStats::default();
            let mut last = 0;

            for key in self.arena.iter(state) {
                let node = self.arena.node(key);
                if node.state != state || node.list != Some(state) {
                    return Err(HeapError::internal(format!(
                        "Block {key:?} in state {:?} is in the {state:?} list",
                        node.state
                    )));
                }
                if state == BlockState::Free {
                    if node.size < last {
                        return Err(HeapError::internal("Free list isn't sorted by size"));
                    }
                    last = node.size;
                }
                stats.count += 1;
                stats.size += node.size;
            }

            if stats != self.arena.stats(state) {
                return Err(HeapError::internal(format!(
                    "{state:?} list statistics are off"
                )));
            }
            if state != BlockState::Pool {
                linked += stats.count;
            }
        }

        let pooled = self.arena.stats(BlockState::Pool).count;
        if linked != chained || pooled + chained + self.heaps.len() != self.arena.len() {
            return Err(HeapError::internal(
                "Some blocks are neither pooled nor chained in a heap",
            ));
        }

        Ok(())
    }

    fn is_space_available(
        &self,
        sizes: &[u64],
        order: &[usize],
        heap_affinity: Option<HeapId>,
    ) -> Result<()> {
        let mut free: Vec<u64> = self
            .arena
            .iter(BlockState::Free)
            .map(|key| self.arena.node(key))
            .filter(|node| heap_affinity.is_none_or(|heap| node.heap == Some(heap)))
            .map(|node| node.size)
            .collect();

        let mut needed = 0;
        let mut splits = 0;
        for index in order {
            let size = sizes[*index];
            let position = free.partition_point(|free| *free < size);
            if position == free.len() {
                needed += size;
                continue;
            }

            let remainder = free.remove(position) - size;
            if remainder > 0 {
                splits += 1;
                let position = free.partition_point(|free| *free < remainder);
                free.insert(position, remainder);
            }
        }

        if needed > 0 {
            log::warn!("Not enough space for the requested blocks, {needed} bytes missing");
            return Err(HeapError::NotEnoughSpace { needed });
        }
        if splits > self.arena.pool_capacity() {
            return Err(HeapError::BlockPoolExhausted {
                max: self.arena.max_count(),
            });
        }

        Ok(())
    }

    fn complete_heap_deletion(&mut self) -> Result<()> {
        let mut index = 0;

        while index < self.pending_deletion.len() {
            let id = self.pending_deletion[index];
            let entry = self
                .heaps
                .get(&id)
                .ok_or_else(|| HeapError::internal(format!("Pending heap {id} is unknown")))?;
            if entry.heap.used() > 0 {
                index += 1;
                continue;
            }

            let sentinel = entry.sentinel;
            let blocks: Vec<BlockKey> = self.arena.chain(sentinel).skip(1).collect();
            if let Some(key) = blocks
                .iter()
                .find(|key| self.arena.node(**key).state != BlockState::Deleted)
            {
                return Err(HeapError::internal(format!(
                    "Block {key:?} of drained heap {id} isn't deleted"
                )));
            }

            self.pending_deletion.swap_remove(index);
            let mut entry = self
                .heaps
                .remove(&id)
                .ok_or_else(|| HeapError::internal(format!("Pending heap {id} is unknown")))?;

            for key in blocks {
                self.arena.detach(key)?;
                self.arena.pool(key)?;
            }
            let node = self.arena.node_mut(sentinel);
            node.is_static = false;
            node.state = BlockState::Deleted;
            self.arena.pool(sentinel)?;

            let size = entry.heap.size();
            entry.heap.destroy(&mut self.backend)?;
            self.total_size -= size;
            self.logger
                .heap(format_args!("Heap {id} deleted, {size} bytes released"));
        }

        Ok(())
    }

    fn resolve(&self, block: &MemoryBlock) -> Result<BlockKey> {
        if !block.is_valid() {
            return Err(HeapError::invalid("Memory block handle was invalidated"));
        }

        match self.arena.get(block.key) {
            Some(node)
                if node.generation == block.generation
                    && node.state != BlockState::Pool
                    && node.heap == Some(block.heap_id())
                    && node.offset == block.offset() =>
            {
                Ok(block.key)
            }
            _ => Err(HeapError::invalid(format!(
                "Stale handle on block at {} of heap {}",
                block.offset(),
                block.heap_id()
            ))),
        }
    }

    fn data_range(
        &self,
        block: &MemoryBlock,
        offset: u64,
        size: u64,
        write: bool,
    ) -> Result<(HeapId, u64)> {
        let key = self.resolve(block)?;
        let node = self.arena.node(key);

        if write && node.state != BlockState::Allocated {
            return Err(HeapError::invalid(format!(
                "Data can only be written to allocated blocks, block is {:?}",
                node.state
            )));
        }
        if offset.checked_add(size).is_none_or(|end| end > node.size) {
            return Err(HeapError::invalid(format!(
                "Range [{offset}, +{size}) exceeds block of {} bytes",
                node.size
            )));
        }

        Ok((self.heap_of(key)?, node.offset + offset))
    }

    fn heap_of(&self, key: BlockKey) -> Result<HeapId> {
        self.arena
            .node(key)
            .heap
            .ok_or_else(|| HeapError::internal(format!("Block {key:?} has no heap")))
    }
}

fn unknown_heap(id: HeapId) -> HeapError {
    HeapError::internal(format!("Heap {id} is unknown"))
}

impl<B: ResourceBackend> Drop for MemoryBlockManager<B> {
    fn drop(&mut self) {
        for (id, entry) in self.heaps.iter_mut() {
            if let Err(err) = entry.heap.destroy(&mut self.backend) {
                log::warn!("Failed to release heap {id}: {err}");
            }
        }
    }
}

impl<B: ResourceBackend> core::fmt::Debug for MemoryBlockManager<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(
            format!(
                "MemoryBlockManager {:?} ({} heaps, {} bytes)",
                core::any::type_name::<B>(),
                self.heaps.len(),
                self.total_size
            )
            .as_str(),
        )
    }
}
