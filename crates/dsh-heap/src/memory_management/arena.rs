use super::block::{BlockNode, BlockState};
use crate::HeapId;
use crate::error::{HeapError, Result};
use crate::heap::Heap;
use crate::id::BlockKey;
use crate::tracker::{TRACKER_SLOTS, TrackerData};
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;

/// Number of blocks and bytes linked into a state list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListStats {
    /// Number of blocks.
    pub count: usize,
    /// Sum of the block sizes.
    pub size: u64,
}

#[derive(Debug, Default)]
struct StateList {
    head: Option<BlockKey>,
    tail: Option<BlockKey>,
    stats: ListStats,
}

/// Slab of block nodes with one intrusive list per state.
///
/// The free list is kept sorted by ascending size, the other lists are unordered. Nodes are
/// never deallocated; unused ones wait in the pool list, which grows on demand up to a maximum.
#[derive(Debug)]
pub(crate) struct BlockArena {
    nodes: Vec<BlockNode>,
    lists: [StateList; 5],
    increment: usize,
    max_count: usize,
}

impl BlockArena {
    pub(crate) fn new(initial_count: usize, increment: usize, max_count: usize) -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            lists: Default::default(),
            increment: increment.max(1),
            max_count,
        };
        arena.grow(initial_count);
        arena
    }

    pub(crate) fn node(&self, key: BlockKey) -> &BlockNode {
        &self.nodes[key.index()]
    }

    pub(crate) fn node_mut(&mut self, key: BlockKey) -> &mut BlockNode {
        &mut self.nodes[key.index()]
    }

    pub(crate) fn get(&self, key: BlockKey) -> Option<&BlockNode> {
        self.nodes.get(key.index())
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn max_count(&self) -> usize {
        self.max_count
    }

    pub(crate) fn stats(&self, state: BlockState) -> ListStats {
        self.lists[state.list_index()].stats
    }

    /// Walk the list of a state, from head to tail.
    pub(crate) fn iter(&self, state: BlockState) -> ListIter<'_> {
        ListIter {
            arena: self,
            cursor: self.lists[state.list_index()].head,
        }
    }

    /// Walk the nodes of a heap in offset order, starting at `first`.
    pub(crate) fn chain(&self, first: BlockKey) -> ChainIter<'_> {
        ChainIter {
            arena: self,
            cursor: Some(first),
        }
    }

    /// Nodes the pool can still provide, counting growth up to the maximum.
    pub(crate) fn pool_capacity(&self) -> usize {
        self.stats(BlockState::Pool).count + self.max_count.saturating_sub(self.nodes.len())
    }

    pub(crate) fn extend_pool(&mut self) -> Result<()> {
        match self.grow(self.increment) {
            0 => Err(HeapError::BlockPoolExhausted {
                max: self.max_count,
            }),
            count => {
                log::trace!("Block pool extended by {count} nodes");
                Ok(())
            }
        }
    }

    /// Unlink a node from the pool, growing the pool if it is empty.
    pub(crate) fn take_from_pool(&mut self) -> Result<BlockKey> {
        if self.lists[BlockState::Pool.list_index()].head.is_none() {
            self.extend_pool()?;
        }

        let key = self.lists[BlockState::Pool.list_index()]
            .head
            .ok_or_else(|| HeapError::internal("Block pool is empty after growing"))?;
        self.detach(key)?;
        Ok(key)
    }

    /// First free block holding at least `size` bytes, optionally restricted to one heap.
    pub(crate) fn find_free(&self, size: u64, heap: Option<HeapId>) -> Option<BlockKey> {
        self.iter(BlockState::Free).find(|key| {
            let node = self.node(*key);
            node.size >= size && heap.is_none_or(|heap| node.heap == Some(heap))
        })
    }

    /// Link a node into the list of its state.
    pub(crate) fn attach(&mut self, key: BlockKey, state: BlockState) -> Result<()> {
        let node = self.node(key);
        if node.is_linked() {
            return Err(HeapError::internal(format!(
                "Block {key:?} is already linked in {:?}",
                node.list
            )));
        }
        if node.state != state {
            return Err(HeapError::internal(format!(
                "Block {key:?} in state {:?} can't join the {state:?} list",
                node.state
            )));
        }

        let size = node.size;
        let list = state.list_index();
        let before = match state {
            BlockState::Free => self
                .iter(BlockState::Free)
                .find(|other| self.node(*other).size >= size),
            _ => self.lists[list].head,
        };
        self.link_before(key, before, list);

        let list = &mut self.lists[list];
        list.stats.count += 1;
        list.stats.size += size;
        self.node_mut(key).list = Some(state);

        Ok(())
    }

    /// Unlink a node from its state list.
    pub(crate) fn detach(&mut self, key: BlockKey) -> Result<()> {
        let node = self.node(key);
        let state = node
            .list
            .ok_or_else(|| HeapError::internal(format!("Block {key:?} isn't linked")))?;
        let (prev, next, size) = (node.state_prev, node.state_next, node.size);
        let list = state.list_index();

        match prev {
            Some(prev) => self.node_mut(prev).state_next = next,
            None => self.lists[list].head = next,
        }
        match next {
            Some(next) => self.node_mut(next).state_prev = prev,
            None => self.lists[list].tail = prev,
        }

        let node = self.node_mut(key);
        node.state_prev = None;
        node.state_next = None;
        node.list = None;

        let list = &mut self.lists[list];
        list.stats.count -= 1;
        list.stats.size -= size;

        Ok(())
    }

    /// Bind a pooled node to `[offset, offset + size)` of the heap, chained after `prev`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn create(
        &mut self,
        key: BlockKey,
        heap: &mut Heap,
        requested: BlockState,
        prev: Option<BlockKey>,
        offset: u64,
        size: u64,
        tracker_id: u32,
    ) -> Result<()> {
        let node = self.node(key);
        self.check_unlinked(key)?;
        match node.state {
            BlockState::Pool => {}
            BlockState::Deleted => {
                return Err(HeapError::invalid(
                    "A deleted block must go back to the pool before reuse",
                ));
            }
            state => {
                return Err(HeapError::invalid(format!(
                    "Block in state {state:?} is already bound to a heap"
                )));
            }
        }
        match requested {
            BlockState::Free => {}
            BlockState::Allocated if tracker_id != 0 => {}
            BlockState::Allocated => {
                return Err(HeapError::invalid(
                    "Allocated blocks need a tracker id",
                ));
            }
            state => {
                return Err(HeapError::invalid(format!(
                    "Blocks can't be created in state {state:?}"
                )));
            }
        }
        if heap.size() == 0 {
            return Err(HeapError::invalid(format!(
                "Heap {} has no backing resource",
                heap.id()
            )));
        }
        if offset.checked_add(size).is_none_or(|end| end > heap.size()) {
            return Err(HeapError::invalid(format!(
                "Block [{offset}, +{size}) exceeds heap {} of {} bytes",
                heap.id(),
                heap.size()
            )));
        }

        let next = match prev {
            Some(prev) => self.node_mut(prev).next.replace(key),
            None => None,
        };
        if let Some(next) = next {
            self.node_mut(next).prev = Some(key);
        }

        let node = self.node_mut(key);
        node.heap = Some(heap.id());
        node.offset = offset;
        node.size = size;
        node.prev = prev;
        node.next = next;
        node.state = BlockState::Free;

        match requested {
            BlockState::Allocated => self.allocate(key, heap, tracker_id),
            _ => Ok(()),
        }
    }

    /// Bind a pooled node as the zero sized static head of a heap chain.
    pub(crate) fn create_sentinel(&mut self, key: BlockKey, heap: &Heap) -> Result<()> {
        self.check_unlinked(key)?;
        let node = self.node_mut(key);
        if node.state != BlockState::Pool {
            return Err(HeapError::internal("Heap sentinel must come from the pool"));
        }

        node.heap = Some(heap.id());
        node.offset = 0;
        node.size = 0;
        node.is_static = true;
        node.state = BlockState::Allocated;
        Ok(())
    }

    /// Keep the first `size` bytes of a free block and move the rest to `tail`, a pooled node.
    pub(crate) fn split(
        &mut self,
        key: BlockKey,
        tail: BlockKey,
        heap: &mut Heap,
        size: u64,
    ) -> Result<()> {
        self.check_unlinked(key)?;
        let node = self.node(key);
        if node.state != BlockState::Free || node.is_static {
            return Err(HeapError::invalid(format!(
                "Only non-static free blocks can be split, got {:?}",
                node.state
            )));
        }
        if size == 0 || size >= node.size {
            return Err(HeapError::invalid(format!(
                "Can't split {size} bytes out of a block of {} bytes",
                node.size
            )));
        }

        let (offset, total) = (node.offset, node.size);
        self.create(
            tail,
            heap,
            BlockState::Free,
            Some(key),
            offset + size,
            total - size,
            0,
        )?;
        self.node_mut(key).size = size;

        log::trace!("Split block at {offset} into {size} + {}", total - size);
        Ok(())
    }

    /// Merge the adjacent free block `other` into `key`. `other` returns to the pool.
    pub(crate) fn combine(&mut self, key: BlockKey, other: BlockKey) -> Result<()> {
        self.check_unlinked(key)?;
        self.check_unlinked(other)?;
        let (node, absorbed) = (self.node(key), self.node(other));
        if node.state != BlockState::Free || absorbed.state != BlockState::Free {
            return Err(HeapError::invalid(format!(
                "Only free blocks can be combined, got {:?} and {:?}",
                node.state, absorbed.state
            )));
        }
        if node.is_static || absorbed.is_static {
            return Err(HeapError::invalid("Static blocks can't be combined"));
        }
        if node.heap != absorbed.heap {
            return Err(HeapError::invalid("Blocks of different heaps can't be combined"));
        }

        let (offset, size) = (absorbed.offset, absorbed.size);
        if node.next == Some(other) {
            let next = absorbed.next;
            let node = self.node_mut(key);
            node.size += size;
            node.next = next;
            if let Some(next) = next {
                self.node_mut(next).prev = Some(key);
            }
        } else if node.prev == Some(other) {
            let prev = absorbed.prev;
            let node = self.node_mut(key);
            node.offset = offset;
            node.size += size;
            node.prev = prev;
            if let Some(prev) = prev {
                self.node_mut(prev).next = Some(key);
            }
        } else {
            return Err(HeapError::invalid("Only adjacent blocks can be combined"));
        }

        self.node_mut(other).reset();
        self.attach(other, BlockState::Pool)
    }

    /// Free to allocated. The block size is charged to the heap.
    pub(crate) fn allocate(&mut self, key: BlockKey, heap: &mut Heap, tracker_id: u32) -> Result<()> {
        self.check_unlinked(key)?;
        let node = self.node(key);
        if node.state != BlockState::Free {
            return Err(HeapError::invalid(format!(
                "Only free blocks can be allocated, got {:?}",
                node.state
            )));
        }
        if tracker_id == 0 && !node.is_static {
            return Err(HeapError::invalid(
                "Non-static blocks need a tracker id",
            ));
        }

        heap.adjust_used_space(signed(node.size)?)?;

        let node = self.node_mut(key);
        node.state = BlockState::Allocated;
        node.tracker_id = tracker_id;
        node.generation = node.generation.wrapping_add(1);
        Ok(())
    }

    /// Free to allocated, recording the tracker value in the block token.
    pub(crate) fn allocate_with_token(
        &mut self,
        key: BlockKey,
        heap: &mut Heap,
        index: u32,
        tracker_id: u32,
        producer: Arc<TrackerData>,
    ) -> Result<()> {
        if index as usize >= TRACKER_SLOTS {
            return Err(HeapError::NotEnoughBuffer { index });
        }

        self.allocate(key, heap, tracker_id)?;

        let token = &mut self.node_mut(key).token;
        token.set_producer(producer);
        if tracker_id != 0 {
            token.merge(index, tracker_id)?;
        }
        Ok(())
    }

    /// Allocated to submitted.
    pub(crate) fn submit(&mut self, key: BlockKey) -> Result<()> {
        self.check_unlinked(key)?;
        let node = self.node_mut(key);
        if node.state != BlockState::Allocated || node.is_static {
            return Err(HeapError::invalid(format!(
                "Only non-static allocated blocks can be submitted, got {:?}",
                node.state
            )));
        }

        node.state = BlockState::Submitted;
        Ok(())
    }

    /// Back to free, returning the block size to the heap if it held space.
    pub(crate) fn free(&mut self, key: BlockKey, heap: &mut Heap) -> Result<()> {
        self.check_unlinked(key)?;
        let node = self.node(key);
        if node.is_static {
            return Err(HeapError::invalid("Static blocks can't be freed"));
        }
        match node.state {
            BlockState::Allocated | BlockState::Submitted => {
                heap.adjust_used_space(-signed(node.size)?)?
            }
            BlockState::Free => {}
            state => {
                return Err(HeapError::invalid(format!(
                    "Blocks in state {state:?} can't be freed"
                )));
            }
        }

        self.release(key, BlockState::Free);
        Ok(())
    }

    /// Release a block of a draining heap, returning its space first if it held any.
    pub(crate) fn delete(&mut self, key: BlockKey, heap: &mut Heap) -> Result<()> {
        self.check_unlinked(key)?;
        let node = self.node(key);
        if node.is_static {
            return Err(HeapError::invalid("Static blocks can't be deleted"));
        }
        if !heap.is_free_in_progress() {
            return Err(HeapError::invalid(format!(
                "Heap {} isn't being freed",
                heap.id()
            )));
        }
        match node.state {
            BlockState::Allocated | BlockState::Submitted => {
                heap.adjust_used_space(-signed(node.size)?)?
            }
            BlockState::Free => {}
            state => {
                return Err(HeapError::invalid(format!(
                    "Blocks in state {state:?} can't be deleted"
                )));
            }
        }

        self.release(key, BlockState::Deleted);
        Ok(())
    }

    /// Return a free or deleted node to the pool. The caller unchains it from its heap first.
    pub(crate) fn pool(&mut self, key: BlockKey) -> Result<()> {
        self.check_unlinked(key)?;
        let node = self.node_mut(key);
        if node.is_static {
            return Err(HeapError::invalid("Static blocks can't be pooled"));
        }
        if !matches!(node.state, BlockState::Free | BlockState::Deleted) {
            return Err(HeapError::invalid(format!(
                "Blocks in state {:?} can't be pooled",
                node.state
            )));
        }

        node.reset();
        self.attach(key, BlockState::Pool)
    }

    /// Merge an unlinked free block with its free neighbours, left first.
    pub(crate) fn coalesce(&mut self, key: BlockKey) -> Result<()> {
        if let Some(prev) = self.node(key).prev
            && self.is_mergeable(prev)
        {
            self.detach(prev)?;
            self.combine(key, prev)?;
        }
        if let Some(next) = self.node(key).next
            && self.is_mergeable(next)
        {
            self.detach(next)?;
            self.combine(key, next)?;
        }
        Ok(())
    }

    fn is_mergeable(&self, key: BlockKey) -> bool {
        let node = self.node(key);
        node.state == BlockState::Free && !node.is_static && node.list == Some(BlockState::Free)
    }

    // Reclaimed blocks no longer belong to their client, so outstanding handles go stale.
    fn release(&mut self, key: BlockKey, state: BlockState) {
        let node = self.node_mut(key);
        node.state = state;
        node.tracker_id = 0;
        node.token.clear();
        node.generation = node.generation.wrapping_add(1);
    }

    fn check_unlinked(&self, key: BlockKey) -> Result<()> {
        match self.node(key).list {
            None => Ok(()),
            Some(state) => Err(HeapError::internal(format!(
                "Block {key:?} is mutated while linked in the {state:?} list"
            ))),
        }
    }

    fn grow(&mut self, count: usize) -> usize {
        let count = count.min(self.max_count.saturating_sub(self.nodes.len()));
        for _ in 0..count {
            let key = BlockKey(self.nodes.len() as u32);
            self.nodes.push(BlockNode::pooled());
            let head = self.lists[BlockState::Pool.list_index()].head;
            self.link_before(key, head, BlockState::Pool.list_index());
            self.lists[BlockState::Pool.list_index()].stats.count += 1;
            self.node_mut(key).list = Some(BlockState::Pool);
        }
        count
    }

    fn link_before(&mut self, key: BlockKey, before: Option<BlockKey>, list: usize) {
        match before {
            Some(next) => {
                let prev = self.node(next).state_prev;
                let node = self.node_mut(key);
                node.state_prev = prev;
                node.state_next = Some(next);
                self.node_mut(next).state_prev = Some(key);
                match prev {
                    Some(prev) => self.node_mut(prev).state_next = Some(key),
                    None => self.lists[list].head = Some(key),
                }
            }
            None => {
                let prev = self.lists[list].tail;
                let node = self.node_mut(key);
                node.state_prev = prev;
                node.state_next = None;
                match prev {
                    Some(prev) => self.node_mut(prev).state_next = Some(key),
                    None => self.lists[list].head = Some(key),
                }
                self.lists[list].tail = Some(key);
            }
        }
    }
}

fn signed(size: u64) -> Result<i64> {
    i64::try_from(size).map_err(|_| HeapError::invalid(format!("Block of {size} bytes is too big")))
}

pub(crate) struct ListIter<'a> {
    arena: &'a BlockArena,
    cursor: Option<BlockKey>,
}

impl Iterator for ListIter<'_> {
    type Item = BlockKey;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        self.cursor = self.arena.node(key).state_next;
        Some(key)
    }
}

pub(crate) struct ChainIter<'a> {
    arena: &'a BlockArena,
    cursor: Option<BlockKey>,
}

impl Iterator for ChainIter<'_> {
    type Item = BlockKey;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        self.cursor = self.arena.node(key).next;
        Some(key)
    }
}

#[cfg(all(test, feature = "storage-bytes"))]
mod tests {
    use super::*;
    use crate::storage::BytesBackend;

    struct Fixture {
        _backend: BytesBackend,
        heap: Heap,
        arena: BlockArena,
        sentinel: BlockKey,
        first: BlockKey,
    }

    fn fixture(heap_size: u64) -> Fixture {
        let mut backend = BytesBackend::default();
        let mut heap = Heap::new(0);
        heap.allocate(&mut backend, heap_size, false, false).unwrap();

        let mut arena = BlockArena::new(4, 4, 16);
        let sentinel = arena.take_from_pool().unwrap();
        arena.create_sentinel(sentinel, &heap).unwrap();
        let first = arena.take_from_pool().unwrap();
        arena
            .create(first, &mut heap, BlockState::Free, Some(sentinel), 0, heap_size, 0)
            .unwrap();

        Fixture {
            _backend: backend,
            heap,
            arena,
            sentinel,
            first,
        }
    }

    fn free_sizes(arena: &BlockArena) -> Vec<u64> {
        arena
            .iter(BlockState::Free)
            .map(|key| arena.node(key).size)
            .collect()
    }

    #[test]
    fn free_list_is_sorted_ascending() {
        let Fixture {
            mut heap,
            mut arena,
            first,
            ..
        } = fixture(4096);

        let second = arena.take_from_pool().unwrap();
        arena.split(first, second, &mut heap, 1024).unwrap();
        let third = arena.take_from_pool().unwrap();
        arena.split(second, third, &mut heap, 2048).unwrap();

        arena.attach(second, BlockState::Free).unwrap();
        arena.attach(first, BlockState::Free).unwrap();
        arena.attach(third, BlockState::Free).unwrap();

        assert_eq!(free_sizes(&arena), [1024, 1024, 2048]);
        assert_eq!(arena.stats(BlockState::Free).size, 4096);
    }

    #[test]
    fn split_then_combine_restores_the_block() {
        let Fixture {
            mut heap,
            mut arena,
            sentinel,
            first,
            ..
        } = fixture(4096);
        let pooled = arena.stats(BlockState::Pool).count;

        let tail = arena.take_from_pool().unwrap();
        arena.split(first, tail, &mut heap, 100).unwrap();

        assert_eq!(arena.node(tail).offset, 100);
        assert_eq!(arena.node(tail).size, 3996);
        assert_eq!(arena.node(first).next, Some(tail));
        assert_eq!(arena.node(tail).prev, Some(first));

        arena.combine(tail, first).unwrap();

        assert_eq!(arena.node(tail).offset, 0);
        assert_eq!(arena.node(tail).size, 4096);
        assert_eq!(arena.node(sentinel).next, Some(tail));
        assert_eq!(arena.node(first).state, BlockState::Pool);
        assert_eq!(arena.stats(BlockState::Pool).count, pooled);
    }

    #[test]
    fn split_rejects_degenerate_sizes() {
        let Fixture {
            mut heap,
            mut arena,
            first,
            ..
        } = fixture(4096);
        let tail = arena.take_from_pool().unwrap();

        assert!(arena.split(first, tail, &mut heap, 0).is_err());
        assert!(arena.split(first, tail, &mut heap, 4096).is_err());
    }

    #[test]
    fn combine_requires_adjacency() {
        let Fixture {
            mut heap,
            mut arena,
            first,
            ..
        } = fixture(4096);
        let second = arena.take_from_pool().unwrap();
        arena.split(first, second, &mut heap, 1024).unwrap();
        let third = arena.take_from_pool().unwrap();
        arena.split(second, third, &mut heap, 1024).unwrap();

        assert!(arena.combine(first, third).is_err());
    }

    #[test]
    fn state_machine_accounts_heap_space() {
        let Fixture {
            mut heap,
            mut arena,
            first,
            ..
        } = fixture(4096);

        assert!(arena.allocate(first, &mut heap, 0).is_err());
        arena.allocate(first, &mut heap, 1).unwrap();
        assert_eq!(heap.used(), 4096);

        assert!(arena.pool(first).is_err());
        arena.submit(first).unwrap();
        arena.free(first, &mut heap).unwrap();

        assert_eq!(heap.used(), 0);
        assert_eq!(arena.node(first).tracker_id, 0);
    }

    #[test]
    fn reclaiming_moves_the_generation() {
        let Fixture {
            mut heap,
            mut arena,
            first,
            ..
        } = fixture(4096);

        arena.allocate(first, &mut heap, 1).unwrap();
        let allocated = arena.node(first).generation;
        arena.submit(first).unwrap();
        arena.free(first, &mut heap).unwrap();
        assert_ne!(arena.node(first).generation, allocated);

        arena.allocate(first, &mut heap, 2).unwrap();
        let allocated = arena.node(first).generation;
        heap.prepare_for_free();
        arena.delete(first, &mut heap).unwrap();
        assert_ne!(arena.node(first).generation, allocated);
    }

    #[test]
    fn delete_requires_draining_heap() {
        let Fixture {
            mut heap,
            mut arena,
            first,
            ..
        } = fixture(4096);
        arena.allocate(first, &mut heap, 1).unwrap();

        assert!(arena.delete(first, &mut heap).is_err());

        heap.prepare_for_free();
        arena.delete(first, &mut heap).unwrap();

        assert_eq!(heap.used(), 0);
        assert!(arena.free(first, &mut heap).is_err());
        assert!(
            arena
                .create(first, &mut heap, BlockState::Free, None, 0, 64, 0)
                .is_err()
        );
    }

    #[test]
    fn static_blocks_are_pinned() {
        let Fixture {
            mut heap,
            mut arena,
            first,
            ..
        } = fixture(4096);
        arena.node_mut(first).is_static = true;
        arena.allocate(first, &mut heap, 0).unwrap();

        assert!(arena.submit(first).is_err());
        assert!(arena.free(first, &mut heap).is_err());
        heap.prepare_for_free();
        assert!(arena.delete(first, &mut heap).is_err());
    }

    #[test]
    fn linked_nodes_are_never_mutated() {
        let Fixture {
            mut heap,
            mut arena,
            first,
            ..
        } = fixture(4096);
        arena.attach(first, BlockState::Free).unwrap();

        assert!(matches!(
            arena.allocate(first, &mut heap, 1),
            Err(HeapError::Internal { .. })
        ));
        assert!(arena.attach(first, BlockState::Free).is_err());
    }

    #[test]
    fn pool_grows_up_to_its_maximum() {
        let mut arena = BlockArena::new(2, 3, 6);
        assert_eq!(arena.pool_capacity(), 6);

        let taken: Vec<_> = (0..6).map(|_| arena.take_from_pool().unwrap()).collect();
        assert_eq!(arena.len(), 6);
        assert_eq!(taken.len(), 6);

        assert!(matches!(
            arena.take_from_pool(),
            Err(HeapError::BlockPoolExhausted { max: 6 })
        ));
    }

    #[test]
    fn create_rejects_out_of_range() {
        let Fixture {
            mut heap,
            mut arena,
            ..
        } = fixture(4096);
        let key = arena.take_from_pool().unwrap();

        assert!(
            arena
                .create(key, &mut heap, BlockState::Free, None, 4000, 200, 0)
                .is_err()
        );
        assert!(
            arena
                .create(key, &mut heap, BlockState::Submitted, None, 0, 64, 1)
                .is_err()
        );
    }
}
