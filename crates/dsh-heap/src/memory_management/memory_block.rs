use crate::HeapId;
use crate::id::BlockKey;
use crate::storage::ResourceHandle;

/// Handle on a block returned by [acquire_space](super::MemoryBlockManager::acquire_space).
///
/// The handle is a snapshot taken when the block was acquired and doesn't follow later changes
/// of the block. It becomes stale once the block is reclaimed, which the manager detects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryBlock {
    pub(crate) valid: bool,
    pub(crate) key: BlockKey,
    pub(crate) generation: u32,
    heap: HeapId,
    resource: ResourceHandle,
    offset: u64,
    size: u64,
    tracker_id: u32,
    is_static: bool,
}

impl MemoryBlock {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        key: BlockKey,
        generation: u32,
        heap: HeapId,
        resource: ResourceHandle,
        offset: u64,
        size: u64,
        tracker_id: u32,
        is_static: bool,
    ) -> Self {
        Self {
            valid: true,
            key,
            generation,
            heap,
            resource,
            offset,
            size,
            tracker_id,
            is_static,
        }
    }

    /// Whether the handle can still be used.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The heap the block lives in.
    pub fn heap_id(&self) -> HeapId {
        self.heap
    }

    /// The resource backing the heap.
    pub fn resource(&self) -> &ResourceHandle {
        &self.resource
    }

    /// Offset of the block inside the heap.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Size of the block in bytes, after alignment.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Tracker value the block waits for, `0` when none.
    pub fn tracker_id(&self) -> u32 {
        self.tracker_id
    }

    /// Whether the block is pinned until explicitly cleared.
    pub fn is_static(&self) -> bool {
        self.is_static
    }
}
