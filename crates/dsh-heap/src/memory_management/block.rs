use crate::HeapId;
use crate::id::BlockKey;
use crate::tracker::FrameTrackerToken;

/// State of a block node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockState {
    /// Unused node, not bound to any heap.
    Pool,
    /// Available for allocation.
    Free,
    /// Handed out, being written by the CPU.
    Allocated,
    /// Referenced by submitted GPU work.
    Submitted,
    /// Released from a draining heap.
    Deleted,
}

impl BlockState {
    /// Every state, in list order.
    pub const ALL: [BlockState; 5] = [
        BlockState::Pool,
        BlockState::Free,
        BlockState::Allocated,
        BlockState::Submitted,
        BlockState::Deleted,
    ];

    pub(crate) fn list_index(self) -> usize {
        match self {
            BlockState::Pool => 0,
            BlockState::Free => 1,
            BlockState::Allocated => 2,
            BlockState::Submitted => 3,
            BlockState::Deleted => 4,
        }
    }

    /// Whether a block in this state holds heap space.
    pub fn is_consuming(self) -> bool {
        matches!(self, BlockState::Allocated | BlockState::Submitted)
    }
}

/// A node describing a range of one heap.
///
/// Nodes of a heap are chained in offset order through `prev` and `next`, starting with a zero
/// sized static sentinel. Independently, every node but the sentinels is linked into the list of
/// its state through `state_prev` and `state_next`.
#[derive(Debug)]
pub(crate) struct BlockNode {
    pub(crate) heap: Option<HeapId>,
    pub(crate) offset: u64,
    pub(crate) size: u64,
    pub(crate) state: BlockState,
    pub(crate) is_static: bool,
    pub(crate) tracker_id: u32,
    pub(crate) token: FrameTrackerToken,
    pub(crate) prev: Option<BlockKey>,
    pub(crate) next: Option<BlockKey>,
    pub(crate) state_prev: Option<BlockKey>,
    pub(crate) state_next: Option<BlockKey>,
    pub(crate) list: Option<BlockState>,
    pub(crate) generation: u32,
}

impl BlockNode {
    pub(crate) fn pooled() -> Self {
        Self {
            heap: None,
            offset: 0,
            size: 0,
            state: BlockState::Pool,
            is_static: false,
            tracker_id: 0,
            token: FrameTrackerToken::default(),
            prev: None,
            next: None,
            state_prev: None,
            state_next: None,
            list: None,
            generation: 0,
        }
    }

    /// Strip every heap association. The generation moves on so stale handles are detected.
    pub(crate) fn reset(&mut self) {
        self.heap = None;
        self.offset = 0;
        self.size = 0;
        self.state = BlockState::Pool;
        self.is_static = false;
        self.tracker_id = 0;
        self.token = FrameTrackerToken::default();
        self.prev = None;
        self.next = None;
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn is_linked(&self) -> bool {
        self.list.is_some()
    }

    pub(crate) fn is_sentinel(&self) -> bool {
        self.is_static && self.size == 0 && self.prev.is_none() && self.heap.is_some()
    }
}
