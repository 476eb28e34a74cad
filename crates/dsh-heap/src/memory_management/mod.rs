mod arena;
mod block;
mod memory_block;

mod base;

pub use arena::ListStats;
pub use base::*;
pub use block::BlockState;
pub use memory_block::*;

/// Tracker driven block management.
mod memory_manage;
pub use memory_manage::*;
