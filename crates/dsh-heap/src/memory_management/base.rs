use crate::HeapId;
use crate::config::memory::MemoryConfig;
use crate::config::logger::LoggerConfig;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Amount of memory in use by the block manager, and the total reserved memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// The number of allocated and submitted blocks.
    pub number_allocs: u64,
    /// The number of bytes held by allocated and submitted blocks.
    pub bytes_in_use: u64,
    /// The number of bytes available in free blocks.
    pub bytes_free: u64,
    /// The total number of bytes of every registered heap.
    pub bytes_reserved: u64,
    /// The number of bytes of heaps waiting for their blocks to drain.
    pub bytes_retiring: u64,
}

fn bytes_format(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if bytes < 1000 {
        return format!("{bytes} B");
    }

    let mut unit = 0;
    let mut scale = 1000;
    while unit + 1 < UNITS.len() && bytes / scale >= 1000 {
        scale *= 1000;
        unit += 1;
    }

    let hundredths = (bytes as u128 * 100 / scale as u128) as u64;
    format!("{}.{:02} {}", hundredths / 100, hundredths % 100, UNITS[unit])
}

impl core::fmt::Display for MemoryUsage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let usage_percentage = match self.bytes_reserved {
            0 => 0,
            reserved => self.bytes_in_use * 100 / reserved,
        };

        writeln!(f, "Memory Usage Report:")?;
        writeln!(f, "  Number of allocations: {}", self.number_allocs)?;
        writeln!(f, "  Bytes in use: {}", bytes_format(self.bytes_in_use))?;
        writeln!(f, "  Bytes free: {}", bytes_format(self.bytes_free))?;
        writeln!(f, "  Bytes retiring: {}", bytes_format(self.bytes_retiring))?;
        writeln!(f, "  Total bytes reserved: {}", bytes_format(self.bytes_reserved))?;
        writeln!(f, "  Usage percentage: {usage_percentage}%")
    }
}

/// Options of a [block manager](super::MemoryBlockManager).
#[derive(Debug, Clone)]
pub struct MemoryBlockManagerOptions {
    /// Heap sizes are rounded up to a multiple of the page size.
    pub page_size: u64,
    /// Minimum block alignment. Requested alignments are rounded up to a multiple of it.
    pub block_alignment: u64,
    /// Submitted blocks are rescanned on acquire once their count exceeds this threshold.
    pub refresh_threshold: u32,
    /// Keep heaps mapped for their whole lifetime.
    pub lock_heaps_on_allocate: bool,
    /// Nodes created with the manager.
    pub pool_initial_count: usize,
    /// Nodes added each time the pool runs out.
    pub pool_increment: usize,
    /// Maximum number of nodes.
    pub pool_max_count: usize,
    /// Allocator logger settings.
    pub logger: LoggerConfig,
}

impl Default for MemoryBlockManagerOptions {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}

impl MemoryBlockManagerOptions {
    /// Creates the options from the memory configuration.
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            block_alignment: config.block_alignment.max(1),
            refresh_threshold: config.refresh_threshold,
            lock_heaps_on_allocate: config.lock_heaps_on_allocate,
            pool_initial_count: config.pool_initial_count,
            pool_increment: config.pool_increment,
            pool_max_count: config.pool_max_count,
            logger: config.logger.clone(),
        }
    }
}

/// A batch of blocks to acquire together.
#[derive(Debug, Clone)]
pub struct AcquireParams {
    /// Tracker value the blocks wait for once submitted.
    pub tracker_id: u32,
    /// Producer slot of the tracker value, when a producer is registered.
    pub tracker_index: Option<u32>,
    /// Requested sizes in bytes.
    pub block_sizes: Vec<u64>,
    /// Requested alignment in bytes.
    pub alignment: u64,
    /// Pin the blocks until they are explicitly cleared.
    pub is_static: bool,
    /// Place the whole batch in one heap.
    pub heap_affinity: Option<HeapId>,
}

impl AcquireParams {
    /// A batch of non-static blocks waiting on `tracker_id`.
    pub fn new(tracker_id: u32, block_sizes: Vec<u64>) -> Self {
        Self {
            tracker_id,
            tracker_index: None,
            block_sizes,
            alignment: 0,
            is_static: false,
            heap_affinity: None,
        }
    }

    /// Set the producer slot of the tracker value.
    pub fn tracker_index(mut self, index: u32) -> Self {
        self.tracker_index = Some(index);
        self
    }

    /// Set the alignment.
    pub fn alignment(mut self, alignment: u64) -> Self {
        self.alignment = alignment;
        self
    }

    /// Pin the blocks.
    pub fn static_blocks(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Restrict the batch to one heap.
    pub fn heap_affinity(mut self, heap: HeapId) -> Self {
        self.heap_affinity = Some(heap);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_formatted_with_units() {
        assert_eq!(bytes_format(512), "512 B");
        assert_eq!(bytes_format(4096), "4.09 KB");
        assert_eq!(bytes_format(1_500_000), "1.50 MB");
        assert_eq!(bytes_format(2_000_000_000), "2.00 GB");
    }

    #[test]
    fn usage_report_lists_every_counter() {
        let usage = MemoryUsage {
            number_allocs: 2,
            bytes_in_use: 1024,
            bytes_free: 3072,
            bytes_reserved: 4096,
            bytes_retiring: 0,
        };
        let report = format!("{usage}");

        assert!(report.contains("Number of allocations: 2"));
        assert!(report.contains("Usage percentage: 25%"));
    }
}
