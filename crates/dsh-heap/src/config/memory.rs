use super::logger::LoggerConfig;

/// Block manager settings.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MemoryConfig {
    /// Heap sizes are rounded up to a multiple of this value.
    #[serde(default = "page_size_default")]
    pub page_size: u64,

    /// Minimum alignment of every block.
    #[serde(default = "block_alignment_default")]
    pub block_alignment: u64,

    /// Number of submitted blocks above which acquiring rescans them first.
    #[serde(default = "refresh_threshold_default")]
    pub refresh_threshold: u32,

    /// Keep heaps mapped for their whole lifetime instead of mapping them on every access.
    #[serde(default = "lock_heaps_on_allocate_default")]
    pub lock_heaps_on_allocate: bool,

    /// Block nodes created upfront.
    #[serde(default = "pool_increment_default")]
    pub pool_initial_count: usize,

    /// Block nodes added each time the pool runs out.
    #[serde(default = "pool_increment_default")]
    pub pool_increment: usize,

    /// Maximum number of block nodes.
    #[serde(default = "pool_max_count_default")]
    pub pool_max_count: usize,

    /// Allocator logger.
    #[serde(default)]
    pub logger: LoggerConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            page_size: page_size_default(),
            block_alignment: block_alignment_default(),
            refresh_threshold: refresh_threshold_default(),
            lock_heaps_on_allocate: lock_heaps_on_allocate_default(),
            pool_initial_count: pool_increment_default(),
            pool_increment: pool_increment_default(),
            pool_max_count: pool_max_count_default(),
            logger: LoggerConfig::default(),
        }
    }
}

fn page_size_default() -> u64 {
    4096
}

fn block_alignment_default() -> u64 {
    64
}

fn refresh_threshold_default() -> u32 {
    128
}

fn lock_heaps_on_allocate_default() -> bool {
    true
}

fn pool_increment_default() -> usize {
    64
}

fn pool_max_count_default() -> usize {
    64 * 1024
}
