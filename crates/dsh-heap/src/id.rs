#[macro_export(local_inner_macros)]
/// Create a new resource ID type backed by a process wide counter.
macro_rules! resource_id_type {
    ($name:ident) => {
        /// Resource ID.
        #[derive(Copy, Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
        pub struct $name {
            value: u64,
        }

        impl $name {
            /// Create a new ID.
            pub fn new() -> Self {
                use core::sync::atomic::{AtomicU64, Ordering};

                static COUNTER: AtomicU64 = AtomicU64::new(0);

                let value = COUNTER.fetch_add(1, Ordering::Relaxed);
                if value == u64::MAX {
                    core::panic!("Resource ID overflowed");
                }
                Self { value }
            }

            /// The raw value of the ID.
            pub fn value(&self) -> u64 {
                self.value
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// Identifier of a heap, chosen by the caller when registering it.
pub type HeapId = u32;

/// Index of a node inside the block arena.
#[derive(Copy, Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub(crate) struct BlockKey(pub(crate) u32);

impl BlockKey {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    resource_id_type!(TestId);

    #[test]
    fn ids_are_unique() {
        let first = TestId::new();
        let second = TestId::new();

        assert_ne!(first, second);
        assert!(second.value() > first.value());
    }
}
