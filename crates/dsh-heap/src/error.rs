use alloc::format;
use alloc::string::String;
use thiserror::Error;

/// Result type of every fallible heap operation.
pub type Result<T> = core::result::Result<T, HeapError>;

/// Error returned by the heap manager and its collaborators.
#[derive(Error, Clone)]
pub enum HeapError {
    /// A precondition on the arguments or on the current state was violated.
    #[error("Invalid parameter\nCaused by:\n  {reason}\nBacktrace:\n{backtrace}")]
    InvalidParameter {
        /// What was wrong.
        reason: String,
        /// The captured backtrace.
        backtrace: BackTrace,
    },

    /// The free blocks can't hold the requested batch.
    #[error("Not enough space, {needed} more bytes are required")]
    NotEnoughSpace {
        /// The shortfall in bytes.
        needed: u64,
    },

    /// A tracker slot index is out of range, or no tracker slot is left.
    #[error("Tracker slot {index} is unavailable")]
    NotEnoughBuffer {
        /// The offending slot index.
        index: u32,
    },

    /// The block node pool reached its maximum number of nodes.
    #[error("Block pool exhausted, {max} nodes already in use")]
    BlockPoolExhausted {
        /// The configured maximum.
        max: usize,
    },

    /// Completion can't be checked because no tracker is registered.
    #[error("No tracker registered")]
    MissingTracker,

    /// The heap has no backing resource.
    #[error("Heap {heap} has no backing resource")]
    MissingResource {
        /// The heap id.
        heap: u32,
    },

    /// The resource backend failed.
    #[error("Resource backend failure: {description}")]
    Backend {
        /// Backend provided details.
        description: String,
    },

    /// An internal invariant was broken.
    #[error("Internal error\nCaused by:\n  {description}\nBacktrace:\n{backtrace}")]
    Internal {
        /// What broke.
        description: String,
        /// The captured backtrace.
        backtrace: BackTrace,
    },
}

impl HeapError {
    /// Creates an [invalid parameter](HeapError::InvalidParameter) error.
    pub fn invalid<R: Into<String>>(reason: R) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
            backtrace: BackTrace::capture(),
        }
    }

    /// Creates an [internal](HeapError::Internal) error.
    pub fn internal<R: Into<String>>(description: R) -> Self {
        Self::Internal {
            description: description.into(),
            backtrace: BackTrace::capture(),
        }
    }

    /// Creates a [backend](HeapError::Backend) error.
    pub fn backend<R: Into<String>>(description: R) -> Self {
        Self::Backend {
            description: description.into(),
        }
    }

    /// Whether the error belongs to the out-of-space class.
    pub fn is_not_enough_space(&self) -> bool {
        matches!(
            self,
            Self::NotEnoughSpace { .. } | Self::BlockPoolExhausted { .. }
        )
    }

    /// Whether the caller can retry after reclaiming or adding memory.
    pub fn is_recoverable(&self) -> bool {
        self.is_not_enough_space() || matches!(self, Self::NotEnoughBuffer { .. })
    }
}

impl core::fmt::Debug for HeapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}

/// Backtrace captured when an error is built, if enabled through `RUST_BACKTRACE`.
#[derive(Clone, Default)]
pub struct BackTrace {
    frames: Option<String>,
}

impl BackTrace {
    /// Captures the current thread's backtrace.
    pub fn capture() -> Self {
        #[cfg(feature = "std")]
        {
            let backtrace = std::backtrace::Backtrace::capture();
            if let std::backtrace::BacktraceStatus::Captured = backtrace.status() {
                return Self {
                    frames: Some(format!("{backtrace}")),
                };
            }
        }

        Self::default()
    }
}

impl core::fmt::Debug for BackTrace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

impl core::fmt::Display for BackTrace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.frames {
            Some(frames) => f.write_str(frames),
            None => f.write_str("  <not captured, set RUST_BACKTRACE=1>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_space_class() {
        assert!(HeapError::NotEnoughSpace { needed: 64 }.is_not_enough_space());
        assert!(HeapError::BlockPoolExhausted { max: 8 }.is_not_enough_space());
        assert!(!HeapError::MissingTracker.is_not_enough_space());
        assert!(!HeapError::invalid("nope").is_recoverable());
        assert!(HeapError::NotEnoughBuffer { index: 64 }.is_recoverable());
    }

    #[test]
    fn reason_is_displayed() {
        let err = HeapError::invalid("block size can't be zero");
        let message = format!("{err}");

        assert!(message.contains("block size can't be zero"));
    }
}
