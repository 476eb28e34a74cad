use core::fmt::Arguments;

use crate::config::logger::{AllocLogLevel, LoggerConfig};

/// Logger of the block manager.
///
/// Records go through the `log` facade, the configured [level](AllocLogLevel) decides which
/// events are reported.
#[derive(Debug, Clone)]
pub struct AllocLogger {
    kind: AllocLoggerKind,
}

#[derive(Debug, Clone)]
enum AllocLoggerKind {
    /// Log heap events at the given level.
    Heaps(log::Level),
    /// Log heap events at the given level and block transitions as traces.
    All(log::Level),
    /// Don't log information.
    None,
}

impl AllocLogger {
    /// Create a logger from its configuration.
    pub fn new(config: &LoggerConfig) -> Self {
        let level = config.log.into();
        let kind = match config.level {
            AllocLogLevel::Disabled => AllocLoggerKind::None,
            AllocLogLevel::Basic => AllocLoggerKind::Heaps(level),
            AllocLogLevel::Full => AllocLoggerKind::All(level),
        };

        Self { kind }
    }

    /// Returns true if block transitions are logged.
    pub fn blocks_activated(&self) -> bool {
        matches!(self.kind, AllocLoggerKind::All(_))
    }

    /// Log a heap lifecycle event.
    pub fn heap(&self, args: Arguments<'_>) {
        match self.kind {
            AllocLoggerKind::Heaps(level) | AllocLoggerKind::All(level) => {
                log::log!(target: "dsh_heap::heap", level, "{args}");
            }
            AllocLoggerKind::None => {}
        }
    }

    /// Log a block transition.
    pub fn block(&self, args: Arguments<'_>) {
        if let AllocLoggerKind::All(_) = self.kind {
            log::trace!(target: "dsh_heap::block", "{args}");
        }
    }
}
