mod base;

/// Logger configuration.
pub mod logger;
/// Block manager configuration.
pub mod memory;

pub use base::*;
