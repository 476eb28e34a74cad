#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! Dynamic state heap crate that sub-allocates GPU-visible memory blocks whose reuse is gated by
//! hardware completion trackers.

extern crate alloc;

#[macro_use]
extern crate derive_new;

mod id;

/// Global configuration.
pub mod config;
/// Errors returned by every fallible operation.
pub mod error;
/// Backing buffers blocks are carved from.
pub mod heap;
/// Allocator logging.
pub mod logging;
/// Block management module.
pub mod memory_management;
/// Resource backend module.
pub mod storage;
/// Hardware completion trackers.
pub mod tracker;

pub use error::{HeapError, Result};
pub use id::HeapId;
