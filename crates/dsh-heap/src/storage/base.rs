use core::ptr::NonNull;

use crate::error::Result;

crate::resource_id_type!(ResourceId);

/// A graphics resource allocated by a [backend](ResourceBackend).
#[derive(new, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    /// Resource id.
    pub id: ResourceId,
    /// Size of the resource in bytes.
    pub size: u64,
}

/// Allocates graphics resources and maps them for CPU access.
///
/// # Safety
///
/// The pointer returned by [lock](ResourceBackend::lock) must stay valid for reads and writes of
/// `handle.size` bytes until the matching [unlock](ResourceBackend::unlock) or
/// [free](ResourceBackend::free), and must not be handed out to anything else in the meantime.
pub unsafe trait ResourceBackend: Send {
    /// Allocates a resource of `size` bytes. Write-only resources can only be written by the
    /// hardware and never mapped.
    fn allocate(&mut self, size: u64, hw_write_only: bool) -> Result<ResourceHandle>;

    /// Maps the resource for CPU access.
    fn lock(&mut self, handle: &ResourceHandle) -> Result<NonNull<u8>>;

    /// Releases a mapping returned by [lock](ResourceBackend::lock).
    fn unlock(&mut self, handle: &ResourceHandle) -> Result<()>;

    /// Releases the resource.
    fn free(&mut self, handle: ResourceHandle);
}
