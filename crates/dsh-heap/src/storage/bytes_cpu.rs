use super::{ResourceBackend, ResourceHandle, ResourceId};
use crate::error::{HeapError, Result};
use alloc::alloc::{Layout, alloc_zeroed, dealloc};
use alloc::format;
use core::ptr::NonNull;
use hashbrown::HashMap;

/// Host memory backend. Resources are plain heap allocations, which makes it suited for tests
/// and for running the allocator without a device.
#[derive(Default)]
pub struct BytesBackend {
    resources: HashMap<ResourceId, Allocation>,
}

struct Allocation {
    ptr: NonNull<u8>,
    layout: Layout,
    hw_write_only: bool,
    locked: bool,
}

impl core::fmt::Debug for BytesBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BytesBackend")
            .field("resources", &self.resources.len())
            .finish()
    }
}

/// The backend only hands out pointers it owns exclusively.
unsafe impl Send for BytesBackend {}

impl BytesBackend {
    /// Number of live resources.
    pub fn num_resources(&self) -> usize {
        self.resources.len()
    }

    /// Whether the resource is currently mapped.
    pub fn is_locked(&self, handle: &ResourceHandle) -> bool {
        self.resources
            .get(&handle.id)
            .map(|allocation| allocation.locked)
            .unwrap_or(false)
    }

    fn allocation(&mut self, handle: &ResourceHandle) -> Result<&mut Allocation> {
        self.resources
            .get_mut(&handle.id)
            .ok_or_else(|| HeapError::backend(format!("Unknown resource {:?}", handle.id)))
    }
}

// SAFETY: every pointer comes from a live allocation of `handle.size` bytes owned by the backend,
// released only in `free` or on drop.
unsafe impl ResourceBackend for BytesBackend {
    fn allocate(&mut self, size: u64, hw_write_only: bool) -> Result<ResourceHandle> {
        if size == 0 {
            return Err(HeapError::invalid("Can't allocate an empty resource"));
        }

        let layout = usize::try_from(size)
            .ok()
            .and_then(|size| Layout::array::<u8>(size).ok())
            .ok_or_else(|| HeapError::backend(format!("Resource of {size} bytes is too big")))?;

        // SAFETY: the layout has a non-zero size.
        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr)
            .ok_or_else(|| HeapError::backend(format!("Out of host memory for {size} bytes")))?;

        let id = ResourceId::new();
        self.resources.insert(
            id,
            Allocation {
                ptr,
                layout,
                hw_write_only,
                locked: false,
            },
        );

        Ok(ResourceHandle::new(id, size))
    }

    fn lock(&mut self, handle: &ResourceHandle) -> Result<NonNull<u8>> {
        let allocation = self.allocation(handle)?;

        if allocation.hw_write_only {
            return Err(HeapError::invalid(
                "Hardware write-only resources can't be mapped",
            ));
        }
        if allocation.locked {
            return Err(HeapError::backend(format!(
                "Resource {:?} is already locked",
                handle.id
            )));
        }

        allocation.locked = true;
        Ok(allocation.ptr)
    }

    fn unlock(&mut self, handle: &ResourceHandle) -> Result<()> {
        let allocation = self.allocation(handle)?;

        if !allocation.locked {
            return Err(HeapError::backend(format!(
                "Resource {:?} isn't locked",
                handle.id
            )));
        }

        allocation.locked = false;
        Ok(())
    }

    fn free(&mut self, handle: ResourceHandle) {
        if let Some(allocation) = self.resources.remove(&handle.id) {
            // SAFETY: allocated in `allocate` with the same layout.
            unsafe {
                dealloc(allocation.ptr.as_ptr(), allocation.layout);
            }
        }
    }
}

impl Drop for BytesBackend {
    fn drop(&mut self) {
        for (_, allocation) in self.resources.drain() {
            // SAFETY: allocated in `allocate` with the same layout.
            unsafe {
                dealloc(allocation.ptr.as_ptr(), allocation.layout);
            }
        }
    }
}
