use crate::HeapId;
use crate::error::{HeapError, Result};
use crate::storage::{ResourceBackend, ResourceHandle};
use alloc::format;
use core::ptr::NonNull;

/// A CPU mapping of the heap resource.
#[derive(Clone, Copy, Debug)]
struct Mapping(NonNull<u8>);

// The pointer is only dereferenced through `&mut Heap`, and stays valid until unlocked.
unsafe impl Send for Mapping {}

/// A fixed-size backing buffer that blocks are carved from.
#[derive(Debug)]
pub struct Heap {
    id: HeapId,
    resource: Option<ResourceHandle>,
    size: u64,
    used: u64,
    free_in_progress: bool,
    keep_locked: bool,
    hw_write_only: bool,
    mapping: Option<Mapping>,
}

impl Heap {
    /// Create an empty heap without backing resource.
    pub fn new(id: HeapId) -> Self {
        Self {
            id,
            resource: None,
            size: 0,
            used: 0,
            free_in_progress: false,
            keep_locked: false,
            hw_write_only: false,
            mapping: None,
        }
    }

    /// Bind a freshly allocated resource of `size` bytes to the heap.
    ///
    /// When `keep_locked` is set the resource stays mapped until the heap is destroyed, otherwise
    /// every data access maps and unmaps it.
    pub fn allocate<B: ResourceBackend>(
        &mut self,
        backend: &mut B,
        size: u64,
        keep_locked: bool,
        hw_write_only: bool,
    ) -> Result<()> {
        if size == 0 {
            return Err(HeapError::invalid("Heap size can't be zero"));
        }
        if self.resource.is_some() {
            return Err(HeapError::invalid(format!(
                "Heap {} already has a resource",
                self.id
            )));
        }

        let resource = backend.allocate(size, hw_write_only)?;
        self.resource = Some(resource);
        self.size = size;
        self.used = 0;
        self.hw_write_only = hw_write_only;
        self.keep_locked = keep_locked && !hw_write_only;

        if self.keep_locked {
            let ptr = match backend.lock(&resource) {
                Ok(ptr) => ptr,
                Err(err) => {
                    backend.free(resource);
                    self.resource = None;
                    self.size = 0;
                    return Err(err);
                }
            };
            self.mapping = Some(Mapping(ptr));
        }

        Ok(())
    }

    /// Heap id.
    pub fn id(&self) -> HeapId {
        self.id
    }

    /// Backing resource, if allocated.
    pub fn resource(&self) -> Option<&ResourceHandle> {
        self.resource.as_ref()
    }

    /// Total size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes held by allocated and submitted blocks.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Bytes not held by any block.
    pub fn free(&self) -> u64 {
        self.size - self.used
    }

    /// Whether the heap is draining before its release.
    pub fn is_free_in_progress(&self) -> bool {
        self.free_in_progress
    }

    /// Whether the mapping is held for the heap lifetime.
    pub fn is_keep_locked(&self) -> bool {
        self.keep_locked
    }

    /// Whether the CPU can't access the heap.
    pub fn is_hw_write_only(&self) -> bool {
        self.hw_write_only
    }

    /// Grow or shrink the used space.
    ///
    /// Growing is rejected once the heap is draining.
    pub fn adjust_used_space(&mut self, delta: i64) -> Result<()> {
        if delta > 0 && self.free_in_progress {
            return Err(HeapError::invalid(format!(
                "Heap {} is being freed and can't take new allocations",
                self.id
            )));
        }

        let used = self
            .used
            .checked_add_signed(delta)
            .filter(|used| *used <= self.size)
            .ok_or_else(|| {
                HeapError::invalid(format!(
                    "Adjusting used space of heap {} by {delta} breaks its accounting ({} of {} used)",
                    self.id, self.used, self.size
                ))
            })?;

        self.used = used;
        Ok(())
    }

    /// Grow or shrink the free space.
    pub fn adjust_free_space(&mut self, delta: i64) -> Result<()> {
        let delta = delta
            .checked_neg()
            .ok_or_else(|| HeapError::invalid("Free space delta overflows"))?;
        self.adjust_used_space(delta)
    }

    /// Mark the heap as draining. Calling it again has no effect.
    pub fn prepare_for_free(&mut self) {
        if !self.free_in_progress {
            log::debug!("Heap {} is draining, {} bytes still used", self.id, self.used);
        }
        self.free_in_progress = true;
    }

    /// Map the resource. Kept mappings are returned as is.
    pub fn lock<B: ResourceBackend>(&mut self, backend: &mut B) -> Result<NonNull<u8>> {
        if self.hw_write_only {
            return Err(HeapError::invalid(format!(
                "Heap {} is hardware write-only",
                self.id
            )));
        }
        if let Some(Mapping(ptr)) = self.mapping {
            return Ok(ptr);
        }

        let resource = self.resource.ok_or(HeapError::MissingResource { heap: self.id })?;
        let ptr = backend.lock(&resource)?;
        self.mapping = Some(Mapping(ptr));
        Ok(ptr)
    }

    /// Release a mapping taken with [lock](Heap::lock). Kept mappings stay mapped.
    pub fn unlock<B: ResourceBackend>(&mut self, backend: &mut B) -> Result<()> {
        if self.keep_locked || self.mapping.is_none() {
            return Ok(());
        }

        let resource = self.resource.ok_or(HeapError::MissingResource { heap: self.id })?;
        self.mapping = None;
        backend.unlock(&resource)
    }

    /// Copy `data` into the heap at `offset`.
    pub fn write<B: ResourceBackend>(
        &mut self,
        backend: &mut B,
        offset: u64,
        data: &[u8],
    ) -> Result<()> {
        self.check_range(offset, data.len() as u64)?;
        self.with_mapping(backend, |ptr| {
            // SAFETY: the range is inside the mapped resource and `data` can't alias it, as the
            // mapping is never exposed.
            unsafe {
                core::ptr::copy_nonoverlapping(
                    data.as_ptr(),
                    ptr.as_ptr().add(offset as usize),
                    data.len(),
                );
            }
        })
    }

    /// Zero `size` bytes of the heap at `offset`.
    pub fn fill_zero<B: ResourceBackend>(
        &mut self,
        backend: &mut B,
        offset: u64,
        size: u64,
    ) -> Result<()> {
        self.check_range(offset, size)?;
        self.with_mapping(backend, |ptr| {
            // SAFETY: the range is inside the mapped resource.
            unsafe {
                core::ptr::write_bytes(ptr.as_ptr().add(offset as usize), 0, size as usize);
            }
        })
    }

    /// Copy heap content at `offset` into `data`.
    pub fn read<B: ResourceBackend>(
        &mut self,
        backend: &mut B,
        offset: u64,
        data: &mut [u8],
    ) -> Result<()> {
        self.check_range(offset, data.len() as u64)?;
        self.with_mapping(backend, |ptr| {
            // SAFETY: the range is inside the mapped resource.
            unsafe {
                core::ptr::copy_nonoverlapping(
                    ptr.as_ptr().add(offset as usize),
                    data.as_mut_ptr(),
                    data.len(),
                );
            }
        })
    }

    /// Unmap and release the resource. Heaps without resource are left untouched.
    pub fn destroy<B: ResourceBackend>(&mut self, backend: &mut B) -> Result<()> {
        let resource = match self.resource.take() {
            Some(resource) => resource,
            None => return Ok(()),
        };

        let unlocked = match self.mapping.take() {
            Some(_) => backend.unlock(&resource),
            None => Ok(()),
        };
        backend.free(resource);

        log::debug!("Heap {} released {} bytes", self.id, self.size);
        self.size = 0;
        self.used = 0;
        self.keep_locked = false;

        unlocked
    }

    fn check_range(&self, offset: u64, size: u64) -> Result<()> {
        match offset.checked_add(size) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(HeapError::invalid(format!(
                "Range [{offset}, +{size}) exceeds heap {} of {} bytes",
                self.id, self.size
            ))),
        }
    }

    fn with_mapping<B: ResourceBackend, F: FnOnce(NonNull<u8>)>(
        &mut self,
        backend: &mut B,
        func: F,
    ) -> Result<()> {
        let ptr = self.lock(backend)?;
        func(ptr);
        self.unlock(backend)
    }
}
