// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Accelerator visible memory.
//!
//! The accelerator cannot work on arbitrary host memory, so frames are
//! staged through [`BounceBuffer`]s allocated from a [`MemoryBackend`] with
//! an [`AllocParams`] policy. A bounce buffer keeps a copy of the policy it
//! was allocated with and hands exactly that policy back to the backend when
//! it is dropped.
//!
//! Two backends are provided:
//!
//! - [`HostMemory`] allocates aligned heap memory and is used on hosts where
//!   the accelerator is emulated in software.
//! - [`DmaHeapMemory`] allocates from the Linux DMA heaps (CMA for the
//!   contiguous pool) and maps the buffers into the process.

use crate::cache::CacheControl;
use std::{
    alloc::{alloc_zeroed, dealloc, Layout},
    fmt,
    ptr::NonNull,
    slice::{from_raw_parts, from_raw_parts_mut},
    sync::{atomic, Arc},
};
use tracing::debug;

/// Alignment of bounce buffer sizes and addresses, in bytes.
pub const BUFALIGN: usize = 128;

/// Memory class a buffer is allocated from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemoryClass {
    /// Physically contiguous pool reachable by the accelerator's DMA.
    ContiguousPool,
    /// General purpose system memory.
    System,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CachePolicy {
    NonCached,
    Cached,
}

/// Allocation policy, passed unchanged to both `alloc` and `free`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AllocParams {
    pub class: MemoryClass,
    pub cache: CachePolicy,
    /// Power-of-two byte alignment.
    pub align: usize,
    pub segment: u32,
}

impl AllocParams {
    /// Policy used for the transcode bounce buffers.
    pub const fn bounce() -> Self {
        Self {
            class: MemoryClass::ContiguousPool,
            cache: CachePolicy::NonCached,
            align: BUFALIGN,
            segment: 0,
        }
    }
}

impl Default for AllocParams {
    fn default() -> Self {
        Self::bounce()
    }
}

/// Rounds `value` up to the next multiple of `align`, `None` on overflow.
pub fn align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align > 0);
    value.checked_add(align - 1).map(|v| v / align * align)
}

/// Allocator for accelerator visible memory regions.
pub trait MemoryBackend: CacheControl + Send + Sync {
    /// Allocates `size` bytes with the given policy, `None` on failure.
    fn alloc(&self, size: usize, params: &AllocParams) -> Option<NonNull<u8>>;

    /// Releases a region.
    ///
    /// # Safety
    ///
    /// `region` must have been returned by [`MemoryBackend::alloc`] on this
    /// backend with the same `size` and `params`, and must not be used after
    /// this call.
    unsafe fn free(&self, region: NonNull<u8>, size: usize, params: &AllocParams);
}

/// Owned, alignment-rounded region of accelerator visible memory.
///
/// The region is released through the backend that allocated it, with the
/// policy it was allocated with, when the buffer is dropped.
pub struct BounceBuffer {
    ptr: NonNull<u8>,
    size: usize,
    params: AllocParams,
    memory: Arc<dyn MemoryBackend>,
}

// The region is exclusively owned by the buffer.
unsafe impl Send for BounceBuffer {}

impl BounceBuffer {
    /// Allocates a buffer of `requested` bytes rounded up to `params.align`.
    pub fn new(
        memory: &Arc<dyn MemoryBackend>,
        requested: usize,
        params: AllocParams,
    ) -> Option<Self> {
        let size = align_up(requested, params.align)?;
        let ptr = memory.alloc(size, &params)?;
        debug!(requested, size, "bounce buffer alloc'd");
        Some(Self {
            ptr,
            size,
            params,
            memory: memory.clone(),
        })
    }

    /// Allocated size, a multiple of the policy alignment.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn params(&self) -> &AllocParams {
        &self.params
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }

    pub(crate) fn region(&self) -> (NonNull<u8>, usize) {
        (self.ptr, self.size)
    }

    pub(crate) fn memory(&self) -> &dyn MemoryBackend {
        &*self.memory
    }
}

impl Drop for BounceBuffer {
    fn drop(&mut self) {
        unsafe { self.memory.free(self.ptr, self.size, &self.params) };
        debug!(size = self.size, "bounce buffer freed");
    }
}

impl fmt::Debug for BounceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BounceBuffer")
            .field("ptr", &self.ptr)
            .field("size", &self.size)
            .field("params", &self.params)
            .finish()
    }
}

/// Aligned heap memory for hosts without accelerator memory.
///
/// Host and emulated accelerator share one coherent view, cache maintenance
/// only orders memory accesses.
#[derive(Debug, Default)]
pub struct HostMemory;

impl HostMemory {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryBackend for HostMemory {
    fn alloc(&self, size: usize, params: &AllocParams) -> Option<NonNull<u8>> {
        if size == 0 {
            return Some(NonNull::dangling());
        }
        let layout = Layout::from_size_align(size, params.align).ok()?;
        NonNull::new(unsafe { alloc_zeroed(layout) })
    }

    unsafe fn free(&self, region: NonNull<u8>, size: usize, params: &AllocParams) {
        if size == 0 {
            return;
        }
        if let Ok(layout) = Layout::from_size_align(size, params.align) {
            dealloc(region.as_ptr(), layout);
        }
    }
}

impl CacheControl for HostMemory {
    fn writeback_invalidate(&self, _region: NonNull<u8>, _size: usize) {
        atomic::fence(atomic::Ordering::SeqCst);
    }

    fn invalidate(&self, _region: NonNull<u8>, _size: usize) {
        atomic::fence(atomic::Ordering::SeqCst);
    }

    fn writeback(&self, _region: NonNull<u8>, _size: usize) {
        atomic::fence(atomic::Ordering::SeqCst);
    }
}

#[cfg(target_os = "linux")]
pub use dma::DmaHeapMemory;

#[cfg(target_os = "linux")]
mod dma {
    use super::{AllocParams, MemoryBackend, MemoryClass};
    use crate::cache::CacheControl;
    use dma_heap::{Heap, HeapKind};
    use std::{
        collections::HashMap,
        ffi::c_void,
        os::fd::{AsRawFd, OwnedFd},
        ptr::{null_mut, NonNull},
        sync::{Mutex, MutexGuard, PoisonError},
    };
    use tracing::{error, warn};

    #[repr(C)]
    pub struct DmaBufSync {
        flags: u64,
    }

    const DMA_BUF_SYNC_READ: u64 = 1 << 0;
    const DMA_BUF_SYNC_WRITE: u64 = 1 << 1;
    const DMA_BUF_SYNC_RW: u64 = DMA_BUF_SYNC_READ | DMA_BUF_SYNC_WRITE;
    const DMA_BUF_SYNC_START: u64 = 0;
    const DMA_BUF_SYNC_END: u64 = 1 << 2;

    /// Sync flags issued for each cache operation.
    pub(super) const WRITEBACK_INVALIDATE_FLAGS: u64 = DMA_BUF_SYNC_END | DMA_BUF_SYNC_RW;
    pub(super) const INVALIDATE_FLAGS: u64 = DMA_BUF_SYNC_END | DMA_BUF_SYNC_READ;
    pub(super) const WRITEBACK_FLAGS: u64 = DMA_BUF_SYNC_START | DMA_BUF_SYNC_READ;

    nix::ioctl_write_ptr!(dma_buf_ioctl_sync, b'b', 0, DmaBufSync);

    /// Linux DMA heap backed memory.
    ///
    /// Each region is a dma-buf mapped into the process. The dma-buf file
    /// descriptor is kept for the region's lifetime so cache maintenance can
    /// be issued through `DMA_BUF_IOCTL_SYNC`.
    #[derive(Debug, Default)]
    pub struct DmaHeapMemory {
        regions: Mutex<HashMap<usize, OwnedFd>>,
    }

    impl DmaHeapMemory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of regions currently mapped.
        pub fn region_count(&self) -> usize {
            self.regions().len()
        }

        fn regions(&self) -> MutexGuard<'_, HashMap<usize, OwnedFd>> {
            self.regions.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn sync(&self, region: NonNull<u8>, flags: u64) {
            let regions = self.regions();
            let Some(fd) = regions.get(&(region.as_ptr() as usize)) else {
                warn!(?region, "cache sync on unknown dma-buf region");
                return;
            };
            let arg = DmaBufSync { flags };
            if let Err(e) = unsafe { dma_buf_ioctl_sync(fd.as_raw_fd(), &arg) } {
                warn!(fd = fd.as_raw_fd(), flags, "DMA_BUF_IOCTL_SYNC failed: {}", e);
            }
        }
    }

    impl MemoryBackend for DmaHeapMemory {
        fn alloc(&self, size: usize, params: &AllocParams) -> Option<NonNull<u8>> {
            let kind = match params.class {
                MemoryClass::ContiguousPool => HeapKind::Cma,
                MemoryClass::System => HeapKind::System,
            };
            let heap = match Heap::new(kind) {
                Ok(heap) => heap,
                Err(e) => {
                    error!("dma heap open failed: {:?}", e);
                    return None;
                }
            };
            let fd = match heap.allocate(size) {
                Ok(fd) => fd,
                Err(e) => {
                    error!(size, "dma heap allocate failed: {:?}", e);
                    return None;
                }
            };

            let ptr = unsafe {
                libc::mmap(
                    null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED,
                    fd.as_raw_fd(),
                    0,
                )
            };
            if ptr == libc::MAP_FAILED {
                error!(size, "mmap of dma-buf failed");
                return None;
            }
            let ptr = NonNull::new(ptr.cast::<u8>())?;
            debug_assert_eq!(ptr.as_ptr() as usize % params.align, 0);

            self.regions().insert(ptr.as_ptr() as usize, fd);
            Some(ptr)
        }

        unsafe fn free(&self, region: NonNull<u8>, size: usize, _params: &AllocParams) {
            if libc::munmap(region.as_ptr().cast::<c_void>(), size) != 0 {
                warn!(size, "munmap of dma-buf failed");
            }
            // Dropping the descriptor releases the dma-buf.
            self.regions().remove(&(region.as_ptr() as usize));
        }
    }

    impl CacheControl for DmaHeapMemory {
        fn writeback_invalidate(&self, region: NonNull<u8>, _size: usize) {
            self.sync(region, WRITEBACK_INVALIDATE_FLAGS);
        }

        fn invalidate(&self, region: NonNull<u8>, _size: usize) {
            self.sync(region, INVALIDATE_FLAGS);
        }

        fn writeback(&self, region: NonNull<u8>, _size: usize) {
            self.sync(region, WRITEBACK_FLAGS);
        }
    }
}
