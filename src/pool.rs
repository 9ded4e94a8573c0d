// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Source and destination bounce buffer pair.

use crate::{
    error::{EngineError, Region, Result},
    memory::{AllocParams, BounceBuffer, MemoryBackend},
};
use std::sync::Arc;
use tracing::{debug, error};

/// Owns the two bounce buffers a session stages frames through.
///
/// Both buffers are either allocated or released together: a failed
/// [`BufferPool::allocate`] never leaves one of them behind. Sizes are fixed
/// from allocation until [`BufferPool::free`].
pub struct BufferPool {
    memory: Arc<dyn MemoryBackend>,
    params: AllocParams,
    src: Option<BounceBuffer>,
    dst: Option<BounceBuffer>,
}

impl BufferPool {
    pub fn new(memory: Arc<dyn MemoryBackend>) -> Self {
        Self::with_params(memory, AllocParams::bounce())
    }

    pub fn with_params(memory: Arc<dyn MemoryBackend>, params: AllocParams) -> Self {
        Self {
            memory,
            params,
            src: None,
            dst: None,
        }
    }

    /// Allocates the source region, then the destination region, each
    /// rounded up to the policy alignment.
    pub fn allocate(&mut self, src_size: usize, dst_size: usize) -> Result<()> {
        if self.is_allocated() {
            return Err(EngineError::AlreadyStarted);
        }

        let src = match BounceBuffer::new(&self.memory, src_size, self.params) {
            Some(buf) => buf,
            None => {
                error!(size = src_size, "source bounce buffer alloc failed");
                return Err(EngineError::OutOfMemory {
                    region: Region::Source,
                    size: src_size,
                });
            }
        };

        // On failure `src` goes out of scope here and is released.
        let dst = match BounceBuffer::new(&self.memory, dst_size, self.params) {
            Some(buf) => buf,
            None => {
                error!(size = dst_size, "destination bounce buffer alloc failed");
                return Err(EngineError::OutOfMemory {
                    region: Region::Destination,
                    size: dst_size,
                });
            }
        };

        debug!(src = src.len(), dst = dst.len(), "bounce buffers allocated");
        self.src = Some(src);
        self.dst = Some(dst);
        Ok(())
    }

    /// Releases the destination region, then the source region. Regions
    /// already released are skipped.
    pub fn free(&mut self) {
        if let Some(dst) = self.dst.take() {
            drop(dst);
        }
        if let Some(src) = self.src.take() {
            drop(src);
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.src.is_some() && self.dst.is_some()
    }

    pub fn params(&self) -> &AllocParams {
        &self.params
    }

    /// Rounded size of the source region, `0` when released.
    pub fn source_size(&self) -> usize {
        self.src.as_ref().map_or(0, BounceBuffer::len)
    }

    /// Rounded size of the destination region, `0` when released.
    pub fn destination_size(&self) -> usize {
        self.dst.as_ref().map_or(0, BounceBuffer::len)
    }

    pub fn buffers_mut(&mut self) -> Option<(&mut BounceBuffer, &mut BounceBuffer)> {
        match (self.src.as_mut(), self.dst.as_mut()) {
            (Some(src), Some(dst)) => Some((src, dst)),
            _ => None,
        }
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        self.free();
    }
}
