// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Cache coherency protocol around accelerator calls.
//!
//! Host and accelerator may hold independently cached views of the bounce
//! buffers. Every transcode call is bracketed by the same fixed sequence:
//!
//! 1. [`CacheControl::writeback_invalidate`] on the source buffer, pushing
//!    the freshly copied frame out to memory.
//! 2. [`CacheControl::invalidate`] on the destination buffer, dropping stale
//!    lines the accelerator is about to overwrite.
//! 3. The accelerator process call.
//! 4. [`CacheControl::writeback`] on the destination buffer, only when the
//!    codec reports it wrote output.
//!
//! The host cannot know the exact byte extent the accelerator's DMA touches
//! on a given call, so every operation covers the whole buffer rather than
//! the portion in use.

use crate::{accel::AccessMask, memory::BounceBuffer};
use std::ptr::NonNull;
use tracing::trace;

/// Region-wide cache maintenance.
pub trait CacheControl {
    fn writeback_invalidate(&self, region: NonNull<u8>, size: usize);

    fn invalidate(&self, region: NonNull<u8>, size: usize);

    fn writeback(&self, region: NonNull<u8>, size: usize);
}

impl BounceBuffer {
    pub fn writeback_invalidate(&self) {
        let (region, size) = self.region();
        self.memory().writeback_invalidate(region, size);
    }

    pub fn invalidate(&self) {
        let (region, size) = self.region();
        self.memory().invalidate(region, size);
    }

    pub fn writeback(&self) {
        let (region, size) = self.region();
        self.memory().writeback(region, size);
    }
}

/// Hands both buffers to the accelerator. Called after the input frame has
/// been copied into `src`.
pub fn prepare(src: &BounceBuffer, dst: &BounceBuffer) {
    trace!(src = src.len(), dst = dst.len(), "cache prepare");
    src.writeback_invalidate();
    dst.invalidate();
}

/// Makes accelerator output in `dst` visible to the host if the codec wrote
/// any. Returns whether a writeback was issued.
pub fn complete(dst: &BounceBuffer, access: AccessMask) -> bool {
    if !access.is_write() {
        return false;
    }
    trace!(dst = dst.len(), "cache writeback");
    dst.writeback();
    true
}
