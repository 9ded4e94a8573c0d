// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Accelerator runtime and codec capability interfaces.
//!
//! The remote processing engine is reached through three capability traits:
//!
//! - [`Accelerator`] is the process-wide runtime. It registers remote engine
//!   descriptors and opens named connections.
//! - [`Connection`] is an open engine connection. Dropping it closes the
//!   connection.
//! - [`Codec`] is a codec instance bound to a connection. Dropping it deletes
//!   the instance.
//!
//! Production bindings implement these traits over the vendor driver, while
//! [`crate::loopback`] provides a software implementation for hosts without
//! an accelerator. The buffer descriptors mirror the XDM layout used by the
//! DSP firmware: one input buffer, one output buffer and a pair of argument
//! records.

use std::fmt;

/// Name under which the remote engine descriptor is registered and opened.
pub const ENGINE_NAME: &str = "dsp-server";

/// Result code of a successful [`Codec::process`] call.
pub const PROCESS_EOK: i32 = 0;

/// Generic failure result code of [`Codec::process`].
pub const PROCESS_EFAIL: i32 = -1;

/// Native error reported by the accelerator runtime.
///
/// Only used for diagnostics, the engine maps these to its own error codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{errno}/{code}")]
pub struct NativeError {
    /// `errno` observed after the failing call.
    pub errno: i32,
    /// Runtime specific error code.
    pub code: i32,
}

/// Remote engine descriptor passed to [`Accelerator::add_remote_engine`].
#[derive(Clone, Debug)]
pub struct EngineDesc<'a> {
    /// Name the engine is opened by.
    pub name: &'a str,
    /// Path of the server image loaded on the accelerator.
    pub remote_name: &'a str,
}

pub trait Accelerator: Send + Sync {
    /// Initializes the runtime. Called once per process before any session.
    fn init(&self);

    /// Enables verbose diagnostic channels of the runtime.
    fn enable_diagnostics(&self) {}

    fn add_remote_engine(&self, desc: &EngineDesc<'_>) -> Result<(), NativeError>;

    fn open(&self, name: &str) -> Result<Box<dyn Connection>, NativeError>;
}

pub trait Connection: Send {
    /// Creates a codec instance bound to this connection, `None` when the
    /// accelerator rejects the codec identity.
    fn create_codec(&self, identity: &str) -> Option<Box<dyn Codec>>;
}

pub trait Codec: Send {
    /// Processes one frame synchronously.
    ///
    /// Blocks for the whole hardware round-trip and returns [`PROCESS_EOK`]
    /// on success. On return `out_args` describes what was written to the
    /// output buffer.
    fn process(
        &mut self,
        in_bufs: &InBufDesc<'_>,
        out_bufs: &mut OutBufDesc<'_>,
        in_args: &InArgs,
        out_args: &mut OutArgs,
    ) -> i32;
}

/// Buffer access mode reported by the codec.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct AccessMask(pub u32);

impl AccessMask {
    pub const READ: AccessMask = AccessMask(1 << 0);
    pub const WRITE: AccessMask = AccessMask(1 << 1);

    pub fn is_read(self) -> bool {
        self.0 & Self::READ.0 != 0
    }

    pub fn is_write(self) -> bool {
        self.0 & Self::WRITE.0 != 0
    }
}

impl std::ops::BitOr for AccessMask {
    type Output = AccessMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        AccessMask(self.0 | rhs.0)
    }
}

impl fmt::Debug for AccessMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let r = if self.is_read() { "r" } else { "-" };
        let w = if self.is_write() { "w" } else { "-" };
        write!(f, "AccessMask({}{})", r, w)
    }
}

/// Input buffer descriptor referencing the source bounce buffer.
pub struct InBufDesc<'a> {
    pub buf: &'a [u8],
}

/// Output buffer descriptor referencing the destination bounce buffer.
pub struct OutBufDesc<'a> {
    pub buf: &'a mut [u8],
}

#[derive(Clone, Debug, Default)]
pub struct InArgs {
    /// Number of valid bytes in the input buffer.
    pub num_bytes: usize,
}

/// Description of the buffer the codec produced.
#[derive(Clone, Debug, Default)]
pub struct EncodedBuf {
    pub access_mask: AccessMask,
    /// Reported output size. Signed, a misbehaving codec may report a
    /// negative or oversized value.
    pub buf_size: i64,
}

#[derive(Clone, Debug, Default)]
pub struct OutArgs {
    pub extended_error: i32,
    /// Input bytes the codec consumed.
    pub bytes_consumed: i64,
    pub encoded_buf: EncodedBuf,
}
