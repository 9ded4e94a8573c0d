// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Software accelerator for hosts without a DSP.
//!
//! Implements the runtime, connection and codec capabilities entirely on the
//! host so the engine can be exercised on development machines. The only
//! codec offered is [`PASSTHROUGH`], which copies its input to its output.

use crate::accel::{
    AccessMask, Accelerator, Codec, Connection, EncodedBuf, EngineDesc, InArgs, InBufDesc,
    NativeError, OutArgs, OutBufDesc, PROCESS_EFAIL, PROCESS_EOK,
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, PoisonError,
    },
};
use tracing::{debug, trace};

/// Codec identity of the copying codec.
pub const PASSTHROUGH: &str = "passthrough";

/// Runtime used before `init`.
pub const LOOPBACK_ENOTINIT: i32 = 1;
/// Engine name was never registered.
pub const LOOPBACK_ENOTFOUND: i32 = 2;
/// Descriptor without a server path.
pub const LOOPBACK_EINVAL: i32 = 3;

#[derive(Debug, Default)]
pub struct LoopbackAccelerator {
    initialized: AtomicBool,
    diagnostics: AtomicBool,
    engines: Mutex<HashMap<String, String>>,
}

impl LoopbackAccelerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics.load(Ordering::Relaxed)
    }
}

impl Accelerator for LoopbackAccelerator {
    fn init(&self) {
        self.initialized.store(true, Ordering::Release);
        debug!("loopback accelerator initialized");
    }

    fn enable_diagnostics(&self) {
        self.diagnostics.store(true, Ordering::Relaxed);
    }

    fn add_remote_engine(&self, desc: &EngineDesc<'_>) -> Result<(), NativeError> {
        if desc.remote_name.is_empty() {
            return Err(NativeError {
                errno: libc::EINVAL,
                code: LOOPBACK_EINVAL,
            });
        }
        self.engines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(desc.name.to_owned(), desc.remote_name.to_owned());
        debug!(name = desc.name, server = desc.remote_name, "remote engine added");
        Ok(())
    }

    fn open(&self, name: &str) -> Result<Box<dyn Connection>, NativeError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(NativeError {
                errno: 0,
                code: LOOPBACK_ENOTINIT,
            });
        }
        let engines = self.engines.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(server) = engines.get(name) else {
            return Err(NativeError {
                errno: 0,
                code: LOOPBACK_ENOTFOUND,
            });
        };
        debug!(name, server, "loopback connection opened");
        Ok(Box::new(LoopbackConnection {
            name: name.to_owned(),
            trace: self.diagnostics_enabled(),
        }))
    }
}

struct LoopbackConnection {
    name: String,
    trace: bool,
}

impl Connection for LoopbackConnection {
    fn create_codec(&self, identity: &str) -> Option<Box<dyn Codec>> {
        match identity {
            PASSTHROUGH => Some(Box::new(Passthrough {
                frames: 0,
                trace: self.trace,
            })),
            _ => None,
        }
    }
}

impl Drop for LoopbackConnection {
    fn drop(&mut self) {
        debug!(name = %self.name, "loopback connection closed");
    }
}

struct Passthrough {
    frames: u64,
    trace: bool,
}

impl Codec for Passthrough {
    fn process(
        &mut self,
        in_bufs: &InBufDesc<'_>,
        out_bufs: &mut OutBufDesc<'_>,
        in_args: &InArgs,
        out_args: &mut OutArgs,
    ) -> i32 {
        if in_args.num_bytes > in_bufs.buf.len() {
            out_args.extended_error = LOOPBACK_EINVAL;
            return PROCESS_EFAIL;
        }
        let n = in_args.num_bytes.min(out_bufs.buf.len());
        out_bufs.buf[..n].copy_from_slice(&in_bufs.buf[..n]);

        out_args.bytes_consumed = in_args.num_bytes as i64;
        out_args.encoded_buf = EncodedBuf {
            access_mask: AccessMask::WRITE,
            buf_size: n as i64,
        };
        self.frames += 1;
        if self.trace {
            trace!(frame = self.frames, bytes = n, "passthrough");
        }
        PROCESS_EOK
    }
}

impl Drop for Passthrough {
    fn drop(&mut self) {
        debug!(frames = self.frames, "passthrough codec deleted");
    }
}
