// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

#![allow(dead_code)]

use edgefirst_transcode::{
    accel::{
        AccessMask, Accelerator, Codec, Connection, EncodedBuf, EngineDesc, InArgs, InBufDesc,
        NativeError, OutArgs, OutBufDesc, PROCESS_EOK,
    },
    cache::CacheControl,
    memory::{AllocParams, HostMemory, MemoryBackend},
    runtime::{self, EngineRuntime},
};
use std::{
    ptr::NonNull,
    sync::{Arc, Mutex},
};

/// Memory backend recording every call, backed by host memory.
#[derive(Default)]
pub struct RecordingMemory {
    host: HostMemory,
    events: Mutex<Vec<MemEvent>>,
    /// Index of the allocation that fails, counted from zero.
    fail_alloc: Mutex<Option<usize>>,
    allocs: Mutex<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MemEvent {
    Alloc(usize, AllocParams),
    Free(usize, AllocParams),
    WritebackInvalidate(usize),
    Invalidate(usize),
    Writeback(usize),
}

impl RecordingMemory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_alloc(index: usize) -> Arc<Self> {
        let mem = Self::default();
        *mem.fail_alloc.lock().unwrap() = Some(index);
        Arc::new(mem)
    }

    pub fn events(&self) -> Vec<MemEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn cache_events(&self) -> Vec<MemEvent> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, MemEvent::Alloc(..) | MemEvent::Free(..)))
            .collect()
    }

    pub fn alloc_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, MemEvent::Alloc(..)))
            .count()
    }

    pub fn free_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, MemEvent::Free(..)))
            .count()
    }

    pub fn outstanding(&self) -> usize {
        self.alloc_count() - self.free_count()
    }
}

impl MemoryBackend for RecordingMemory {
    fn alloc(&self, size: usize, params: &AllocParams) -> Option<NonNull<u8>> {
        let mut allocs = self.allocs.lock().unwrap();
        let index = *allocs;
        *allocs += 1;
        if *self.fail_alloc.lock().unwrap() == Some(index) {
            return None;
        }
        let ptr = self.host.alloc(size, params)?;
        self.events
            .lock()
            .unwrap()
            .push(MemEvent::Alloc(size, *params));
        Some(ptr)
    }

    unsafe fn free(&self, region: NonNull<u8>, size: usize, params: &AllocParams) {
        self.host.free(region, size, params);
        self.events
            .lock()
            .unwrap()
            .push(MemEvent::Free(size, *params));
    }
}

impl CacheControl for RecordingMemory {
    fn writeback_invalidate(&self, _region: NonNull<u8>, size: usize) {
        self.events
            .lock()
            .unwrap()
            .push(MemEvent::WritebackInvalidate(size));
    }

    fn invalidate(&self, _region: NonNull<u8>, size: usize) {
        self.events.lock().unwrap().push(MemEvent::Invalidate(size));
    }

    fn writeback(&self, _region: NonNull<u8>, size: usize) {
        self.events.lock().unwrap().push(MemEvent::Writeback(size));
    }
}

/// Behaviour of the scripted codec.
#[derive(Clone, Debug)]
pub struct Script {
    pub result: i32,
    pub extended_error: i32,
    pub access: AccessMask,
    /// Bytes written to the output buffer, truncated to its length.
    pub payload: Vec<u8>,
    /// Reported output size, the written length when `None`.
    pub reported: Option<i64>,
    /// Byte the codec scribbles over the output buffer when it fails.
    pub scribble_on_failure: Option<u8>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            result: PROCESS_EOK,
            extended_error: 0,
            access: AccessMask::WRITE,
            payload: Vec::new(),
            reported: None,
            scribble_on_failure: None,
        }
    }
}

#[derive(Default)]
pub struct MockState {
    pub script: Script,
    pub fail_add: bool,
    pub fail_open: bool,
    pub reject_codec: bool,
    pub initialized: bool,
    pub diagnostics: bool,
    pub servers: Vec<String>,
    pub calls: usize,
    pub inputs: Vec<Vec<u8>>,
    pub log: Vec<&'static str>,
}

/// Scripted accelerator sharing its state with every connection and codec
/// it creates.
#[derive(Default)]
pub struct MockAccelerator {
    pub state: Arc<Mutex<MockState>>,
}

impl MockAccelerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_script(script: Script) -> Arc<Self> {
        let accel = Self::default();
        accel.state.lock().unwrap().script = script;
        Arc::new(accel)
    }

    pub fn set_script(&self, script: Script) {
        self.state.lock().unwrap().script = script;
    }

    pub fn log(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.log().iter().filter(|e| **e == event).count()
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

impl Accelerator for MockAccelerator {
    fn init(&self) {
        self.state.lock().unwrap().initialized = true;
    }

    fn enable_diagnostics(&self) {
        self.state.lock().unwrap().diagnostics = true;
    }

    fn add_remote_engine(&self, desc: &EngineDesc<'_>) -> Result<(), NativeError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_add {
            return Err(NativeError { errno: 2, code: 7 });
        }
        state.servers.push(desc.remote_name.to_owned());
        Ok(())
    }

    fn open(&self, _name: &str) -> Result<Box<dyn Connection>, NativeError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_open {
            return Err(NativeError { errno: 0, code: 3 });
        }
        state.log.push("open");
        Ok(Box::new(MockConnection {
            state: self.state.clone(),
        }))
    }
}

struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl Connection for MockConnection {
    fn create_codec(&self, _identity: &str) -> Option<Box<dyn Codec>> {
        let mut state = self.state.lock().unwrap();
        if state.reject_codec {
            return None;
        }
        state.log.push("create");
        Some(Box::new(MockCodec {
            state: self.state.clone(),
        }))
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.state.lock().unwrap().log.push("close");
    }
}

struct MockCodec {
    state: Arc<Mutex<MockState>>,
}

impl Codec for MockCodec {
    fn process(
        &mut self,
        in_bufs: &InBufDesc<'_>,
        out_bufs: &mut OutBufDesc<'_>,
        in_args: &InArgs,
        out_args: &mut OutArgs,
    ) -> i32 {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.inputs.push(in_bufs.buf[..in_args.num_bytes].to_vec());
        let script = state.script.clone();

        if script.result != PROCESS_EOK {
            if let Some(byte) = script.scribble_on_failure {
                out_bufs.buf.fill(byte);
            }
            out_args.extended_error = script.extended_error;
            return script.result;
        }

        let n = script.payload.len().min(out_bufs.buf.len());
        out_bufs.buf[..n].copy_from_slice(&script.payload[..n]);
        out_args.encoded_buf = EncodedBuf {
            access_mask: script.access,
            buf_size: script.reported.unwrap_or(n as i64),
        };
        PROCESS_EOK
    }
}

impl Drop for MockCodec {
    fn drop(&mut self) {
        self.state.lock().unwrap().log.push("delete");
    }
}

pub fn init(
    accel: &Arc<MockAccelerator>,
    memory: &Arc<RecordingMemory>,
) -> EngineRuntime {
    runtime::init(accel.clone(), memory.clone(), false).expect("runtime init")
}
