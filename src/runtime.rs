// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Process-wide accelerator runtime.
//!
//! The accelerator runtime is initialized once per process with [`init`],
//! before any session exists, and torn down with [`EngineRuntime::fini`]
//! after the last session is gone. Sessions can only be created from an
//! initialized [`EngineRuntime`].

use crate::{
    accel::Accelerator,
    engine::CodecEngine,
    error::{EngineError, Result},
    memory::{AllocParams, MemoryBackend},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info, warn};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

pub struct EngineRuntime {
    accel: Arc<dyn Accelerator>,
    memory: Arc<dyn MemoryBackend>,
    params: AllocParams,
    sessions: Arc<()>,
}

/// Initializes the accelerator runtime for this process.
///
/// With `verbose` the runtime's diagnostic channels are enabled as well.
/// Returns `EALREADY` if a runtime is already initialized.
pub fn init(
    accel: Arc<dyn Accelerator>,
    memory: Arc<dyn MemoryBackend>,
    verbose: bool,
) -> Result<EngineRuntime> {
    if INITIALIZED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(EngineError::AlreadyInitialized);
    }

    accel.init();
    if verbose {
        accel.enable_diagnostics();
    }
    info!(verbose, "engine runtime initialized");

    Ok(EngineRuntime {
        accel,
        memory,
        params: AllocParams::bounce(),
        sessions: Arc::new(()),
    })
}

impl EngineRuntime {
    /// Whether a runtime is currently initialized in this process.
    pub fn is_initialized() -> bool {
        INITIALIZED.load(Ordering::Acquire)
    }

    /// Creates a new, disconnected session.
    pub fn session(&self) -> CodecEngine {
        CodecEngine::new(
            self.accel.clone(),
            self.memory.clone(),
            self.params,
            self.sessions.clone(),
        )
    }

    /// Number of sessions created from this runtime that are still alive.
    pub fn live_sessions(&self) -> usize {
        Arc::strong_count(&self.sessions) - 1
    }

    /// Tears the runtime down.
    pub fn fini(self) -> Result<()> {
        let live = self.live_sessions();
        if live > 0 {
            warn!(live, "engine runtime finalized with live sessions");
        }
        Ok(())
    }
}

impl Drop for EngineRuntime {
    fn drop(&mut self) {
        INITIALIZED.store(false, Ordering::Release);
        debug!("engine runtime finalized");
    }
}
