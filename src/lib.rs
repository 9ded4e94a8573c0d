// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # EdgeFirst Transcode Engine
//!
//! This library bridges a frame producer and a DSP hosted transcoding codec
//! on platforms where host and accelerator have separate views of memory.
//! The accelerator cannot operate on arbitrary host memory, so every frame
//! is staged through alignment-constrained bounce buffers with explicit cache
//! maintenance before and after the accelerator touches them.
//!
//! ## Features
//!
//! - **Bounce Buffers**: Aligned source and destination buffers allocated
//!   from accelerator visible memory (Linux DMA heaps or host memory) and
//!   released with the exact policy they were allocated with.
//! - **Cache Coherency**: Whole-buffer writeback and invalidate around each
//!   accelerator call.
//! - **Session Lifecycle**: `open`, `start`, `transcode_frame`, `stop` and
//!   `close` with atomic rollback of partially acquired resources.
//! - **Pluggable Accelerator**: The runtime, connection and codec are traits,
//!   a software [`loopback`] accelerator is provided for development hosts.
//! - **Integer Status**: Every error maps to an `errno` value for callers
//!   that speak status codes.
//!
//! ## Example
//!
//! ```no_run
//! use edgefirst_transcode::{
//!     config::EngineConfig,
//!     image::{ImageDescription, RGBP, YUYV},
//!     loopback::LoopbackAccelerator,
//!     memory::HostMemory,
//!     runtime,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rt = runtime::init(
//!     Arc::new(LoopbackAccelerator::new()),
//!     Arc::new(HostMemory::new()),
//!     false,
//! )?;
//!
//! let config = EngineConfig::new("/lib/firmware/dsp-server.xe674", "passthrough");
//! let src = ImageDescription::packed(640, 480, YUYV).unwrap();
//! let dst = ImageDescription::packed(640, 480, RGBP).unwrap();
//!
//! let mut engine = rt.session();
//! engine.open(&config)?;
//! engine.start(&config, &src, &dst)?;
//!
//! let frame = vec![0u8; src.image_size];
//! let mut out = vec![0u8; dst.image_size];
//! engine.transcode_frame(&frame, &mut out)?;
//!
//! engine.stop()?;
//! engine.close()?;
//! drop(engine);
//! rt.fini()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Requirements
//!
//! - **Linux**: DMA heap support (`/dev/dma_heap/linux,cma`) for
//!   [`memory::DmaHeapMemory`]
//!
//! ## Safety
//!
//! This library uses `unsafe` code to manage raw accelerator memory regions.
//! All unsafe operations are isolated to the [`memory`] module and wrapped
//! with safe APIs.

pub mod accel;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod image;
pub mod loopback;
pub mod memory;
pub mod pool;
pub mod runtime;
pub mod session;
pub mod transcode;

pub use engine::CodecEngine;
pub use error::{status, EngineError, Result};
