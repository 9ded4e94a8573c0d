// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Error type for the transcode engine.
//!
//! Every failure maps to a stable `errno` value through
//! [`EngineError::errno`] so callers that speak integer status codes can use
//! [`status`] without parsing messages. Diagnostic detail is written to the
//! tracing stream and is not part of the contract.

use crate::accel::NativeError;
use std::{fmt, os::raw::c_int};

/// Which of the two bounce buffers an error refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Region {
    Source,
    Destination,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Region::Source => write!(f, "source"),
            Region::Destination => write!(f, "destination"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("engine connection already open")]
    AlreadyConnected,

    #[error("engine connection already closed")]
    AlreadyClosed,

    #[error("codec engine already started")]
    AlreadyStarted,

    #[error("engine runtime already initialized")]
    AlreadyInitialized,

    #[error("engine not connected")]
    NotConnected,

    #[error("codec engine not started")]
    NotStarted,

    #[error("failed to allocate {size} byte {region} buffer")]
    OutOfMemory { region: Region, size: usize },

    #[error("failed to register remote engine {server}: {source}")]
    EngineAdd { server: String, source: NativeError },

    #[error("failed to open remote engine {server}: {source}")]
    EngineOpen { server: String, source: NativeError },

    #[error("codec {0} rejected by accelerator")]
    CodecSetup(String),

    #[error("{region} frame of {frame} bytes exceeds {buffer} byte buffer")]
    NoSpace {
        region: Region,
        frame: usize,
        buffer: usize,
    },

    #[error("codec process failed: {code}/{extended}")]
    Process { code: i32, extended: i32 },
}

impl EngineError {
    /// The `errno` value reported to integer-status callers.
    pub fn errno(&self) -> c_int {
        match self {
            Self::InvalidArgument(_) => libc::EINVAL,
            Self::AlreadyConnected
            | Self::AlreadyClosed
            | Self::AlreadyStarted
            | Self::AlreadyInitialized => libc::EALREADY,
            Self::NotConnected | Self::NotStarted => libc::ENOTCONN,
            Self::OutOfMemory { .. } | Self::EngineAdd { .. } | Self::EngineOpen { .. } => {
                libc::ENOMEM
            }
            Self::CodecSetup(_) => libc::EBADRQC,
            Self::NoSpace { .. } => libc::ENOSPC,
            Self::Process { .. } => libc::EILSEQ,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Collapses a result into the integer status domain, `0` meaning success.
pub fn status<T>(res: &Result<T>) -> c_int {
    match res {
        Ok(_) => 0,
        Err(e) => e.errno(),
    }
}
