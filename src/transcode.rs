// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Per-frame transcode through the bounce buffers.

use crate::{
    accel::{Codec, InArgs, InBufDesc, OutArgs, OutBufDesc, PROCESS_EOK},
    cache,
    error::{EngineError, Region, Result},
    memory::BounceBuffer,
};
use tracing::{trace, trace_span, warn};

/// Transcodes `src` into `dst` and returns the number of bytes written.
///
/// The frame is copied into `src_buf`, handed to `codec` together with the
/// first `dst.len()` bytes of `dst_buf`, and the reported output is copied
/// back into `dst`. `dst_buf` only ever leaks into `dst` after a successful
/// process call.
pub fn transcode_frame(
    codec: &mut dyn Codec,
    src_buf: &mut BounceBuffer,
    dst_buf: &mut BounceBuffer,
    src: &[u8],
    dst: &mut [u8],
) -> Result<usize> {
    let src_size = src.len();
    let capacity = dst.len();
    if src_size > src_buf.len() {
        return Err(EngineError::NoSpace {
            region: Region::Source,
            frame: src_size,
            buffer: src_buf.len(),
        });
    }
    if capacity > dst_buf.len() {
        return Err(EngineError::NoSpace {
            region: Region::Destination,
            frame: capacity,
            buffer: dst_buf.len(),
        });
    }

    let _span = trace_span!("transcode_frame", src_size, capacity).entered();

    src_buf.as_mut_slice()[..src_size].copy_from_slice(src);
    cache::prepare(src_buf, dst_buf);

    let in_args = InArgs {
        num_bytes: src_size,
    };
    let mut out_args = OutArgs::default();
    let result = {
        let in_bufs = InBufDesc {
            buf: &src_buf.as_slice()[..src_size],
        };
        let mut out_bufs = OutBufDesc {
            buf: &mut dst_buf.as_mut_slice()[..capacity],
        };
        codec.process(&in_bufs, &mut out_bufs, &in_args, &mut out_args)
    };
    if result != PROCESS_EOK {
        warn!(
            "codec process({} -> {}) failed: {}/{}",
            src_size, capacity, result, out_args.extended_error
        );
        return Err(EngineError::Process {
            code: result,
            extended: out_args.extended_error,
        });
    }

    cache::complete(dst_buf, out_args.encoded_buf.access_mask);

    let used = output_size(out_args.encoded_buf.buf_size, src_size, capacity);
    trace!(consumed = out_args.bytes_consumed, used, "frame processed");
    dst[..used].copy_from_slice(&dst_buf.as_slice()[..used]);
    Ok(used)
}

/// Clamps the codec reported output size to `[0, capacity]`.
///
/// Oversized reports are truncated to `capacity`, dropping whatever the codec
/// produced past it. Negative reports yield an empty frame.
pub fn output_size(reported: i64, src_size: usize, capacity: usize) -> usize {
    if reported < 0 {
        warn!(
            "codec process({} -> {}) returned negative buffer size {}",
            src_size, capacity, reported
        );
        return 0;
    }
    match usize::try_from(reported) {
        Ok(size) if size <= capacity => size,
        _ => {
            warn!(
                "codec process({} -> {}) returned too large buffer {}, truncated",
                src_size, capacity, reported
            );
            capacity
        }
    }
}
