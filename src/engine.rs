// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    accel::Accelerator,
    config::EngineConfig,
    error::{EngineError, Result},
    image::ImageDescription,
    memory::{AllocParams, MemoryBackend},
    pool::BufferPool,
    session::AcceleratorSession,
    transcode,
};
use std::sync::Arc;
use tracing::{info, warn};

/// One transcoding session on the accelerator.
///
/// A session moves through `open`, `start`, any number of
/// `transcode_frame` calls, `stop` and `close`. `start` and `stop` acquire
/// and release the bounce buffers together with the codec instance since
/// the codec works against fixed-size staging buffers.
///
/// # Thread Safety
///
/// `CodecEngine` performs no internal locking. Drive each session from one
/// thread at a time, independent sessions share no state.
///
/// # Example
///
/// ```no_run
/// use edgefirst_transcode::{
///     config::EngineConfig, image::{ImageDescription, RGBP, YUYV},
///     loopback::LoopbackAccelerator, memory::HostMemory, runtime,
/// };
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let rt = runtime::init(Arc::new(LoopbackAccelerator::new()), Arc::new(HostMemory::new()), false)?;
/// let config = EngineConfig::new("/lib/firmware/dsp-server.xe674", "passthrough");
///
/// let mut engine = rt.session();
/// engine.open(&config)?;
/// let src = ImageDescription::packed(320, 240, YUYV).unwrap();
/// let dst = ImageDescription::packed(320, 240, RGBP).unwrap();
/// engine.start(&config, &src, &dst)?;
///
/// let frame = vec![0u8; src.image_size];
/// let mut out = vec![0u8; dst.image_size];
/// let used = engine.transcode_frame(&frame, &mut out)?;
/// println!("transcoded {} bytes", used);
///
/// engine.stop()?;
/// engine.close()?;
/// rt.fini()?;
/// # Ok(())
/// # }
/// ```
pub struct CodecEngine {
    session: AcceleratorSession,
    buffers: BufferPool,
    _runtime: Arc<()>,
}

impl CodecEngine {
    pub(crate) fn new(
        accel: Arc<dyn Accelerator>,
        memory: Arc<dyn MemoryBackend>,
        params: AllocParams,
        runtime: Arc<()>,
    ) -> Self {
        Self {
            session: AcceleratorSession::new(accel),
            buffers: BufferPool::with_params(memory, params),
            _runtime: runtime,
        }
    }

    /// Connects to the remote engine named by `config.server_path`.
    ///
    /// # Errors
    ///
    /// - `EINVAL` if the server path is empty
    /// - `EALREADY` if the session is already connected, the existing
    ///   connection is kept
    /// - `ENOMEM` if registering or opening the remote engine fails
    pub fn open(&mut self, config: &EngineConfig) -> Result<()> {
        let server = config.server_path()?;
        self.session.open(server)?;
        info!(server, "codec engine open");
        Ok(())
    }

    /// Disconnects from the remote engine, stopping the session first if it
    /// is still started.
    pub fn close(&mut self) -> Result<()> {
        if !self.session.is_connected() {
            return Err(EngineError::AlreadyClosed);
        }
        if self.is_started() {
            warn!("closing a started codec engine, stopping it first");
            self.release();
        }
        self.session.close()?;
        info!("codec engine closed");
        Ok(())
    }

    /// Allocates bounce buffers sized for `src` and `dst` frames and creates
    /// the codec named by `config.codec_name`.
    ///
    /// On codec setup failure the buffers are released again before
    /// returning.
    ///
    /// # Errors
    ///
    /// - `ENOTCONN` if the session is not connected
    /// - `EALREADY` if the session is already started
    /// - `ENOMEM` if a bounce buffer cannot be allocated
    /// - `EINVAL` if the codec identity is empty
    /// - `EBADRQC` if the accelerator rejects the codec
    pub fn start(
        &mut self,
        config: &EngineConfig,
        src: &ImageDescription,
        dst: &ImageDescription,
    ) -> Result<()> {
        if !self.session.is_connected() {
            return Err(EngineError::NotConnected);
        }
        if self.is_started() {
            return Err(EngineError::AlreadyStarted);
        }

        self.buffers.allocate(src.image_size, dst.image_size)?;

        let res = config
            .codec_name()
            .and_then(|codec| self.session.setup_codec(codec));
        if let Err(e) = res {
            self.buffers.free();
            return Err(e);
        }

        info!(
            "codec engine start: {}x{} to {}x{}",
            src.width, src.height, dst.width, dst.height
        );
        Ok(())
    }

    /// Releases the codec and the bounce buffers. A connected session that
    /// is not started is left unchanged.
    pub fn stop(&mut self) -> Result<()> {
        if !self.session.is_connected() {
            return Err(EngineError::NotConnected);
        }
        if self.is_started() {
            self.release();
            info!("codec engine stop");
        }
        Ok(())
    }

    /// Transcodes one frame and returns the number of bytes written to
    /// `dst`.
    ///
    /// `src.len()` is the input frame size and `dst.len()` the output
    /// capacity, both must fit the bounce buffers sized on `start`.
    ///
    /// # Errors
    ///
    /// - `ENOTCONN` if the session is not connected or not started
    /// - `ENOSPC` if the frame or the capacity exceeds its bounce buffer,
    ///   nothing is copied
    /// - `EILSEQ` if the codec fails to process the frame, `dst` is left
    ///   untouched
    pub fn transcode_frame(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        if !self.session.is_connected() {
            return Err(EngineError::NotConnected);
        }
        let Some((src_buf, dst_buf)) = self.buffers.buffers_mut() else {
            return Err(EngineError::NotStarted);
        };
        let Some(codec) = self.session.codec_mut() else {
            return Err(EngineError::NotStarted);
        };
        transcode::transcode_frame(codec, src_buf, dst_buf, src, dst)
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn is_started(&self) -> bool {
        self.buffers.is_allocated()
    }

    /// Rounded size of the source bounce buffer, `0` when not started.
    pub fn source_buffer_size(&self) -> usize {
        self.buffers.source_size()
    }

    /// Rounded size of the destination bounce buffer, `0` when not started.
    pub fn destination_buffer_size(&self) -> usize {
        self.buffers.destination_size()
    }

    fn release(&mut self) {
        self.session.release_codec();
        self.buffers.free();
    }
}

impl Drop for CodecEngine {
    fn drop(&mut self) {
        if self.is_started() {
            warn!("codec engine dropped while started");
        }
        if self.session.is_connected() {
            warn!("codec engine dropped while connected");
        }
        // The session closes its connection once the codec is gone.
        self.release();
    }
}
