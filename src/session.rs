// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    accel::{Accelerator, Codec, Connection, EngineDesc, ENGINE_NAME},
    error::{EngineError, Result},
};
use std::sync::Arc;
use tracing::{debug, error};

/// Connection to the remote engine and the codec instance bound to it.
///
/// The codec is always released before the connection it was created on.
pub struct AcceleratorSession {
    accel: Arc<dyn Accelerator>,
    codec: Option<Box<dyn Codec>>,
    connection: Option<Box<dyn Connection>>,
}

impl AcceleratorSession {
    pub fn new(accel: Arc<dyn Accelerator>) -> Self {
        Self {
            accel,
            codec: None,
            connection: None,
        }
    }

    /// Registers the remote engine for `server_path` and connects to it.
    pub fn open(&mut self, server_path: &str) -> Result<()> {
        if self.connection.is_some() {
            return Err(EngineError::AlreadyConnected);
        }

        let desc = EngineDesc {
            name: ENGINE_NAME,
            remote_name: server_path,
        };
        if let Err(e) = self.accel.add_remote_engine(&desc) {
            error!(server = server_path, "add remote engine failed: {}", e);
            return Err(EngineError::EngineAdd {
                server: server_path.to_owned(),
                source: e,
            });
        }

        match self.accel.open(ENGINE_NAME) {
            Ok(connection) => {
                self.connection = Some(connection);
                debug!(server = server_path, "engine connection opened");
                Ok(())
            }
            Err(e) => {
                error!(server = server_path, "engine open failed: {}", e);
                Err(EngineError::EngineOpen {
                    server: server_path.to_owned(),
                    source: e,
                })
            }
        }
    }

    pub fn close(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            return Err(EngineError::AlreadyClosed);
        };
        self.release_codec();
        drop(connection);
        debug!("engine connection closed");
        Ok(())
    }

    /// Creates the codec instance for `identity` on the open connection.
    ///
    /// Only the identity is passed, the codec is not told about frame
    /// formats or resolutions.
    pub fn setup_codec(&mut self, identity: &str) -> Result<()> {
        let Some(connection) = self.connection.as_ref() else {
            return Err(EngineError::NotConnected);
        };
        if identity.is_empty() {
            return Err(EngineError::InvalidArgument("empty codec identity"));
        }

        match connection.create_codec(identity) {
            Some(codec) => {
                self.release_codec();
                self.codec = Some(codec);
                debug!(codec = identity, "codec created");
                Ok(())
            }
            None => {
                error!(codec = identity, "codec create failed");
                Err(EngineError::CodecSetup(identity.to_owned()))
            }
        }
    }

    /// Deletes the codec instance, if any.
    pub fn release_codec(&mut self) {
        if self.codec.take().is_some() {
            debug!("codec released");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn has_codec(&self) -> bool {
        self.codec.is_some()
    }

    pub fn codec_mut(&mut self) -> Option<&mut (dyn Codec + 'static)> {
        self.codec.as_deref_mut()
    }
}

impl Drop for AcceleratorSession {
    fn drop(&mut self) {
        self.release_codec();
        self.connection.take();
    }
}
