// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::{error::Error, fs::File, path::Path};

/// Session configuration.
///
/// Can be loaded from a JSON document such as:
///
/// ```json
/// { "server_path": "/lib/firmware/dsp-server.xe674", "codec_name": "passthrough" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Server image loaded on the accelerator when the session is opened.
    pub server_path: String,
    /// Codec identity the codec instance is created for on start.
    pub codec_name: String,
}

impl EngineConfig {
    pub fn new(server_path: impl Into<String>, codec_name: impl Into<String>) -> Self {
        Self {
            server_path: server_path.into(),
            codec_name: codec_name.into(),
        }
    }

    pub fn from_file(path: &Path) -> std::result::Result<Self, Box<dyn Error>> {
        let file = File::open(path)?;
        let config: EngineConfig = serde_json::from_reader(file)?;
        Ok(config)
    }

    pub(crate) fn server_path(&self) -> Result<&str> {
        if self.server_path.is_empty() {
            return Err(EngineError::InvalidArgument("empty server path"));
        }
        Ok(&self.server_path)
    }

    pub(crate) fn codec_name(&self) -> Result<&str> {
        if self.codec_name.is_empty() {
            return Err(EngineError::InvalidArgument("empty codec identity"));
        }
        Ok(&self.codec_name)
    }
}
