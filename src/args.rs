// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_transcode::{config::EngineConfig, image::FourCC, loopback::PASSTHROUGH};
use std::{error::Error, path::PathBuf};

/// Bounce buffer memory source.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum MemorySetting {
    /// Aligned host heap memory
    Host,
    /// Linux DMA heap (CMA) memory
    DmaHeap,
}

/// Command-line arguments for the EdgeFirst Transcode tool.
///
/// Raw frames are read from `--input`, transcoded one by one through the
/// codec engine and appended to `--output`. Arguments can be specified via
/// command line or environment variables.
///
/// # Example
///
/// ```bash
/// # Via command line
/// edgefirst-transcode --input frames.yuyv --output frames.rgbp --src-size 640 480
///
/// # Via environment variables
/// export SERVER_PATH=/lib/firmware/dsp-server.xe674
/// export CODEC=passthrough
/// edgefirst-transcode --input frames.yuyv --output frames.rgbp
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Accelerator server image path
    #[arg(long, env = "SERVER_PATH", default_value = "/lib/firmware/dsp-server.xe674")]
    pub server: String,

    /// Codec identity to create on the accelerator
    #[arg(long, env = "CODEC", default_value = PASSTHROUGH)]
    pub codec: String,

    /// JSON engine configuration, overrides --server and --codec
    #[arg(long, env = "ENGINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Raw input frames file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Transcoded output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Source frame resolution in pixels (width height)
    #[arg(
        long,
        env = "SRC_SIZE",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub src_size: Vec<usize>,

    /// Source pixel format
    #[arg(long, env = "SRC_FORMAT", default_value = "YUYV")]
    pub src_format: FourCC,

    /// Destination frame resolution in pixels (width height)
    #[arg(
        long,
        env = "DST_SIZE",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub dst_size: Vec<usize>,

    /// Destination pixel format
    #[arg(long, env = "DST_FORMAT", default_value = "RGBP")]
    pub dst_format: FourCC,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<usize>,

    /// Bounce buffer memory source
    #[arg(long, env = "MEMORY", default_value = "dma-heap", value_enum)]
    pub memory: MemorySetting,

    /// Enable verbose debug logging and accelerator diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

impl Args {
    pub fn engine_config(&self) -> Result<EngineConfig, Box<dyn Error>> {
        match &self.config {
            Some(path) => EngineConfig::from_file(path),
            None => Ok(EngineConfig::new(&self.server, &self.codec)),
        }
    }
}
