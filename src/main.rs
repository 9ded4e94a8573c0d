// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::{Args, MemorySetting};
use clap::Parser;
use edgefirst_transcode::{
    image::ImageDescription,
    loopback::LoopbackAccelerator,
    memory::{HostMemory, MemoryBackend},
    runtime, CodecEngine,
};
#[cfg(target_os = "linux")]
use edgefirst_transcode::memory::DmaHeapMemory;
use std::{
    error::Error,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    sync::Arc,
    thread,
    time::Instant,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, Layer, Registry};

mod args;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let src = ImageDescription::packed(args.src_size[0], args.src_size[1], args.src_format)
        .ok_or_else(|| format!("invalid source frame {:?} {}", args.src_size, args.src_format))?;
    let dst = ImageDescription::packed(args.dst_size[0], args.dst_size[1], args.dst_format)
        .ok_or_else(|| format!("invalid destination frame {:?} {}", args.dst_size, args.dst_format))?;
    let config = args.engine_config()?;

    let memory: Arc<dyn MemoryBackend> = match args.memory {
        MemorySetting::Host => Arc::new(HostMemory::new()),
        #[cfg(target_os = "linux")]
        MemorySetting::DmaHeap => Arc::new(DmaHeapMemory::new()),
        #[cfg(not(target_os = "linux"))]
        MemorySetting::DmaHeap => return Err("dma-heap memory requires Linux".into()),
    };
    let rt = runtime::init(Arc::new(LoopbackAccelerator::new()), memory, args.verbose)?;

    let mut engine = rt.session();
    engine.open(&config)?;
    if let Err(e) = engine.start(&config, &src, &dst) {
        engine.close()?;
        return Err(e.into());
    }
    info!("source {} destination {}", src, dst);

    let res = transcode_file(&mut engine, &args, &src, &dst);

    engine.stop()?;
    engine.close()?;
    drop(engine);
    rt.fini()?;
    res
}

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let stdout_log = tracing_subscriber::fmt::layer().with_filter(level);

    let journald = match tracing_journald::layer() {
        Ok(layer) => Some(layer.with_filter(level)),
        Err(e) => {
            eprintln!("journald unavailable: {}", e);
            None
        }
    };

    let tracy = if args.tracy {
        tracy_client::Client::start();
        Some(tracing_tracy::TracyLayer::default().with_filter(LevelFilter::TRACE))
    } else {
        None
    };

    let subscriber = Registry::default()
        .with(stdout_log)
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn transcode_file(
    engine: &mut CodecEngine,
    args: &Args,
    src: &ImageDescription,
    dst: &ImageDescription,
) -> Result<(), Box<dyn Error>> {
    // Frames are read on their own thread so file I/O overlaps with the
    // accelerator round-trip.
    let (tx, rx) = kanal::bounded::<Vec<u8>>(2);
    let input = args.input.clone();
    let frame_size = src.image_size;
    let limit = args.frames.unwrap_or(usize::MAX);
    let reader = thread::spawn(move || -> io::Result<usize> {
        let mut file = BufReader::new(File::open(input)?);
        let mut count = 0;
        while count < limit {
            let mut frame = vec![0u8; frame_size];
            match file.read_exact(&mut frame) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
            if tx.send(frame).is_err() {
                // transcode side exited
                break;
            }
            count += 1;
        }
        Ok(count)
    });

    let mut output = BufWriter::new(File::create(&args.output)?);
    let mut out = vec![0u8; dst.image_size];
    let mut frames = 0;
    let start = Instant::now();
    while let Ok(frame) = rx.recv() {
        let now = Instant::now();
        let used = engine.transcode_frame(&frame, &mut out)?;
        debug!(frame = frames, used, elapsed = ?now.elapsed(), "frame transcoded");
        if used < out.len() {
            warn!(frame = frames, used, capacity = out.len(), "short frame");
        }
        output.write_all(&out[..used])?;
        frames += 1;
    }
    output.flush()?;

    let read = reader.join().map_err(|_| "frame reader panicked")??;
    info!(frames, read, elapsed = ?start.elapsed(), "transcode complete");
    Ok(())
}
