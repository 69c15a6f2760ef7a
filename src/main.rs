use std::fs::File;
use std::io::{self, BufWriter, Write};

use clap::Parser;
use tracing::info;

use rar_carve::cli::CliOptions;
use rar_carve::decompress::Decompressor;
use rar_carve::{logging, scan_media, LocalFileMedia, TsvSink};

fn decompressor(opts: &CliOptions) -> Box<dyn Decompressor> {
    #[cfg(feature = "unrar")]
    {
        match &opts.scratch_dir {
            Some(dir) => Box::new(rar_carve::UnrarDecompressor::with_scratch_dir(dir)),
            None => Box::new(rar_carve::UnrarDecompressor::new()),
        }
    }

    #[cfg(not(feature = "unrar"))]
    {
        if opts.max_depth > 0 {
            tracing::warn!(
                "built without the unrar feature; compressed components will not be scanned"
            );
        }
        Box::new(rar_carve::NoDecompressor)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = CliOptions::parse();
    logging::init_logging_with_format(opts.log_format);
    opts.validate()?;

    let media = LocalFileMedia::new(&opts.input)?;
    info!(
        input = %opts.input.display(),
        length = media.length(),
        page_size = opts.page_size,
        margin = opts.margin,
        "scanning image"
    );

    let writer: Box<dyn Write> = match &opts.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = TsvSink::new(writer);
    let mut decompressor = decompressor(&opts);
    let mut limits = opts.recursion_limits(cfg!(feature = "unrar"));

    let stats = scan_media(
        &media,
        opts.page_size,
        opts.margin,
        &opts.scan_config(),
        &mut sink,
        decompressor.as_mut(),
        &mut limits,
    )?;
    let written = sink.written();
    sink.finish()?;

    let nested = limits.child_stats();
    info!(
        offsets = stats.offsets,
        volumes = stats.volumes + nested.volumes,
        components = stats.components + nested.components,
        decompressed = stats.decompressed + nested.decompressed,
        duplicates = limits.duplicates(),
        features = written,
        "scan complete"
    );
    Ok(())
}
