use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::{CarveError, Result};
use crate::file_media::{DEFAULT_MARGIN, DEFAULT_PAGE_SIZE};
use crate::recursion::RecursionLimits;
use crate::scan::ScanConfig;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Input image (raw disk image, memory dump, any file)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write features here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not carve file headers
    #[arg(long)]
    pub no_components: bool,

    /// Do not carve archive headers
    #[arg(long)]
    pub no_volumes: bool,

    /// Page size, in bytes
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u64,

    /// Lookahead past each page, in bytes
    #[arg(long, default_value_t = DEFAULT_MARGIN)]
    pub margin: u64,

    /// Nested decompressions allowed (0 disables decompression)
    #[arg(long, default_value_t = RecursionLimits::DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Largest decompressed component to scan, in bytes
    #[arg(long, default_value_t = RecursionLimits::DEFAULT_MAX_CHILD_SIZE)]
    pub max_child_size: u64,

    /// Stop scanning a buffer after its first decompressed component
    #[arg(long)]
    pub return_after_found: bool,

    /// Directory for temporary archives handed to the decompressor
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl CliOptions {
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(CarveError::Config("--page-size must be non-zero".into()));
        }
        if usize::try_from(self.page_size.saturating_add(self.margin)).is_err() {
            return Err(CarveError::Config(format!(
                "page of {} bytes plus margin of {} bytes does not fit in memory",
                self.page_size, self.margin
            )));
        }
        if self.no_components && self.no_volumes {
            return Err(CarveError::Config(
                "--no-components and --no-volumes leave nothing to carve".into(),
            ));
        }
        Ok(())
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            find_components: !self.no_components,
            find_volumes: !self.no_volumes,
        }
    }

    /// Without a decompression backend nothing is admitted, so no output
    /// buffers are allocated for components that cannot be unpacked.
    pub fn recursion_limits(&self, can_decompress: bool) -> RecursionLimits {
        let max_depth = if can_decompress { self.max_depth } else { 0 };
        RecursionLimits::new(self.scan_config())
            .max_depth(max_depth)
            .max_child_size(self.max_child_size)
            .return_after_found(self.return_after_found)
    }
}
