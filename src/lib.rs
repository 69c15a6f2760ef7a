//! RAR 1.5-4.x header carver.
//!
//! Scans raw, possibly truncated byte buffers (disk images, memory dumps,
//! unallocated space) for RAR archive and file headers, validates each
//! candidate with structural guards and the 16-bit header checksum, and
//! reports every survivor as a feature: a forensic path, a label and a small
//! XML record. Compressed file entries can be handed to a decompressor and
//! the decompressed content scanned again.
//!
//! ## Features
//! - Core library depends only on `tracing`
//! - `parallel` - Carve offsets on the rayon pool
//! - `async` - Async media reading with tokio
//! - `unrar` - Decompress carved components through the unrar library
//! - `cli` - The `rar-carve` binary
//!
//! ## Example
//!
//! ```rust
//! use rar_carve::parsing::ComponentHeaderBuilder;
//! use rar_carve::{scan, Feature, NoDecompressor, NoRecursion, ScanBuffer, ScanConfig};
//!
//! let mut image = vec![0u8; 100];
//! image.extend(ComponentHeaderBuilder::new("notes.txt").build());
//! image.extend([0u8; 80]);
//!
//! let mut features: Vec<Feature> = Vec::new();
//! scan(
//!     &ScanBuffer::whole(&image),
//!     &ScanConfig::default(),
//!     &mut features,
//!     &mut NoDecompressor,
//!     &mut NoRecursion,
//! );
//! assert_eq!(features[0].path.to_string(), "100");
//! assert_eq!(features[0].label, "notes.txt");
//! ```

pub mod crc32;
pub mod decompress;
pub mod error;
pub mod feature;
mod file_media;
pub mod formats;
pub mod parsing;
mod recursion;
pub mod scan;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod logging;

pub use error::{CarveError, Result};
pub use feature::{Feature, FeatureSink, ForensicPath, TsvSink};
pub use file_media::{
    scan_media, LocalFileMedia, PageIter, PageWindow, ReadInterval, DEFAULT_MARGIN,
    DEFAULT_PAGE_SIZE,
};
pub use recursion::RecursionLimits;
pub use scan::{
    collect_matches, scan, CarvedHeader, CarvedMatch, NoRecursion, RecursiveScan, ScanBuffer,
    ScanConfig, ScanStats,
};

#[cfg(feature = "async")]
pub use file_media::{scan_media_async, FileMedia};

// Re-export decompression types
pub use decompress::{DecompressError, Decompressor, NoDecompressor};
#[cfg(feature = "unrar")]
pub use decompress::UnrarDecompressor;

pub use parsing::{try_parse_component, try_parse_volume, ComponentHeader, VolumeHeader};
