//! Decompression of carved components.
//!
//! The carver never decodes LZSS/PPMd itself. It hands the bytes starting at
//! a carved file header to a [`Decompressor`], which must locate the packed
//! data after the header and fill the output buffer.
//!
//! ## Backends
//!
//! | Backend | Feature | Behaviour |
//! |---------|---------|-----------|
//! | [`NoDecompressor`] | (none) | Always fails; carving still reports headers |
//! | `UnrarDecompressor` | `unrar` | Extracts through the unrar library |
//!
//! Any `FnMut(&[u8], &mut [u8]) -> Result<usize>` closure is also a
//! decompressor, which keeps the scan loop testable with stubs:
//!
//! ```rust
//! use rar_carve::decompress::{DecompressError, Decompressor};
//!
//! let mut fill = |_archive: &[u8], out: &mut [u8]| -> Result<usize, DecompressError> {
//!     out.fill(b'x');
//!     Ok(out.len())
//! };
//! let mut out = [0u8; 4];
//! assert_eq!(fill.decompress(&[], &mut out).unwrap(), 4);
//! ```

#[cfg(feature = "unrar")]
mod unrar;

#[cfg(feature = "unrar")]
#[cfg_attr(docsrs, doc(cfg(feature = "unrar")))]
pub use self::unrar::UnrarDecompressor;

use std::fmt;
use std::io;

/// Decompression errors.
#[derive(Debug)]
pub enum DecompressError {
    /// No decompression backend is available.
    Unsupported,
    UnsupportedMethod(u8),
    /// The carved data ends before the packed stream does.
    IncompleteData,
    /// The backend rejected the data.
    Corrupt(String),
    Io(io::Error),
}

impl fmt::Display for DecompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "No decompression backend available"),
            Self::UnsupportedMethod(m) => write!(f, "Unsupported compression method: 0x{:02x}", m),
            Self::IncompleteData => write!(f, "Incomplete compressed data"),
            Self::Corrupt(msg) => write!(f, "Corrupt compressed data: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for DecompressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DecompressError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, DecompressError>;

/// Injected decompression capability.
pub trait Decompressor {
    /// Decompress the component whose header starts at `archive[0]`.
    ///
    /// `archive` runs to the end of the scanned buffer; `output` is sized to
    /// the header's declared unpacked size. Returns the number of bytes
    /// written.
    fn decompress(&mut self, archive: &[u8], output: &mut [u8]) -> Result<usize>;
}

impl<F> Decompressor for F
where
    F: FnMut(&[u8], &mut [u8]) -> Result<usize>,
{
    fn decompress(&mut self, archive: &[u8], output: &mut [u8]) -> Result<usize> {
        self(archive, output)
    }
}

/// Backend used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDecompressor;

impl Decompressor for NoDecompressor {
    fn decompress(&mut self, _archive: &[u8], _output: &mut [u8]) -> Result<usize> {
        Err(DecompressError::Unsupported)
    }
}
