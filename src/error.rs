//! Error types for the I/O-bearing surface of the carver.
//!
//! Header validation itself never fails with an error: a guard that does not
//! hold simply means "no RAR structure at this offset". [`CarveError`] covers
//! what can go wrong around the scan, such as reading the input image,
//! describing a scan window, or configuring the tool.
//!
//! ## Example
//!
//! ```rust
//! use rar_carve::{CarveError, ScanBuffer};
//!
//! let data = [0u8; 16];
//! match ScanBuffer::new(&data, 32) {
//!     Err(CarveError::InvalidRegion { page_len, len }) => {
//!         assert_eq!((page_len, len), (32, 16));
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use std::fmt;
use std::io;

/// Error type for carving operations.
#[derive(Debug)]
pub enum CarveError {
    /// The scanned page is longer than the buffer it lives in.
    InvalidRegion {
        /// Requested page length.
        page_len: usize,
        /// Actual buffer length (page plus margin).
        len: usize,
    },

    /// A read window falls outside the input media.
    InvalidOffset {
        /// The requested offset.
        offset: u64,
        /// The media length.
        length: u64,
    },

    /// Invalid scan or tool configuration.
    Config(String),

    /// An I/O error occurred.
    Io(io::Error),
}

impl fmt::Display for CarveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegion { page_len, len } => {
                write!(f, "Page length {} exceeds buffer length {}", page_len, len)
            }
            Self::InvalidOffset { offset, length } => {
                write!(f, "Invalid offset: {} (media length: {})", offset, length)
            }
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for CarveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CarveError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, CarveError>;
