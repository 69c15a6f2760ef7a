//! Decompression through the unrar library.
//!
//! unrar only opens complete archives from disk, so the carved bytes are
//! wrapped in a minimal archive: the RAR4 marker, an empty archive header,
//! then everything from the carved file header onwards.
//!
//! unrar always checks the payload CRC and drops the output on a mismatch,
//! so a partly damaged component yields an error rather than partial data.

use std::io::Write;
use std::path::PathBuf;

use tracing::trace;

use super::{DecompressError, Decompressor, Result};
use crate::formats::{CompressionMethod, RAR4_SIGNATURE};
use crate::parsing::build_volume_header;

/// Method byte within a file header.
const METHOD_OFFSET: usize = 25;

/// [`Decompressor`] backed by the `unrar` crate.
#[derive(Debug, Clone, Default)]
pub struct UnrarDecompressor {
    scratch_dir: Option<PathBuf>,
}

impl UnrarDecompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write temporary archives under `dir` instead of the system temp dir.
    pub fn with_scratch_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: Some(dir.into()),
        }
    }

    fn stage(&self, archive: &[u8]) -> Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("rar-carve-").suffix(".rar");
        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(&RAR4_SIGNATURE)?;
        file.write_all(&build_volume_header(0))?;
        file.write_all(archive)?;
        file.flush()?;
        Ok(file)
    }
}

fn backend_error(e: impl std::fmt::Display) -> DecompressError {
    DecompressError::Corrupt(e.to_string())
}

impl Decompressor for UnrarDecompressor {
    fn decompress(&mut self, archive: &[u8], output: &mut [u8]) -> Result<usize> {
        let method = archive.get(METHOD_OFFSET).copied().ok_or(DecompressError::IncompleteData)?;
        if CompressionMethod::from_u8(method).is_none() {
            return Err(DecompressError::UnsupportedMethod(method));
        }

        let staged = self.stage(archive)?;
        let opened = ::unrar::Archive::new(staged.path())
            .open_for_processing()
            .map_err(backend_error)?;
        let entry = opened
            .read_header()
            .map_err(backend_error)?
            .ok_or(DecompressError::IncompleteData)?;
        let (data, _rest) = entry.read().map_err(backend_error)?;

        let written = data.len().min(output.len());
        output[..written].copy_from_slice(&data[..written]);
        trace!(packed = archive.len(), unpacked = written, "unrar extracted component");
        Ok(written)
    }
}
