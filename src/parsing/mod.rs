//! RAR 1.5-4.x header validation.
//!
//! Every block header starts with the same 7-byte prefix:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 2 | low 16 bits of CRC32 over bytes `2..head_size` |
//! | 2 | 1 | header type (`0x73` archive, `0x74` file) |
//! | 3 | 2 | flags |
//! | 5 | 2 | head_size |
//!
//! The parsers here are carving validators: they are meant to be called at
//! every offset of untrusted data and answer `None` for anything that is not
//! a complete, checksummed header.

pub mod builder;
pub mod component_header;
pub mod filename;
pub mod volume_header;

pub use builder::{build_volume_header, ComponentHeaderBuilder};
pub use component_header::{try_parse_component, ComponentHeader, ComponentHeaderParser};
pub use filename::decode_filename;
pub use volume_header::{try_parse_volume, VolumeHeader, VolumeHeaderParser};

pub(crate) const OFFSET_HEAD_TYPE: usize = 2;
pub(crate) const OFFSET_HEAD_FLAGS: usize = 3;
pub(crate) const OFFSET_HEAD_SIZE: usize = 5;

/// Headers longer than this are treated as implausible.
pub const SUSPICIOUS_HEADER_LEN: usize = 1024;

#[inline]
pub(crate) fn le_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

#[inline]
pub(crate) fn le_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Validate the declared head_size against `[min_len, 1024]` and require it
/// to be strictly shorter than the remaining buffer.
#[inline]
pub(crate) fn plausible_header_len(buf: &[u8], min_len: usize) -> Option<usize> {
    let header_len = le_u16(buf, OFFSET_HEAD_SIZE)? as usize;
    if header_len < min_len || header_len > SUSPICIOUS_HEADER_LEN || header_len >= buf.len() {
        return None;
    }
    Some(header_len)
}
