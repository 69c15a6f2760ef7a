//! Archive (volume) header validator.
//!
//! The archive header follows the marker header and carries archive-level
//! flags. When carving, only the header-encryption bit is reported.

use super::{le_u16, plausible_header_len, OFFSET_HEAD_FLAGS, OFFSET_HEAD_TYPE};
use crate::crc32::header_crc_matches;
use crate::feature::XmlWriter;

/// Archive header type constant.
pub const VOLUME_HEADER_TYPE: u8 = 0x73; // 115

/// Block headers are encrypted (`rar -hp`).
pub const FLAG_HEADERS_ENCRYPTED: u16 = 0x0080;
/// Bits no RAR 1.5-4.x archiver sets.
const UNUSED_VOLUME_FLAGS: u16 = 0xFE00;

/// A carved archive header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeHeader {
    pub flags: u16,
    pub header_len: u16,
}

impl VolumeHeader {
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_HEADERS_ENCRYPTED != 0
    }

    pub fn to_xml(&self) -> String {
        let mut xml = XmlWriter::new("rar_volume");
        xml.element("encrypted", if self.is_encrypted() { "true" } else { "false" });
        xml.finish()
    }
}

pub struct VolumeHeaderParser;

impl VolumeHeaderParser {
    pub const HEADER_SIZE: usize = 13;

    pub fn try_parse(buffer: &[u8]) -> Option<VolumeHeader> {
        if buffer.len() < Self::HEADER_SIZE {
            return None;
        }
        if buffer[OFFSET_HEAD_TYPE] != VOLUME_HEADER_TYPE {
            return None;
        }

        let flags = le_u16(buffer, OFFSET_HEAD_FLAGS)?;
        if flags & UNUSED_VOLUME_FLAGS != 0 {
            return None;
        }

        let header_len = plausible_header_len(buffer, Self::HEADER_SIZE)?;
        if !header_crc_matches(buffer, header_len) {
            return None;
        }

        Some(VolumeHeader {
            flags,
            header_len: header_len as u16,
        })
    }
}

/// Try to carve an archive header at the start of `buffer`.
pub fn try_parse_volume(buffer: &[u8]) -> Option<VolumeHeader> {
    VolumeHeaderParser::try_parse(buffer)
}
