//! Serialize RAR 1.5-4.x headers with valid checksums.
//!
//! Used to reconstruct a minimal archive around a carved file header (see
//! the `unrar` decompressor), and to produce fixtures for tests, benches and
//! fuzz seeds.

use super::component_header::{COMPONENT_HEADER_TYPE, FLAG_BIG_FILE, FLAG_MANDATORY};
use super::volume_header::VOLUME_HEADER_TYPE;
use super::OFFSET_HEAD_SIZE;
use crate::crc32::crc32;

/// Patch head_size and the 16-bit header CRC into a finished header.
fn seal(mut header: Vec<u8>) -> Vec<u8> {
    let len = header.len() as u16;
    header[OFFSET_HEAD_SIZE..OFFSET_HEAD_SIZE + 2].copy_from_slice(&len.to_le_bytes());
    let crc = crc32(&header[2..]) as u16;
    header[0..2].copy_from_slice(&crc.to_le_bytes());
    header
}

/// 13-byte archive header with the given flags.
pub fn build_volume_header(flags: u16) -> Vec<u8> {
    let mut header = Vec::with_capacity(13);
    header.extend_from_slice(&[0, 0, VOLUME_HEADER_TYPE]);
    header.extend_from_slice(&flags.to_le_bytes());
    header.extend_from_slice(&[0, 0]); // head_size
    header.extend_from_slice(&[0; 6]); // reserved
    seal(header)
}

/// File header builder. High size words are written only when `flags`
/// carries the big-file bit.
#[derive(Debug, Clone)]
pub struct ComponentHeaderBuilder {
    flags: u16,
    packed_size: u64,
    unpacked_size: u64,
    host_os: u8,
    file_crc: u32,
    dos_time: u32,
    unpack_version: u8,
    method: u8,
    attributes: u32,
    name: Vec<u8>,
}

impl ComponentHeaderBuilder {
    pub fn new(name: impl AsRef<[u8]>) -> Self {
        Self {
            flags: FLAG_MANDATORY,
            packed_size: 80,
            unpacked_size: 100,
            host_os: 2,
            file_crc: 0,
            dos_time: 0,
            unpack_version: 29,
            method: 0x33,
            attributes: 0x20,
            name: name.as_ref().to_vec(),
        }
    }

    pub fn name(mut self, name: impl AsRef<[u8]>) -> Self {
        self.name = name.as_ref().to_vec();
        self
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn sizes(mut self, packed: u64, unpacked: u64) -> Self {
        self.packed_size = packed;
        self.unpacked_size = unpacked;
        self
    }

    pub fn method(mut self, method: u8) -> Self {
        self.method = method;
        self
    }

    pub fn host_os(mut self, host_os: u8) -> Self {
        self.host_os = host_os;
        self
    }

    pub fn file_crc(mut self, crc: u32) -> Self {
        self.file_crc = crc;
        self
    }

    pub fn dos_time(mut self, dos_time: u32) -> Self {
        self.dos_time = dos_time;
        self
    }

    pub fn unpack_version(mut self, version: u8) -> Self {
        self.unpack_version = version;
        self
    }

    pub fn attributes(mut self, attributes: u32) -> Self {
        self.attributes = attributes;
        self
    }

    /// Header bytes, head_size covering exactly the fixed part and the name.
    pub fn build(&self) -> Vec<u8> {
        let big_file = self.flags & FLAG_BIG_FILE != 0;
        let mut header = Vec::with_capacity(40 + self.name.len());
        header.extend_from_slice(&[0, 0, COMPONENT_HEADER_TYPE]);
        header.extend_from_slice(&self.flags.to_le_bytes());
        header.extend_from_slice(&[0, 0]); // head_size
        header.extend_from_slice(&(self.packed_size as u32).to_le_bytes());
        header.extend_from_slice(&(self.unpacked_size as u32).to_le_bytes());
        header.push(self.host_os);
        header.extend_from_slice(&self.file_crc.to_le_bytes());
        header.extend_from_slice(&self.dos_time.to_le_bytes());
        header.push(self.unpack_version);
        header.push(self.method);
        header.extend_from_slice(&(self.name.len() as u16).to_le_bytes());
        header.extend_from_slice(&self.attributes.to_le_bytes());
        if big_file {
            header.extend_from_slice(&((self.packed_size >> 32) as u32).to_le_bytes());
            header.extend_from_slice(&((self.unpacked_size >> 32) as u32).to_le_bytes());
        }
        header.extend_from_slice(&self.name);
        seal(header)
    }
}
