//! CRC32 calculation for RAR header validation.
//!
//! RAR 1.5-4.x stores the low 16 bits of a standard CRC-32 in the first two
//! bytes of every block header. The checksum covers the header from its type
//! byte (offset 2) up to the declared header length.

/// CRC32 lookup table (polynomial 0x04C11DB7, reflected as 0xEDB88320)
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Offset of the header type byte, where checksummed data begins.
const CHECKSUM_START: usize = 2;

/// Incremental CRC32 state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    pub const fn new() -> Self {
        Self { state: 0xFFFFFFFF }
    }

    pub fn update(mut self, data: &[u8]) -> Self {
        for &byte in data {
            let index = ((self.state ^ byte as u32) & 0xFF) as usize;
            self.state = (self.state >> 8) ^ CRC32_TABLE[index];
        }
        self
    }

    pub const fn finalize(self) -> u32 {
        self.state ^ 0xFFFFFFFF
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate CRC32 of data (standard RAR CRC32)
pub fn crc32(data: &[u8]) -> u32 {
    Crc32::new().update(data).finalize()
}

/// Check the stored 16-bit header checksum against `buf[2..header_len)`.
///
/// Callers guarantee `CHECKSUM_START < header_len <= buf.len()`.
pub fn header_crc_matches(buf: &[u8], header_len: usize) -> bool {
    let stored = u16::from_le_bytes([buf[0], buf[1]]);
    let computed = crc32(&buf[CHECKSUM_START..header_len]);
    stored == (computed & 0xFFFF) as u16
}
