//! File (component) header validator.
//!
//! Each file stored in a RAR archive has a file header describing its name,
//! sizes, compression method, etc. Carving accepts a file header only if it
//! is self-consistent and its header CRC matches.
//!
//! Layout (little-endian):
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 7 | 4 | packed size (low) |
//! | 11 | 4 | unpacked size (low) |
//! | 15 | 1 | host OS |
//! | 16 | 4 | file CRC32 |
//! | 20 | 4 | DOS date/time |
//! | 24 | 1 | version needed to unpack |
//! | 25 | 1 | method |
//! | 26 | 2 | name size |
//! | 28 | 4 | attributes |
//! | 32 | 8 | high packed/unpacked size (big-file flag only) |
//! | 32/40 | name size | filename |

use super::{
    decode_filename, le_u16, le_u32, plausible_header_len, OFFSET_HEAD_FLAGS, OFFSET_HEAD_TYPE,
    SUSPICIOUS_HEADER_LEN,
};
use crate::crc32::header_crc_matches;
use crate::feature::XmlWriter;
use crate::formats::{
    compression_method_label, decode_dos_datetime, host_os_label, CompressionMethod,
};

/// File header type constant.
pub const COMPONENT_HEADER_TYPE: u8 = 0x74; // 116

pub const FLAG_CONT_PREV: u16 = 0x0001;
pub const FLAG_CONT_NEXT: u16 = 0x0002;
pub const FLAG_ENCRYPTED: u16 = 0x0004;
pub const FLAG_SOLID: u16 = 0x0010;
pub const FLAG_BIG_FILE: u16 = 0x0100;
pub const FLAG_UNICODE_NAME: u16 = 0x0200;
pub const FLAG_EXT_TIME: u16 = 0x1000;
/// Set in every file header (LONG_BLOCK).
pub const FLAG_MANDATORY: u16 = 0x8000;
const UNUSED_COMPONENT_FLAGS: u16 = 0x6000;

const OFFSET_PACK_SIZE: usize = 7;
const OFFSET_UNP_SIZE: usize = 11;
const OFFSET_HOST_OS: usize = 15;
const OFFSET_FILE_CRC: usize = 16;
const OFFSET_FTIME: usize = 20;
const OFFSET_UNP_VER: usize = 24;
const OFFSET_METHOD: usize = 25;
const OFFSET_NAME_SIZE: usize = 26;
const OFFSET_ATTR: usize = 28;
const OFFSET_HIGH_PACK_SIZE: usize = 32;
const OFFSET_HIGH_UNP_SIZE: usize = 36;
const OFFSET_FILE_NAME: usize = 32;
/// Extra bytes before the name when the high size fields are present.
const BIG_FILE_EXTRA_LEN: usize = 8;

/// Sizes above 10 TiB are treated as garbage.
pub const SUSPICIOUS_FILE_LEN: u64 = 10 * 1024 * 1024 * 1024 * 1024;

/// A carved file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentHeader {
    pub name: String,
    pub flags: u16,
    pub unpack_version: u8,
    pub compression_method: u8,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub file_attributes: u32,
    pub dos_time: u32,
    pub host_os: u8,
    /// CRC32 of the unpacked file as declared by the archive; not verified.
    pub crc: u32,
    pub header_len: u16,
}

impl ComponentHeader {
    pub fn unpack_version_major(&self) -> u8 {
        self.unpack_version / 10
    }

    pub fn unpack_version_minor(&self) -> u8 {
        self.unpack_version % 10
    }

    pub fn is_big_file(&self) -> bool {
        self.flags & FLAG_BIG_FILE != 0
    }

    pub fn is_solid(&self) -> bool {
        self.flags & FLAG_SOLID != 0
    }

    /// Whether the payload has to go through a decompressor.
    pub fn is_compressed(&self) -> bool {
        CompressionMethod::from_u8(self.compression_method) != Some(CompressionMethod::Uncompressed)
    }

    pub fn compression_method_label(&self) -> String {
        compression_method_label(self.compression_method)
    }

    pub fn host_os_label(&self) -> String {
        host_os_label(self.host_os)
    }

    /// Last-modified time as `YYYY-MM-DDThh:mm:ssZ`.
    pub fn last_modified(&self) -> String {
        decode_dos_datetime(self.dos_time)
    }

    pub fn to_xml(&self) -> String {
        let mut xml = XmlWriter::new("rar_component");
        xml.element("name", &self.name);
        xml.element("flags", format_args!("0x{:04X}", self.flags));
        xml.element("version", self.unpack_version);
        xml.element("compression_method", self.compression_method_label());
        xml.element("uncompr_size", self.uncompressed_size);
        xml.element("compr_size", self.compressed_size);
        xml.element("file_attr", format_args!("0x{:X}", self.file_attributes));
        xml.element("lastmoddate", self.last_modified());
        xml.element("host_os", self.host_os_label());
        xml.element("crc32", format_args!("0x{:08X}", self.crc));
        xml.finish()
    }
}

/// Packed size must not exceed the unpacked size by more than 1/0.95.
///
/// `packed * 0.95 > unpacked` in integer form.
#[inline]
fn ratio_is_plausible(packed: u64, unpacked: u64) -> bool {
    u128::from(packed) * 19 <= u128::from(unpacked) * 20
}

pub struct ComponentHeaderParser;

impl ComponentHeaderParser {
    /// Minimum fixed header size before filename.
    pub const MIN_HEADER_SIZE: usize = 32;

    pub fn try_parse(buffer: &[u8]) -> Option<ComponentHeader> {
        if buffer.len() < Self::MIN_HEADER_SIZE {
            return None;
        }
        if buffer[OFFSET_HEAD_TYPE] != COMPONENT_HEADER_TYPE {
            return None;
        }

        let flags = le_u16(buffer, OFFSET_HEAD_FLAGS)?;
        if flags & FLAG_MANDATORY == 0 || flags & UNUSED_COMPONENT_FLAGS != 0 {
            return None;
        }
        // Split and encrypted files cannot be carved on their own
        if flags & (FLAG_CONT_PREV | FLAG_CONT_NEXT | FLAG_ENCRYPTED) != 0 {
            return None;
        }

        let header_len = plausible_header_len(buffer, Self::MIN_HEADER_SIZE)?;

        let name_len = le_u16(buffer, OFFSET_NAME_SIZE)? as usize;
        if name_len > SUSPICIOUS_HEADER_LEN {
            return None;
        }

        let big_file = flags & FLAG_BIG_FILE != 0;
        let mut compressed_size = u64::from(le_u32(buffer, OFFSET_PACK_SIZE)?);
        let mut uncompressed_size = u64::from(le_u32(buffer, OFFSET_UNP_SIZE)?);
        if big_file {
            compressed_size += u64::from(le_u32(buffer, OFFSET_HIGH_PACK_SIZE)?) << 32;
            uncompressed_size += u64::from(le_u32(buffer, OFFSET_HIGH_UNP_SIZE)?) << 32;
        }
        if compressed_size == 0
            || uncompressed_size == 0
            || compressed_size > SUSPICIOUS_FILE_LEN
            || uncompressed_size > SUSPICIOUS_FILE_LEN
            || !ratio_is_plausible(compressed_size, uncompressed_size)
        {
            return None;
        }

        let name_start = if big_file {
            OFFSET_FILE_NAME + BIG_FILE_EXTRA_LEN
        } else {
            OFFSET_FILE_NAME
        };
        let region = buffer.get(name_start..name_start + name_len)?;
        let name = decode_filename(region, flags & FLAG_UNICODE_NAME != 0)?;

        if !header_crc_matches(buffer, header_len) {
            return None;
        }

        Some(ComponentHeader {
            name,
            flags,
            unpack_version: buffer[OFFSET_UNP_VER],
            compression_method: buffer[OFFSET_METHOD],
            uncompressed_size,
            compressed_size,
            file_attributes: le_u32(buffer, OFFSET_ATTR)?,
            dos_time: le_u32(buffer, OFFSET_FTIME)?,
            host_os: buffer[OFFSET_HOST_OS],
            crc: le_u32(buffer, OFFSET_FILE_CRC)?,
            header_len: header_len as u16,
        })
    }
}

/// Try to carve a file header at the start of `buffer`.
pub fn try_parse_component(buffer: &[u8]) -> Option<ComponentHeader> {
    ComponentHeaderParser::try_parse(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::DosDateTime;
    use crate::parsing::ComponentHeaderBuilder;

    /// Builder output followed by `trailing` payload bytes.
    fn carve(builder: &ComponentHeaderBuilder, trailing: usize) -> Option<ComponentHeader> {
        let mut buf = builder.build();
        buf.resize(buf.len() + trailing, 0xAA);
        try_parse_component(&buf)
    }

    fn sample() -> ComponentHeaderBuilder {
        ComponentHeaderBuilder::new("docs/readme.txt")
            .sizes(1200, 4096)
            .method(0x33)
            .host_os(2)
            .file_crc(0xDEADBEEF)
            .attributes(0x20)
            .unpack_version(29)
            .dos_time(
                DosDateTime {
                    year: 2001,
                    month: 2,
                    day: 3,
                    hour: 4,
                    minute: 5,
                    second: 6,
                }
                .to_packed(),
            )
    }

    #[test]
    fn test_parse_file_header() {
        let header = carve(&sample(), 1).unwrap();
        assert_eq!(header.name, "docs/readme.txt");
        assert_eq!(header.flags, FLAG_MANDATORY);
        assert_eq!(header.compressed_size, 1200);
        assert_eq!(header.uncompressed_size, 4096);
        assert_eq!(header.crc, 0xDEADBEEF);
        assert_eq!(header.file_attributes, 0x20);
        assert_eq!(header.host_os_label(), "Windows");
        assert_eq!(header.compression_method_label(), "normal");
        assert_eq!(header.unpack_version_major(), 2);
        assert_eq!(header.unpack_version_minor(), 9);
        assert_eq!(header.last_modified(), "2001-02-03T04:05:06Z");
        assert_eq!(header.header_len as usize, 32 + "docs/readme.txt".len());
        assert!(header.is_compressed());
    }

    #[test]
    fn test_to_xml() {
        let header = carve(&sample().name("R&D <1>.txt"), 1).unwrap();
        assert_eq!(
            header.to_xml(),
            "<rar_component><name>R&amp;D &lt;1&gt;.txt</name><flags>0x8000</flags>\
             <version>29</version><compression_method>normal</compression_method>\
             <uncompr_size>4096</uncompr_size><compr_size>1200</compr_size>\
             <file_attr>0x20</file_attr><lastmoddate>2001-02-03T04:05:06Z</lastmoddate>\
             <host_os>Windows</host_os><crc32>0xDEADBEEF</crc32></rar_component>"
        );
    }

    #[test]
    fn test_short_buffers_rejected() {
        let buf = sample().build();
        for len in 0..ComponentHeaderParser::MIN_HEADER_SIZE {
            assert!(try_parse_component(&buf[..len]).is_none());
        }
    }

    #[test]
    fn test_header_must_be_shorter_than_buffer() {
        assert!(carve(&sample(), 0).is_none());
        assert!(carve(&sample(), 1).is_some());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let mut buf = sample().build();
        buf.push(0);
        for tag in [0x00, 0x72, 0x73, 0x75, 0x7B, 0xFF] {
            buf[2] = tag;
            assert!(try_parse_component(&buf).is_none());
        }
    }

    #[test]
    fn test_flag_guards() {
        assert!(carve(&sample().flags(0), 1).is_none());
        assert!(carve(&sample().flags(FLAG_MANDATORY | 0x2000), 1).is_none());
        assert!(carve(&sample().flags(FLAG_MANDATORY | 0x4000), 1).is_none());
        assert!(carve(&sample().flags(FLAG_MANDATORY | FLAG_CONT_PREV), 1).is_none());
        assert!(carve(&sample().flags(FLAG_MANDATORY | FLAG_CONT_NEXT), 1).is_none());
        assert!(carve(&sample().flags(FLAG_MANDATORY | FLAG_ENCRYPTED), 1).is_none());

        let solid = carve(&sample().flags(FLAG_MANDATORY | FLAG_SOLID | FLAG_EXT_TIME), 1).unwrap();
        assert!(solid.is_solid());
    }

    #[test]
    fn test_zero_and_huge_sizes_rejected() {
        assert!(carve(&sample().sizes(0, 10), 1).is_none());
        assert!(carve(&sample().sizes(10, 0), 1).is_none());

        let big = sample().flags(FLAG_MANDATORY | FLAG_BIG_FILE);
        assert!(carve(&big.clone().sizes(1, SUSPICIOUS_FILE_LEN), 1).is_some());
        assert!(carve(&big.clone().sizes(1, SUSPICIOUS_FILE_LEN + 1), 1).is_none());
        assert!(carve(&big.sizes(SUSPICIOUS_FILE_LEN + 1, SUSPICIOUS_FILE_LEN), 1).is_none());
    }

    #[test]
    fn test_ratio_guard_boundary() {
        // Rejected only when packed * 0.95 > unpacked
        assert!(carve(&sample().sizes(95, 100), 1).is_some());
        assert!(carve(&sample().sizes(96, 100), 1).is_some());
        assert!(carve(&sample().sizes(105, 100), 1).is_some());
        assert!(carve(&sample().sizes(106, 100), 1).is_none());
        // 20 * 0.95 == 19 exactly: not greater, so accepted
        assert!(carve(&sample().sizes(20, 19), 1).is_some());
        assert!(carve(&sample().sizes(21, 19), 1).is_none());

        assert!(ratio_is_plausible(20, 19));
        assert!(!ratio_is_plausible(21, 19));
        assert!(ratio_is_plausible(SUSPICIOUS_FILE_LEN, SUSPICIOUS_FILE_LEN));
    }

    #[test]
    fn test_big_file_size_assembly() {
        let big = sample()
            .flags(FLAG_MANDATORY | FLAG_BIG_FILE)
            .sizes((2 << 32) + 7, (3 << 32) + 9);
        let header = carve(&big, 1).unwrap();
        assert_eq!(header.compressed_size, (2u64 << 32) + 7);
        assert_eq!(header.uncompressed_size, (3u64 << 32) + 9);
        assert!(header.is_big_file());
        assert_eq!(header.name, "docs/readme.txt");
        assert_eq!(header.header_len as usize, 40 + "docs/readme.txt".len());
    }

    #[test]
    fn test_high_bytes_ignored_without_big_file_flag() {
        // Name region starts at 32, where the high size words would live
        let header = carve(&sample().name("\u{7F}\u{7F}\u{7F}\u{7F}zzzz.bin"), 1).unwrap();
        assert_eq!(header.compressed_size, 1200);
        assert_eq!(header.uncompressed_size, 4096);
    }

    #[test]
    fn test_big_file_name_offset() {
        let mut buf = sample()
            .flags(FLAG_MANDATORY | FLAG_BIG_FILE)
            .sizes(5, 50)
            .name("a.bin")
            .build();
        buf.push(0);
        assert_eq!(&buf[40..45], b"a.bin");
        assert_eq!(try_parse_component(&buf).unwrap().name, "a.bin");
    }

    #[test]
    fn test_name_length_guard() {
        let long = "n".repeat(SUSPICIOUS_HEADER_LEN + 1);
        assert!(carve(&sample().name(&long), 1).is_none());
    }

    #[test]
    fn test_name_past_buffer_rejected() {
        // Declared name runs past head_size and the end of the buffer
        let mut buf = sample().build();
        buf.push(0);
        buf[26..28].copy_from_slice(&200u16.to_le_bytes());
        let crc = crate::crc32::crc32(&buf[2..buf.len() - 1]) as u16;
        buf[0..2].copy_from_slice(&crc.to_le_bytes());
        assert!(try_parse_component(&buf).is_none());
    }

    #[test]
    fn test_unicode_filename_decoding() {
        let unicode = FLAG_MANDATORY | FLAG_UNICODE_NAME;
        let header = carve(&sample().flags(unicode).name(b"ascii\x00\xC3\xA9clair"), 1).unwrap();
        assert_eq!(header.name, "éclair");

        let header = carve(&sample().flags(unicode).name("日本語.txt"), 1).unwrap();
        assert_eq!(header.name, "日本語.txt");

        assert!(carve(&sample().flags(unicode).name(b"ascii\x00"), 1).is_none());
        assert!(carve(&sample().flags(unicode).name(b"ascii\x00\xC3"), 1).is_none());
    }

    #[test]
    fn test_control_characters_rejected() {
        assert!(carve(&sample().name("tab\there"), 1).is_none());
        assert!(carve(&sample().name(b"nul\x00name"), 1).is_none());
    }

    #[test]
    fn test_every_bit_flip_rejected() {
        let mut buf = sample().build();
        buf.push(0);
        let header_len = buf.len() - 1;
        for byte in 2..header_len {
            for bit in 0..8 {
                let mut corrupt = buf.clone();
                corrupt[byte] ^= 1 << bit;
                assert!(
                    try_parse_component(&corrupt).is_none(),
                    "flip byte {byte} bit {bit} accepted"
                );
            }
        }
        // Bytes past head_size are not covered by the checksum
        let mut trailing = buf.clone();
        trailing[header_len] ^= 0xFF;
        assert!(try_parse_component(&trailing).is_some());
    }

    #[test]
    fn test_stored_checksum_must_match() {
        let mut buf = sample().build();
        buf.push(0);
        buf[0] ^= 0x01;
        assert!(try_parse_component(&buf).is_none());
    }

    #[test]
    fn test_idempotent() {
        let mut buf = sample().build();
        buf.extend_from_slice(&[0x55; 64]);
        let first = try_parse_component(&buf);
        let second = try_parse_component(&buf);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_uncompressed_method() {
        let header = carve(&sample().method(0x30).sizes(100, 100), 1).unwrap();
        assert!(!header.is_compressed());
        assert_eq!(header.compression_method_label(), "uncompressed");
    }
}
