#![no_main]
use libfuzzer_sys::fuzz_target;
use rar_carve::crc32::header_crc_matches;
use rar_carve::try_parse_volume;

// Accepted headers must fit in the buffer and carry a matching checksum.
fuzz_target!(|data: &[u8]| {
    if let Some(volume) = try_parse_volume(data) {
        let len = volume.header_len as usize;
        assert!(len >= 13 && len < data.len());
        assert!(header_crc_matches(data, len));
        assert_eq!(try_parse_volume(data), Some(volume));
    }
});
