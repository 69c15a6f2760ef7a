#![no_main]
use libfuzzer_sys::fuzz_target;
use rar_carve::try_parse_component;

fuzz_target!(|data: &[u8]| {
    let Some(header) = try_parse_component(data) else {
        return;
    };
    assert!(!header.name.is_empty());
    assert!(header.name.bytes().all(|b| b >= 0x20));
    assert!(header.compressed_size > 0 && header.uncompressed_size > 0);
    assert!((header.header_len as usize) < data.len());
    // Records must always render
    let _ = header.to_xml();
});
