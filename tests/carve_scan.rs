//! End-to-end carving over synthetic images.

use std::io::Write;

use rar_carve::decompress::{DecompressError, Result as DecompressResult};
use rar_carve::formats::RAR4_SIGNATURE;
use rar_carve::parsing::component_header::{FLAG_BIG_FILE, FLAG_MANDATORY, FLAG_UNICODE_NAME};
use rar_carve::parsing::{build_volume_header, ComponentHeaderBuilder};
use rar_carve::{
    scan, scan_media, Feature, LocalFileMedia, NoDecompressor, NoRecursion, RecursionLimits,
    ScanBuffer, ScanConfig, TsvSink,
};

/// A real RAR 2.9 archive header (flags 0, head_size 13).
const REAL_ARCHIVE_HEADER: [u8; 13] = [
    0xCF, 0x90, 0x73, 0x00, 0x00, 0x0D, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

fn carve_all(image: &[u8]) -> Vec<Feature> {
    let mut features = Vec::new();
    scan(
        &ScanBuffer::whole(image),
        &ScanConfig::default(),
        &mut features,
        &mut NoDecompressor,
        &mut NoRecursion,
    );
    features
}

/// Archive fragment: marker, real archive header, file header and payload.
fn fragment(header: Vec<u8>, payload_len: usize) -> Vec<u8> {
    let mut data = RAR4_SIGNATURE.to_vec();
    data.extend_from_slice(&REAL_ARCHIVE_HEADER);
    data.extend(header);
    data.extend(std::iter::repeat(0xA5).take(payload_len));
    data
}

#[test]
fn test_real_archive_header_is_carved() {
    let image = fragment(ComponentHeaderBuilder::new("a.txt").build(), 80);
    let features = carve_all(&image);
    assert_eq!(features[0].path.to_string(), "7");
    assert_eq!(features[0].label, "<volume>");
    assert_eq!(
        features[0].record,
        "<rar_volume><encrypted>false</encrypted></rar_volume>"
    );
}

#[test]
fn test_component_record() {
    let header = ComponentHeaderBuilder::new("docs/<draft> & notes.txt")
        .sizes(950, 1000)
        .method(0x33)
        .host_os(2)
        .file_crc(0xDEADBEEF)
        .attributes(0x20)
        .dos_time((21 << 25) | (2 << 21) | (3 << 16) | (4 << 11) | (5 << 5) | 3)
        .unpack_version(29)
        .build();
    let features = carve_all(&fragment(header, 950));
    assert_eq!(features.len(), 2);

    let component = &features[1];
    assert_eq!(component.path.to_string(), "20");
    assert_eq!(component.label, "docs/<draft> & notes.txt");
    assert_eq!(
        component.record,
        "<rar_component>\
         <name>docs/&lt;draft&gt; &amp; notes.txt</name>\
         <flags>0x8000</flags>\
         <version>29</version>\
         <compression_method>normal</compression_method>\
         <uncompr_size>1000</uncompr_size>\
         <compr_size>950</compr_size>\
         <file_attr>0x20</file_attr>\
         <lastmoddate>2001-02-03T04:05:06Z</lastmoddate>\
         <host_os>Windows</host_os>\
         <crc32>0xDEADBEEF</crc32>\
         </rar_component>"
    );
}

#[test]
fn test_unicode_and_big_file_component() {
    let mut name = b"ascii".to_vec();
    name.push(0);
    name.extend_from_slice("\u{e9}clair".as_bytes());
    let header = ComponentHeaderBuilder::new(name)
        .flags(FLAG_MANDATORY | FLAG_UNICODE_NAME | FLAG_BIG_FILE)
        .sizes(5 << 32, 6 << 32)
        .build();
    let mut image = vec![0u8; 3];
    image.extend(header);
    image.extend([0u8; 16]);

    let features = carve_all(&image);
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].label, "\u{e9}clair");
    assert!(features[0].record.contains("<uncompr_size>25769803776</uncompr_size>"));
    assert!(features[0].record.contains("<compr_size>21474836480</compr_size>"));
}

#[test]
fn test_corrupted_checksum_is_not_carved() {
    let mut image = fragment(ComponentHeaderBuilder::new("a.txt").build(), 80);
    image[20 + 10] ^= 0x01; // inside the file header's checksummed range
    let features = carve_all(&image);
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].label, "<volume>");
}

#[test]
fn test_truncated_fragment_is_not_carved() {
    let image = fragment(ComponentHeaderBuilder::new("a.txt").build(), 0);
    // Header runs to the very end of the buffer: head_size must be less than the buffer length
    assert_eq!(carve_all(&image).len(), 1);
}

#[test]
fn test_scan_is_idempotent() {
    let mut image = vec![0x33u8; 500];
    image.extend(fragment(ComponentHeaderBuilder::new("x.bin").build(), 80));
    image.extend(vec![0x44u8; 500]);
    assert_eq!(carve_all(&image), carve_all(&image));
}

#[test]
fn test_nested_archive_through_recursion_limits() {
    const KEY: u8 = 0x3C;
    let inner = fragment(ComponentHeaderBuilder::new("inner.txt").sizes(10, 20).build(), 10);
    let mut image = vec![0u8; 64];
    image.extend(
        ComponentHeaderBuilder::new("outer.rar")
            .sizes(inner.len() as u64, inner.len() as u64 + 10)
            .build(),
    );
    image.extend(inner.iter().map(|b| b ^ KEY));
    image.extend([0u8; 32]);

    let mut decode = |archive: &[u8], out: &mut [u8]| -> DecompressResult<usize> {
        let header_len = u16::from_le_bytes([archive[5], archive[6]]) as usize;
        let packed = archive
            .get(header_len..header_len + out.len() - 10)
            .ok_or(DecompressError::IncompleteData)?;
        for (dst, src) in out.iter_mut().zip(packed) {
            *dst = src ^ KEY;
        }
        Ok(packed.len())
    };
    let mut limits = RecursionLimits::new(ScanConfig::default());
    let mut features: Vec<Feature> = Vec::new();
    scan(
        &ScanBuffer::whole(&image),
        &ScanConfig::default(),
        &mut features,
        &mut decode,
        &mut limits,
    );

    let paths: Vec<String> = features
        .iter()
        .map(|f| format!("{} {}", f.path, f.label))
        .collect();
    assert_eq!(
        paths,
        vec!["64 outer.rar", "64-RAR-7 <volume>", "64-RAR-20 inner.txt"]
    );
}

#[test]
fn test_scan_media_writes_tsv() {
    let mut image = vec![0u8; 3000];
    let archive = fragment(ComponentHeaderBuilder::new("paged.txt").build(), 80);
    image[1000..1000 + archive.len()].copy_from_slice(&archive);
    // Planted so the file header straddles the 1024-byte page boundary
    let straddling = ComponentHeaderBuilder::new("edge.txt").build();
    image[2040..2040 + straddling.len()].copy_from_slice(&straddling);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&image).unwrap();
    file.flush().unwrap();

    let media = LocalFileMedia::new(file.path()).unwrap();
    let mut sink = TsvSink::new(Vec::new());
    let stats = scan_media(
        &media,
        1024,
        2048,
        &ScanConfig::default(),
        &mut sink,
        &mut NoDecompressor,
        &mut NoRecursion,
    )
    .unwrap();
    let out = String::from_utf8(sink.finish().unwrap()).unwrap();
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(stats.offsets, 3000);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("1007\t<volume>\t<rar_volume>"));
    assert!(lines[1].starts_with("1020\tpaged.txt\t<rar_component><name>paged.txt</name>"));
    assert!(lines[2].starts_with("2040\tedge.txt\t"));
}
