#![no_main]
use libfuzzer_sys::fuzz_target;
use rar_carve::decompress::Result as DecompressResult;
use rar_carve::{collect_matches, scan, Feature, RecursionLimits, ScanBuffer, ScanConfig};

// Scan with a "decompressor" that echoes the carved bytes, so recursion is
// exercised on attacker-controlled content.
fuzz_target!(|data: &[u8]| {
    let config = ScanConfig::default();
    let buffer = ScanBuffer::whole(data);
    let mut features: Vec<Feature> = Vec::new();
    let mut echo = |archive: &[u8], out: &mut [u8]| -> DecompressResult<usize> {
        let n = archive.len().min(out.len());
        out[..n].copy_from_slice(&archive[..n]);
        Ok(n)
    };
    let mut limits = RecursionLimits::new(config).max_depth(3).max_child_size(1 << 20);
    let stats = scan(&buffer, &config, &mut features, &mut echo, &mut limits);

    let top_level = collect_matches(&buffer, &config).len() as u64;
    assert_eq!(stats.volumes + stats.components, top_level);
});
