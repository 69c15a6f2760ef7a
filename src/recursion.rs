//! Recursion control for nested archives.
//!
//! [`RecursionLimits`] re-runs the carver over decompressed content, bounded
//! by depth and child size, and skips content it has already scanned.
//! Seen content is keyed by its SHA-256, so crafted CRC32 collisions cannot
//! hide a child.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::decompress::Decompressor;
use crate::feature::{FeatureSink, ForensicPath};
use crate::scan::{scan, RecursiveScan, ScanBuffer, ScanConfig, ScanStats};

#[derive(Debug, Clone)]
pub struct RecursionLimits {
    config: ScanConfig,
    max_depth: usize,
    max_child_size: u64,
    return_after_found: bool,
    seen: HashSet<[u8; 32]>,
    child_stats: ScanStats,
    duplicates: u64,
}

impl RecursionLimits {
    pub const DEFAULT_MAX_DEPTH: usize = 5;
    pub const DEFAULT_MAX_CHILD_SIZE: u64 = 256 * 1024 * 1024;

    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_child_size: Self::DEFAULT_MAX_CHILD_SIZE,
            return_after_found: false,
            seen: HashSet::new(),
            child_stats: ScanStats::default(),
            duplicates: 0,
        }
    }

    /// Number of nested decompressions allowed; 0 disables decompression.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn max_child_size(mut self, size: u64) -> Self {
        self.max_child_size = size;
        self
    }

    pub fn return_after_found(mut self, enabled: bool) -> Self {
        self.return_after_found = enabled;
        self
    }

    /// Totals over every child scan so far.
    pub fn child_stats(&self) -> &ScanStats {
        &self.child_stats
    }

    /// Children skipped because identical content was already scanned.
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }
}

impl RecursiveScan for RecursionLimits {
    fn admits(&self, uncompressed_size: u64, pos: &ForensicPath) -> bool {
        pos.depth() < self.max_depth && uncompressed_size <= self.max_child_size
    }

    fn scan_child(
        &mut self,
        child: ScanBuffer<'_>,
        sink: &mut dyn FeatureSink,
        decompressor: &mut dyn Decompressor,
    ) {
        let data = child.data();
        let digest: [u8; 32] = Sha256::digest(data).into();
        if !self.seen.insert(digest) {
            self.duplicates += 1;
            debug!(pos = %child.pos0(), len = data.len(), "skipping already scanned content");
            return;
        }

        let config = self.config;
        let stats = scan(&child, &config, sink, decompressor, self);
        self.child_stats.merge(&stats);
    }

    fn return_after_found(&self) -> bool {
        self.return_after_found
    }
}
