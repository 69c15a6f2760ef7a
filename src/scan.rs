//! The carving scan loop.
//!
//! Every offset of a page is tried as the start of an archive header and of
//! a file header. Matches are reported in offset order; a match never causes
//! offsets to be skipped, since carved length fields are untrusted and a real
//! header may hide inside the declared extent of a false one.

use tracing::{debug, trace};

use crate::decompress::Decompressor;
use crate::error::{CarveError, Result};
use crate::feature::{FeatureSink, ForensicPath, VOLUME_LABEL};
use crate::parsing::{try_parse_component, try_parse_volume, ComponentHeader, VolumeHeader};

/// Part name used in forensic paths of decompressed content.
pub const RAR_PART_NAME: &str = "RAR";

/// Which header kinds to carve. Both are on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub find_components: bool,
    pub find_volumes: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            find_components: true,
            find_volumes: true,
        }
    }
}

/// A page of input plus its lookahead margin.
///
/// Only offsets inside the page are tried, but headers starting in the page
/// may extend into the margin.
#[derive(Debug, Clone)]
pub struct ScanBuffer<'a> {
    data: &'a [u8],
    page_len: usize,
    pos0: ForensicPath,
}

impl<'a> ScanBuffer<'a> {
    pub fn new(data: &'a [u8], page_len: usize) -> Result<Self> {
        if page_len > data.len() {
            return Err(CarveError::InvalidRegion {
                page_len,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            page_len,
            pos0: ForensicPath::default(),
        })
    }

    /// The whole buffer is the page; there is no margin.
    pub fn whole(data: &'a [u8]) -> Self {
        Self {
            data,
            page_len: data.len(),
            pos0: ForensicPath::default(),
        }
    }

    pub fn with_pos0(mut self, pos0: ForensicPath) -> Self {
        self.pos0 = pos0;
        self
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn page_len(&self) -> usize {
        self.page_len
    }

    pub fn margin_len(&self) -> usize {
        self.data.len() - self.page_len
    }

    pub fn pos0(&self) -> &ForensicPath {
        &self.pos0
    }
}

/// Policy for descending into decompressed content.
///
/// The carver does no recursion bookkeeping of its own: depth limits, size
/// limits and duplicate suppression belong to the implementation.
pub trait RecursiveScan {
    /// Whether a component of `uncompressed_size` bytes found at `pos` should
    /// be decompressed at all.
    fn admits(&self, uncompressed_size: u64, pos: &ForensicPath) -> bool;

    /// Called once per successfully decompressed component.
    fn scan_child(
        &mut self,
        child: ScanBuffer<'_>,
        sink: &mut dyn FeatureSink,
        decompressor: &mut dyn Decompressor,
    );

    /// Stop the current scan right after the first child dispatch.
    fn return_after_found(&self) -> bool {
        false
    }
}

/// Never decompresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecursion;

impl RecursiveScan for NoRecursion {
    fn admits(&self, _uncompressed_size: u64, _pos: &ForensicPath) -> bool {
        false
    }

    fn scan_child(
        &mut self,
        _child: ScanBuffer<'_>,
        _sink: &mut dyn FeatureSink,
        _decompressor: &mut dyn Decompressor,
    ) {
    }
}

/// Counters for one scan call (children not included).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Offsets reached: the page length, or up to and including the match
    /// that stopped the scan early.
    pub offsets: u64,
    pub volumes: u64,
    pub components: u64,
    pub decompressions: u64,
    pub decompressed: u64,
    pub children: u64,
    pub stopped_early: bool,
}

impl ScanStats {
    pub fn merge(&mut self, other: &ScanStats) {
        self.offsets += other.offsets;
        self.volumes += other.volumes;
        self.components += other.components;
        self.decompressions += other.decompressions;
        self.decompressed += other.decompressed;
        self.children += other.children;
        self.stopped_early |= other.stopped_early;
    }
}

/// Header carved at some offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarvedHeader {
    Volume(VolumeHeader),
    Component(ComponentHeader),
}

/// A header and the page-relative offset it was carved at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarvedMatch {
    pub offset: usize,
    pub header: CarvedHeader,
}

impl CarvedMatch {
    /// Feature label: `<volume>` or the component's filename.
    pub fn label(&self) -> &str {
        match &self.header {
            CarvedHeader::Volume(_) => VOLUME_LABEL,
            CarvedHeader::Component(c) => &c.name,
        }
    }

    pub fn to_xml(&self) -> String {
        match &self.header {
            CarvedHeader::Volume(v) => v.to_xml(),
            CarvedHeader::Component(c) => c.to_xml(),
        }
    }
}

/// Volume before component when both match at one offset.
fn carve_at(data: &[u8], offset: usize, config: &ScanConfig) -> Vec<CarvedMatch> {
    let window = &data[offset..];
    let mut found = Vec::new();
    if config.find_volumes {
        if let Some(volume) = try_parse_volume(window) {
            found.push(CarvedMatch {
                offset,
                header: CarvedHeader::Volume(volume),
            });
        }
    }
    if config.find_components {
        if let Some(component) = try_parse_component(window) {
            found.push(CarvedMatch {
                offset,
                header: CarvedHeader::Component(component),
            });
        }
    }
    found
}

/// Carve every offset of the page without decompressing anything.
///
/// With the `parallel` feature, offsets are checked on the rayon pool; the
/// result is identical to the sequential pass.
pub fn collect_matches(buffer: &ScanBuffer<'_>, config: &ScanConfig) -> Vec<CarvedMatch> {
    let data = buffer.data();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..buffer.page_len())
            .into_par_iter()
            .flat_map_iter(|offset| carve_at(data, offset, config))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..buffer.page_len())
            .flat_map(|offset| carve_at(data, offset, config))
            .collect()
    }
}

/// Scan a buffer: report every carved header to `sink` and, for compressed
/// components the recursion policy admits, decompress and dispatch the
/// content to `recursion`.
///
/// Never fails: malformed data only means fewer matches, and a failed
/// decompression is logged and skipped.
pub fn scan(
    buffer: &ScanBuffer<'_>,
    config: &ScanConfig,
    sink: &mut dyn FeatureSink,
    decompressor: &mut dyn Decompressor,
    recursion: &mut dyn RecursiveScan,
) -> ScanStats {
    let mut stats = ScanStats {
        offsets: buffer.page_len() as u64,
        ..ScanStats::default()
    };

    for found in collect_matches(buffer, config) {
        let pos = buffer.pos0().advanced(found.offset as u64);
        trace!(pos = %pos, label = found.label(), "carved RAR header");
        sink.write(&pos, found.label(), &found.to_xml());

        let component = match &found.header {
            CarvedHeader::Volume(_) => {
                stats.volumes += 1;
                continue;
            }
            CarvedHeader::Component(component) => component,
        };
        stats.components += 1;

        if !component.is_compressed() || !recursion.admits(component.uncompressed_size, &pos) {
            continue;
        }

        let Some(mut output) = allocate_output(component.uncompressed_size) else {
            debug!(pos = %pos, size = component.uncompressed_size, "cannot allocate output buffer");
            continue;
        };
        stats.decompressions += 1;
        let written = match decompressor.decompress(&buffer.data()[found.offset..], &mut output) {
            Ok(written) => written.min(output.len()),
            Err(e) => {
                debug!(pos = %pos, name = %component.name, error = %e, "decompression failed");
                continue;
            }
        };
        stats.decompressed += 1;
        output.truncate(written);

        let child_pos = pos.child(RAR_PART_NAME);
        debug!(pos = %child_pos, len = output.len(), "scanning decompressed component");
        recursion.scan_child(ScanBuffer::whole(&output).with_pos0(child_pos), sink, decompressor);
        stats.children += 1;

        if recursion.return_after_found() {
            stats.stopped_early = true;
            stats.offsets = found.offset as u64 + 1;
            break;
        }
    }

    stats
}

fn allocate_output(size: u64) -> Option<Vec<u8>> {
    let len = usize::try_from(size).ok()?;
    let mut output = Vec::new();
    output.try_reserve_exact(len).ok()?;
    output.resize(len, 0);
    Some(output)
}
