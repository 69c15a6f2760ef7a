//! Input media: page windows over an image file.
//!
//! An image is scanned one page at a time. Each window read from the media
//! holds the page plus a margin of lookahead bytes, so that a header starting
//! near the end of a page can still be validated in full. Consecutive windows
//! overlap by the margin; only offsets inside the page are scanned, so every
//! offset of the image is tried exactly once.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::decompress::Decompressor;
use crate::error::{CarveError, Result};
use crate::feature::{FeatureSink, ForensicPath};
use crate::scan::{scan, RecursiveScan, ScanBuffer, ScanConfig, ScanStats};

/// Default page size: 16 MiB.
pub const DEFAULT_PAGE_SIZE: u64 = 16 * 1024 * 1024;

/// Default margin: 1 MiB.
pub const DEFAULT_MARGIN: u64 = 1024 * 1024;

/// Interval for reading a byte range (both ends inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadInterval {
    pub start: u64,
    pub end: u64,
}

impl ReadInterval {
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// One scan window: `page_len` scanned bytes followed by margin, `len` total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u64,
    pub page_len: u64,
    pub len: u64,
}

impl PageWindow {
    pub fn margin_len(&self) -> u64 {
        self.len - self.page_len
    }

    pub fn interval(&self) -> ReadInterval {
        ReadInterval {
            start: self.start,
            end: self.start + self.len - 1,
        }
    }
}

/// Iterator over the page windows of a media of `total_len` bytes.
#[derive(Debug, Clone)]
pub struct PageIter {
    total_len: u64,
    page_size: u64,
    margin: u64,
    next_start: u64,
}

impl PageIter {
    pub fn new(total_len: u64, page_size: u64, margin: u64) -> Result<Self> {
        if page_size == 0 {
            return Err(CarveError::Config("page size must be non-zero".into()));
        }
        Ok(Self {
            total_len,
            page_size,
            margin,
            next_start: 0,
        })
    }
}

impl Iterator for PageIter {
    type Item = PageWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_start >= self.total_len {
            return None;
        }

        let remaining = self.total_len - self.next_start;
        let window = PageWindow {
            start: self.next_start,
            page_len: remaining.min(self.page_size),
            len: remaining.min(self.page_size.saturating_add(self.margin)),
        };
        self.next_start = self.next_start.saturating_add(self.page_size);
        Some(window)
    }
}

/// Local file implementation.
#[derive(Debug, Clone)]
pub struct LocalFileMedia {
    path: PathBuf,
    name: String,
    length: u64,
}

impl LocalFileMedia {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map_or_else(|| "unknown".to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self {
            path: path.to_path_buf(),
            name,
            length: metadata.len(),
        })
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Page windows covering the whole file.
    pub fn pages(&self, page_size: u64, margin: u64) -> Result<PageIter> {
        PageIter::new(self.length, page_size, margin)
    }

    fn check_interval(&self, interval: ReadInterval) -> Result<()> {
        if interval.start > interval.end || interval.end >= self.length {
            return Err(CarveError::InvalidOffset {
                offset: interval.end,
                length: self.length,
            });
        }
        Ok(())
    }

    /// Sync read
    pub fn read_range_sync(&self, interval: ReadInterval) -> Result<Vec<u8>> {
        self.check_interval(interval)?;
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(interval.start))?;
        let mut buffer = vec![0u8; interval.size() as usize];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    pub fn read_window(&self, window: &PageWindow) -> Result<Vec<u8>> {
        self.read_range_sync(window.interval())
    }
}

fn scan_window(
    data: &[u8],
    window: &PageWindow,
    config: &ScanConfig,
    sink: &mut dyn FeatureSink,
    decompressor: &mut dyn Decompressor,
    recursion: &mut dyn RecursiveScan,
) -> Result<ScanStats> {
    let buffer =
        ScanBuffer::new(data, window.page_len as usize)?.with_pos0(ForensicPath::new(window.start));
    let stats = scan(&buffer, config, sink, decompressor, recursion);
    debug!(
        start = window.start,
        page_len = window.page_len,
        volumes = stats.volumes,
        components = stats.components,
        "scanned page"
    );
    Ok(stats)
}

/// Scan a whole local file page by page. Forensic paths are absolute file
/// offsets.
pub fn scan_media(
    media: &LocalFileMedia,
    page_size: u64,
    margin: u64,
    config: &ScanConfig,
    sink: &mut dyn FeatureSink,
    decompressor: &mut dyn Decompressor,
    recursion: &mut dyn RecursiveScan,
) -> Result<ScanStats> {
    let mut total = ScanStats::default();
    for window in media.pages(page_size, margin)? {
        let data = media.read_window(&window)?;
        let stats = scan_window(&data, &window, config, sink, decompressor, recursion)?;
        total.merge(&stats);
    }
    Ok(total)
}

// Async FileMedia trait (requires 'async' feature)
#[cfg(feature = "async")]
use std::future::Future;
#[cfg(feature = "async")]
use std::pin::Pin;

/// Abstract image source that can provide byte ranges asynchronously.
///
/// Implement this trait for custom sources (e.g., remote evidence stores).
/// The library provides [`LocalFileMedia`] for local files.
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub trait FileMedia: Send + Sync {
    fn length(&self) -> u64;
    fn name(&self) -> &str;
    fn read_range(
        &self,
        interval: ReadInterval,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>>;
}

#[cfg(feature = "async")]
impl FileMedia for LocalFileMedia {
    fn length(&self) -> u64 {
        self.length
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_range(
        &self,
        interval: ReadInterval,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>> {
        Box::pin(async move {
            use tokio::io::{AsyncReadExt, AsyncSeekExt};
            self.check_interval(interval)?;
            let mut file = tokio::fs::File::open(&self.path).await?;
            file.seek(SeekFrom::Start(interval.start)).await?;
            let mut buffer = vec![0u8; interval.size() as usize];
            file.read_exact(&mut buffer).await?;
            Ok(buffer)
        })
    }
}

/// Async variant of [`scan_media`] for any [`FileMedia`]. Reads are awaited;
/// carving itself runs inline.
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub async fn scan_media_async<M: FileMedia + ?Sized>(
    media: &M,
    page_size: u64,
    margin: u64,
    config: &ScanConfig,
    sink: &mut dyn FeatureSink,
    decompressor: &mut dyn Decompressor,
    recursion: &mut dyn RecursiveScan,
) -> Result<ScanStats> {
    let mut total = ScanStats::default();
    for window in PageIter::new(media.length(), page_size, margin)? {
        let data = media.read_range(window.interval()).await?;
        let stats = scan_window(&data, &window, config, sink, decompressor, recursion)?;
        total.merge(&stats);
    }
    Ok(total)
}
