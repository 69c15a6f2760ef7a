//! Feature recording: where carved headers are reported.
//!
//! A feature is a `(forensic path, label, record)` triple. The label is
//! `<volume>` for archive headers and the decoded filename for file headers;
//! the record is a small XML document describing the header.

use std::fmt;
use std::io::{self, Write};

/// Label used for carved archive headers.
pub const VOLUME_LABEL: &str = "<volume>";

/// Address of a feature, possibly nested inside decompressed content.
///
/// Renders as `1024` for a top-level offset, or `1024-RAR-96` for offset 96
/// inside the content decompressed from a component found at 1024.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ForensicPath {
    prefix: String,
    offset: u64,
    depth: usize,
}

impl ForensicPath {
    pub fn new(offset: u64) -> Self {
        Self {
            prefix: String::new(),
            offset,
            depth: 0,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Same buffer, `delta` bytes further in.
    pub fn advanced(&self, delta: u64) -> Self {
        Self {
            prefix: self.prefix.clone(),
            offset: self.offset + delta,
            depth: self.depth,
        }
    }

    /// Start of a new buffer derived from the content at this path.
    pub fn child(&self, part: &str) -> Self {
        Self {
            prefix: format!("{}-{}", self, part),
            offset: 0,
            depth: self.depth + 1,
        }
    }

    /// Number of decoding layers between this path and the input image.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl fmt::Display for ForensicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.offset)
        } else {
            write!(f, "{}-{}", self.prefix, self.offset)
        }
    }
}

/// Receiver for carved features.
pub trait FeatureSink {
    fn write(&mut self, pos: &ForensicPath, label: &str, record: &str);
}

/// An owned feature, as collected by `Vec<Feature>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub path: ForensicPath,
    pub label: String,
    pub record: String,
}

impl FeatureSink for Vec<Feature> {
    fn write(&mut self, pos: &ForensicPath, label: &str, record: &str) {
        self.push(Feature {
            path: pos.clone(),
            label: label.to_string(),
            record: record.to_string(),
        });
    }
}

/// Writes features as tab-separated lines: `path\tlabel\trecord`.
///
/// The first write error is kept and returned from [`TsvSink::finish`];
/// later features are dropped.
pub struct TsvSink<W: Write> {
    writer: W,
    written: u64,
    error: Option<io::Error>,
}

impl<W: Write> TsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            error: None,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> FeatureSink for TsvSink<W> {
    fn write(&mut self, pos: &ForensicPath, label: &str, record: &str) {
        if self.error.is_some() {
            return;
        }
        match writeln!(self.writer, "{}\t{}\t{}", pos, label, record) {
            Ok(()) => self.written += 1,
            Err(e) => self.error = Some(e),
        }
    }
}

/// Escape text for use inside an XML element.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Minimal writer for the flat XML records attached to features.
pub(crate) struct XmlWriter {
    root: &'static str,
    buf: String,
}

impl XmlWriter {
    pub(crate) fn new(root: &'static str) -> Self {
        let mut buf = String::with_capacity(256);
        buf.push('<');
        buf.push_str(root);
        buf.push('>');
        Self { root, buf }
    }

    pub(crate) fn element(&mut self, name: &str, value: impl fmt::Display) {
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push('>');
        self.buf.push_str(&xml_escape(&value.to_string()));
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
    }

    pub(crate) fn finish(mut self) -> String {
        self.buf.push_str("</");
        self.buf.push_str(self.root);
        self.buf.push('>');
        self.buf
    }
}
