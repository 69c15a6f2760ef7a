//! RAR field encodings: DOS timestamps, host OS and compression method codes.
//!
//! Zero dependencies.

use std::fmt;

/// RAR 1.5-4.x marker block: `Rar!\x1a\x07\x00`.
pub const RAR4_SIGNATURE: [u8; 7] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00];

/// Year stored in a DOS timestamp is relative to 1980.
const DOS_YEAR_OFFSET: u16 = 1980;

/// Unpacked MS-DOS date/time.
///
/// Fields are kept exactly as stored. Carved headers may hold garbage, so no
/// calendar validation is performed: month 0 or 13 renders as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DosDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    /// Always even; DOS stores seconds with 2-second resolution.
    pub second: u8,
}

impl DosDateTime {
    pub fn from_packed(dos_time: u32) -> Self {
        Self {
            second: ((dos_time & 0x1f) * 2) as u8,
            minute: ((dos_time >> 5) & 0x3f) as u8,
            hour: ((dos_time >> 11) & 0x1f) as u8,
            day: ((dos_time >> 16) & 0x1f) as u8,
            month: ((dos_time >> 21) & 0x0f) as u8,
            year: (dos_time >> 25) as u16 + DOS_YEAR_OFFSET,
        }
    }

    /// Pack back into the 32-bit DOS layout. Odd seconds are truncated.
    pub fn to_packed(&self) -> u32 {
        let year = u32::from(self.year.saturating_sub(DOS_YEAR_OFFSET)) & 0x7f;
        (year << 25)
            | ((u32::from(self.month) & 0x0f) << 21)
            | ((u32::from(self.day) & 0x1f) << 16)
            | ((u32::from(self.hour) & 0x1f) << 11)
            | ((u32::from(self.minute) & 0x3f) << 5)
            | ((u32::from(self.second) / 2) & 0x1f)
    }
}

impl fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Render a packed DOS date/time as `YYYY-MM-DDThh:mm:ssZ`.
pub fn decode_dos_datetime(dos_time: u32) -> String {
    DosDateTime::from_packed(dos_time).to_string()
}

/// Compression methods used in RAR 1.5-4.x file headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionMethod {
    /// Store (no compression)
    Uncompressed = 0x30,
    Fastest = 0x31,
    Fast = 0x32,
    Normal = 0x33,
    Small = 0x34,
    Smallest = 0x35,
}

impl CompressionMethod {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x30 => Some(Self::Uncompressed),
            0x31 => Some(Self::Fastest),
            0x32 => Some(Self::Fast),
            0x33 => Some(Self::Normal),
            0x34 => Some(Self::Small),
            0x35 => Some(Self::Smallest),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Uncompressed => "uncompressed",
            Self::Fastest => "fastest",
            Self::Fast => "fast",
            Self::Normal => "normal",
            Self::Small => "small",
            Self::Smallest => "smallest",
        }
    }
}

/// Operating system that created the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HostOs {
    Dos = 0,
    Os2 = 1,
    Windows = 2,
    Unix = 3,
    MacOs = 4,
    BeOs = 5,
}

impl HostOs {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Dos),
            1 => Some(Self::Os2),
            2 => Some(Self::Windows),
            3 => Some(Self::Unix),
            4 => Some(Self::MacOs),
            5 => Some(Self::BeOs),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dos => "DOS",
            Self::Os2 => "OS/2",
            Self::Windows => "Windows",
            Self::Unix => "Unix",
            Self::MacOs => "Mac OS",
            Self::BeOs => "BeOS",
        }
    }
}

/// Label for a compression method byte; unknown values render as `0xNN`.
pub fn compression_method_label(method: u8) -> String {
    CompressionMethod::from_u8(method)
        .map_or_else(|| format!("0x{:02X}", method), |m| m.label().to_string())
}

/// Label for a host OS byte; unknown values render as `0xNN`.
pub fn host_os_label(host_os: u8) -> String {
    HostOs::from_u8(host_os)
        .map_or_else(|| format!("0x{:02X}", host_os), |os| os.label().to_string())
}
