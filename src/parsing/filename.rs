//! Filename field decoding.
//!
//! With the unicode-name flag set, the name field holds either plain UTF-8,
//! or a legacy single-byte rendering followed by a null byte and the UTF-8
//! form. Only the UTF-8 form is kept.

use std::borrow::Cow;

/// Decode a filename region, or `None` if it cannot be a real filename.
///
/// Without `unicode`, bytes are taken verbatim and non-UTF-8 sequences are
/// replaced with U+FFFD. With `unicode`, the UTF-8 half must be well formed.
/// Empty names and names containing ASCII control bytes are rejected in both
/// cases.
pub fn decode_filename(region: &[u8], unicode: bool) -> Option<String> {
    let name: Cow<'_, str> = if unicode {
        let utf8 = match region.iter().position(|&b| b == 0) {
            None => region,
            // Null as the last byte leaves an empty UTF-8 half
            Some(null) if null + 1 == region.len() => return None,
            Some(null) => &region[null + 1..],
        };
        Cow::Borrowed(std::str::from_utf8(utf8).ok()?)
    } else {
        String::from_utf8_lossy(region)
    };

    if name.is_empty() || name.bytes().any(|b| b < b' ') {
        return None;
    }
    Some(name.into_owned())
}
