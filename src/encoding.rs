//! Byte decoding for `.reg` files.
//!
//! Registry exports ship in a mix of encodings: modern Windows writes
//! UTF-16LE with a BOM, older tools and hand edits produce UTF-8 (with
//! or without BOM) or a legacy code page. Decoding is an I/O concern in
//! front of the parser, which consumes already-decoded text.

use encoding_rs::{UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use tracing::debug;

/// Decodes raw `.reg` file bytes to text.
///
/// Order of preference: BOM sniffing (UTF-8, UTF-16LE, UTF-16BE), then
/// valid UTF-8, then a NUL-density heuristic for BOM-less UTF-16LE,
/// then windows-1252 as the lossless legacy fallback. Never fails;
/// undecodable sequences are replaced.
pub fn decode_reg_bytes(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        let (text, _, _) = UTF_8.decode(bytes);
        return text.into_owned();
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        let (text, _, _) = UTF_16LE.decode(bytes);
        return text.into_owned();
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (text, _, _) = UTF_16BE.decode(bytes);
        return text.into_owned();
    }

    // BOM-less UTF-16LE of mostly-ASCII text has a NUL in nearly every
    // odd position. NULs are valid UTF-8, so this check must come before
    // the UTF-8 one.
    if bytes.len() >= 4 && bytes.len() % 2 == 0 {
        let nul_odd = bytes.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();
        if nul_odd * 2 >= bytes.len() / 2 {
            debug!("decoding BOM-less input as UTF-16LE");
            let (text, _) = UTF_16LE.decode_without_bom_handling(bytes);
            return text.into_owned();
        }
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    debug!("falling back to windows-1252");
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// The UTF-8 byte order mark written in front of generated files.
pub const UTF8_BOM: &str = "\u{FEFF}";
