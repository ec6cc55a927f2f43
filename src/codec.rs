//! Textual codec for `.reg` value encodings.
//!
//! The right-hand side of a value line is one of:
//!
//! ```text
//! "some text"                  REG_SZ, \" escapes a quote
//! dword:0000002a               REG_DWORD, 8 hex digits
//! qword:000000000000002a       REG_QWORD, 16 hex digits
//! hex:de,ad,be,ef              REG_BINARY, comma-separated byte pairs
//! hex(7):61,00,00,00,...       explicit type code, bytes decoded per type
//! -                            removal marker (handled by the parser)
//! ```
//!
//! Decoding is lenient: anything that fails degrades to
//! [`RegistryValue::Unknown`] at the call site with a message returned
//! here. Encoding always emits the canonical forms the decoder accepts,
//! so every value round-trips.

use crate::value::{RegistryValue, ValueKind};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use encoding_rs::UTF_16LE;
use std::io::Cursor;

/// Byte pairs emitted per physical line before a `\` continuation.
const HEX_WRAP: usize = 16;

/// Decodes one right-hand side into a typed value.
///
/// # Errors
///
/// Returns a human-readable message when the payload is malformed
/// (bad hex digits, odd-length pairs, truncated integer bytes). The
/// caller attaches the message to the document and stores the raw text
/// as [`RegistryValue::Unknown`]; nothing here aborts a parse.
pub fn decode_value(raw: &str) -> Result<RegistryValue, String> {
    let raw = raw.trim();

    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let inner = &raw[1..raw.len() - 1];
        return Ok(RegistryValue::Sz(inner.replace("\\\"", "\"")));
    }

    if let Some(digits) = raw.strip_prefix("dword:") {
        let digits = hex_digits(digits).ok_or_else(|| format!("invalid DWORD value: {raw}"))?;
        let n = u32::from_str_radix(digits, 16)
            .map_err(|_| format!("invalid DWORD value: {raw}"))?;
        return Ok(RegistryValue::Dword(n));
    }

    if let Some(digits) = raw.strip_prefix("qword:") {
        let digits = hex_digits(digits).ok_or_else(|| format!("invalid QWORD value: {raw}"))?;
        let n = u64::from_str_radix(digits, 16)
            .map_err(|_| format!("invalid QWORD value: {raw}"))?;
        return Ok(RegistryValue::Qword(n));
    }

    if let Some(stream) = raw.strip_prefix("hex:") {
        let bytes = decode_hex_bytes(stream)?;
        return Ok(RegistryValue::Binary(bytes));
    }

    if let Some(rest) = raw.strip_prefix("hex(") {
        let (code, stream) = rest
            .split_once("):")
            .ok_or_else(|| format!("malformed hex(N) value: {raw}"))?;
        let kind = ValueKind::from_type_code(code);
        let bytes = decode_hex_bytes(stream)?;
        return decode_typed_bytes(kind, &bytes);
    }

    Err(format!("unrecognized value syntax: {raw}"))
}

/// Encodes a typed value back to its `.reg` right-hand side.
///
/// Long `hex:`/`hex(N):` streams wrap with a trailing `\` and a
/// two-space continuation indent; the result may therefore span
/// multiple physical lines.
///
/// Empty strings inside a [`RegistryValue::MultiSz`] are dropped: the
/// REG_MULTI_SZ wire format cannot carry them (see
/// [`utf16le_multi_bytes`]), so only lists without empty elements
/// round-trip exactly.
pub fn encode_value(value: &RegistryValue) -> String {
    match value {
        RegistryValue::Sz(s) => format!("\"{}\"", s.replace('"', "\\\"")),
        RegistryValue::Dword(d) => format!("dword:{:08x}", d),
        RegistryValue::Qword(q) => format!("qword:{:016x}", q),
        RegistryValue::Binary(b) => encode_hex_stream("hex:", b),
        RegistryValue::None(b) => encode_hex_stream("hex(0):", b),
        RegistryValue::ExpandSz(s) => encode_hex_stream("hex(2):", &utf16le_bytes(s)),
        RegistryValue::DwordBigEndian(d) => encode_hex_stream("hex(5):", &d.to_be_bytes()),
        RegistryValue::Link(s) => encode_hex_stream("hex(6):", &utf16le_bytes(s)),
        RegistryValue::MultiSz(strings) => {
            encode_hex_stream("hex(7):", &utf16le_multi_bytes(strings))
        }
        RegistryValue::ResourceList(b) => encode_hex_stream("hex(8):", b),
        RegistryValue::FullResourceDescriptor(b) => encode_hex_stream("hex(9):", b),
        RegistryValue::ResourceRequirementsList(b) => encode_hex_stream("hex(a):", b),
        RegistryValue::Unknown(raw) => raw.clone(),
        RegistryValue::Delete => String::from("-"),
    }
}

/// Accepts a field of bare hex digits, rejecting the signs and
/// whitespace `from_str_radix` would otherwise let through.
fn hex_digits(field: &str) -> Option<&str> {
    let field = field.trim();
    if !field.is_empty() && field.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(field)
    } else {
        None
    }
}

/// Decodes a comma-separated stream of hex byte pairs.
///
/// Continuation backslashes and surrounding whitespace left over from
/// line joining are tolerated and skipped.
fn decode_hex_bytes(stream: &str) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    for part in stream.split(',') {
        let part = part.trim().trim_matches('\\').trim();
        if part.is_empty() {
            continue;
        }
        let decoded =
            hex::decode(part).map_err(|_| format!("invalid hex byte: {part}"))?;
        bytes.extend(decoded);
    }
    Ok(bytes)
}

/// Decodes a `hex(N)` byte stream according to its declared kind.
fn decode_typed_bytes(kind: ValueKind, bytes: &[u8]) -> Result<RegistryValue, String> {
    match kind {
        ValueKind::None => Ok(RegistryValue::None(bytes.to_vec())),
        ValueKind::Binary => Ok(RegistryValue::Binary(bytes.to_vec())),
        ValueKind::Sz => Ok(RegistryValue::Sz(utf16le_string(bytes)?)),
        ValueKind::ExpandSz => Ok(RegistryValue::ExpandSz(utf16le_string(bytes)?)),
        ValueKind::Link => Ok(RegistryValue::Link(utf16le_string(bytes)?)),
        ValueKind::MultiSz => Ok(RegistryValue::MultiSz(utf16le_strings(bytes)?)),
        ValueKind::Dword => {
            let mut cursor = Cursor::new(bytes);
            let n = cursor
                .read_u32::<LittleEndian>()
                .map_err(|_| format!("DWORD payload needs 4 bytes, got {}", bytes.len()))?;
            Ok(RegistryValue::Dword(n))
        }
        ValueKind::DwordBigEndian => {
            let mut cursor = Cursor::new(bytes);
            let n = cursor
                .read_u32::<BigEndian>()
                .map_err(|_| format!("DWORD payload needs 4 bytes, got {}", bytes.len()))?;
            Ok(RegistryValue::DwordBigEndian(n))
        }
        ValueKind::Qword => {
            let mut cursor = Cursor::new(bytes);
            let n = cursor
                .read_u64::<LittleEndian>()
                .map_err(|_| format!("QWORD payload needs 8 bytes, got {}", bytes.len()))?;
            Ok(RegistryValue::Qword(n))
        }
        ValueKind::ResourceList => Ok(RegistryValue::ResourceList(bytes.to_vec())),
        ValueKind::FullResourceDescriptor => {
            Ok(RegistryValue::FullResourceDescriptor(bytes.to_vec()))
        }
        ValueKind::ResourceRequirementsList => {
            Ok(RegistryValue::ResourceRequirementsList(bytes.to_vec()))
        }
        // from_type_code never produces these
        ValueKind::Unknown | ValueKind::Delete => {
            Err(format!("type code has no byte encoding: {}", kind.name()))
        }
    }
}

/// Formats bytes as comma-joined hex pairs behind the given prefix,
/// wrapping with `\` continuations past [`HEX_WRAP`] bytes per line.
fn encode_hex_stream(prefix: &str, bytes: &[u8]) -> String {
    let pairs: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
    if pairs.len() <= HEX_WRAP {
        return format!("{prefix}{}", pairs.join(","));
    }

    let mut out = String::from(prefix);
    for (i, chunk) in pairs.chunks(HEX_WRAP).enumerate() {
        if i > 0 {
            out.push_str("\n  ");
        }
        out.push_str(&chunk.join(","));
        if (i + 1) * HEX_WRAP < pairs.len() {
            out.push_str(",\\");
        }
    }
    out
}

/// Decodes a NUL-terminated UTF-16LE string payload.
fn utf16le_string(bytes: &[u8]) -> Result<String, String> {
    if bytes.len() % 2 != 0 {
        return Err(format!("odd UTF-16 payload length: {}", bytes.len()));
    }
    let (decoded, had_errors) = UTF_16LE.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(String::from("invalid UTF-16 payload"));
    }
    Ok(decoded.trim_end_matches('\0').to_string())
}

/// Decodes a double-NUL-terminated UTF-16LE multi-string payload.
fn utf16le_strings(bytes: &[u8]) -> Result<Vec<String>, String> {
    let decoded = utf16le_string(bytes)?;
    Ok(decoded
        .split('\0')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

/// Encodes a string as UTF-16LE with a NUL terminator.
fn utf16le_bytes(s: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

/// Encodes strings as UTF-16LE, NUL-terminated each, double-NUL at the end.
///
/// Empty elements are skipped: an empty string in REG_MULTI_SZ wire
/// format is indistinguishable from the list terminator, so it cannot
/// be represented and would truncate the list on the consumer side.
fn utf16le_multi_bytes(strings: &[String]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for s in strings.iter().filter(|s| !s.is_empty()) {
        bytes.extend(s.encode_utf16().flat_map(|u| u.to_le_bytes()));
        bytes.extend_from_slice(&[0, 0]);
    }
    bytes.extend_from_slice(&[0, 0]);
    bytes
}
