//! Registry value kinds and typed payloads.
//!
//! A `.reg` file declares values with an explicit textual encoding per
//! kind. [`ValueKind`] is the tag, [`RegistryValue`] carries the decoded
//! payload. The two agree by construction.

/// Registry value type tags.
///
/// Covers the win32 type codes 0 through 11 plus the two tags that only
/// exist in `.reg` source: [`ValueKind::Unknown`] for unparsable payloads
/// and [`ValueKind::Delete`] for `"name"=-` removal markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    /// REG_NONE - no defined type.
    None,
    /// REG_SZ - string.
    Sz,
    /// REG_EXPAND_SZ - string with environment variable references.
    ExpandSz,
    /// REG_BINARY - raw bytes.
    Binary,
    /// REG_DWORD - 32-bit little-endian integer.
    Dword,
    /// REG_DWORD_BIG_ENDIAN - 32-bit big-endian integer.
    DwordBigEndian,
    /// REG_LINK - symbolic link target.
    Link,
    /// REG_MULTI_SZ - sequence of strings.
    MultiSz,
    /// REG_RESOURCE_LIST - hardware resource list.
    ResourceList,
    /// REG_FULL_RESOURCE_DESCRIPTOR - hardware resource descriptor.
    FullResourceDescriptor,
    /// REG_RESOURCE_REQUIREMENTS_LIST - hardware resource requirements.
    ResourceRequirementsList,
    /// REG_QWORD - 64-bit little-endian integer.
    Qword,
    /// Unrecognized or unparsable source encoding.
    Unknown,
    /// `"name"=-` removal marker.
    Delete,
}

impl ValueKind {
    /// Returns the conventional REG_* name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::None => "REG_NONE",
            ValueKind::Sz => "REG_SZ",
            ValueKind::ExpandSz => "REG_EXPAND_SZ",
            ValueKind::Binary => "REG_BINARY",
            ValueKind::Dword => "REG_DWORD",
            ValueKind::DwordBigEndian => "REG_DWORD_BIG_ENDIAN",
            ValueKind::Link => "REG_LINK",
            ValueKind::MultiSz => "REG_MULTI_SZ",
            ValueKind::ResourceList => "REG_RESOURCE_LIST",
            ValueKind::FullResourceDescriptor => "REG_FULL_RESOURCE_DESCRIPTOR",
            ValueKind::ResourceRequirementsList => "REG_RESOURCE_REQUIREMENTS_LIST",
            ValueKind::Qword => "REG_QWORD",
            ValueKind::Unknown => "UNKNOWN",
            ValueKind::Delete => "DELETE",
        }
    }

    /// Maps a `hex(N)` type code to a kind.
    ///
    /// Codes are single hex digits as written in `.reg` source
    /// (`hex(7):` for REG_MULTI_SZ, `hex(b):` for REG_QWORD, ...).
    /// Unrecognized codes fall back to [`ValueKind::Binary`], matching
    /// the permissive handling of hand-edited files.
    pub fn from_type_code(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "0" => ValueKind::None,
            "1" => ValueKind::Sz,
            "2" => ValueKind::ExpandSz,
            "3" => ValueKind::Binary,
            "4" => ValueKind::Dword,
            "5" => ValueKind::DwordBigEndian,
            "6" => ValueKind::Link,
            "7" => ValueKind::MultiSz,
            "8" => ValueKind::ResourceList,
            "9" => ValueKind::FullResourceDescriptor,
            "a" => ValueKind::ResourceRequirementsList,
            "b" => ValueKind::Qword,
            _ => ValueKind::Binary,
        }
    }

    /// Returns the `hex(N)` type code for this kind, if it has one.
    ///
    /// [`ValueKind::Unknown`] and [`ValueKind::Delete`] have no code;
    /// they never appear behind a `hex(N):` prefix.
    pub fn type_code(&self) -> Option<char> {
        match self {
            ValueKind::None => Some('0'),
            ValueKind::Sz => Some('1'),
            ValueKind::ExpandSz => Some('2'),
            ValueKind::Binary => Some('3'),
            ValueKind::Dword => Some('4'),
            ValueKind::DwordBigEndian => Some('5'),
            ValueKind::Link => Some('6'),
            ValueKind::MultiSz => Some('7'),
            ValueKind::ResourceList => Some('8'),
            ValueKind::FullResourceDescriptor => Some('9'),
            ValueKind::ResourceRequirementsList => Some('a'),
            ValueKind::Qword => Some('b'),
            ValueKind::Unknown | ValueKind::Delete => None,
        }
    }

    /// Maps a win32 registry type code to a kind.
    ///
    /// Codes outside 0..=11 map to [`ValueKind::Unknown`]; a live read
    /// can legitimately return vendor-specific type numbers.
    pub fn from_win32(code: u32) -> Self {
        match code {
            0 => ValueKind::None,
            1 => ValueKind::Sz,
            2 => ValueKind::ExpandSz,
            3 => ValueKind::Binary,
            4 => ValueKind::Dword,
            5 => ValueKind::DwordBigEndian,
            6 => ValueKind::Link,
            7 => ValueKind::MultiSz,
            8 => ValueKind::ResourceList,
            9 => ValueKind::FullResourceDescriptor,
            10 => ValueKind::ResourceRequirementsList,
            11 => ValueKind::Qword,
            _ => ValueKind::Unknown,
        }
    }

    /// Returns the win32 type code for this kind, if it has one.
    pub fn win32(&self) -> Option<u32> {
        match self {
            ValueKind::None => Some(0),
            ValueKind::Sz => Some(1),
            ValueKind::ExpandSz => Some(2),
            ValueKind::Binary => Some(3),
            ValueKind::Dword => Some(4),
            ValueKind::DwordBigEndian => Some(5),
            ValueKind::Link => Some(6),
            ValueKind::MultiSz => Some(7),
            ValueKind::ResourceList => Some(8),
            ValueKind::FullResourceDescriptor => Some(9),
            ValueKind::ResourceRequirementsList => Some(10),
            ValueKind::Qword => Some(11),
            ValueKind::Unknown | ValueKind::Delete => None,
        }
    }
}

/// A registry value with its typed payload.
///
/// Equality is structural: the tags must agree and the payloads must be
/// equal under their natural comparison (exact case-sensitive strings,
/// unsigned integers, ordered byte and string sequences). This is exactly
/// the comparison the status checker needs, so `==` *is* the
/// match/different decision for two present values.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegistryValue {
    /// REG_NONE with whatever bytes the source carried.
    None(Vec<u8>),
    /// REG_SZ string.
    Sz(String),
    /// REG_EXPAND_SZ string.
    ExpandSz(String),
    /// REG_BINARY bytes.
    Binary(Vec<u8>),
    /// REG_DWORD unsigned 32-bit integer.
    Dword(u32),
    /// REG_DWORD_BIG_ENDIAN unsigned 32-bit integer.
    DwordBigEndian(u32),
    /// REG_LINK target string.
    Link(String),
    /// REG_MULTI_SZ ordered strings.
    MultiSz(Vec<String>),
    /// REG_RESOURCE_LIST raw bytes.
    ResourceList(Vec<u8>),
    /// REG_FULL_RESOURCE_DESCRIPTOR raw bytes.
    FullResourceDescriptor(Vec<u8>),
    /// REG_RESOURCE_REQUIREMENTS_LIST raw bytes.
    ResourceRequirementsList(Vec<u8>),
    /// REG_QWORD unsigned 64-bit integer.
    Qword(u64),
    /// Unparsable source payload, raw right-hand side preserved verbatim.
    Unknown(String),
    /// "Remove this value" intent (`"name"=-`).
    Delete,
}

impl RegistryValue {
    /// Returns the type tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            RegistryValue::None(_) => ValueKind::None,
            RegistryValue::Sz(_) => ValueKind::Sz,
            RegistryValue::ExpandSz(_) => ValueKind::ExpandSz,
            RegistryValue::Binary(_) => ValueKind::Binary,
            RegistryValue::Dword(_) => ValueKind::Dword,
            RegistryValue::DwordBigEndian(_) => ValueKind::DwordBigEndian,
            RegistryValue::Link(_) => ValueKind::Link,
            RegistryValue::MultiSz(_) => ValueKind::MultiSz,
            RegistryValue::ResourceList(_) => ValueKind::ResourceList,
            RegistryValue::FullResourceDescriptor(_) => ValueKind::FullResourceDescriptor,
            RegistryValue::ResourceRequirementsList(_) => ValueKind::ResourceRequirementsList,
            RegistryValue::Qword(_) => ValueKind::Qword,
            RegistryValue::Unknown(_) => ValueKind::Unknown,
            RegistryValue::Delete => ValueKind::Delete,
        }
    }

    /// Returns true if this is a `"name"=-` removal marker.
    pub fn is_delete(&self) -> bool {
        matches!(self, RegistryValue::Delete)
    }

    /// Renders the payload for display and reports.
    pub fn render(&self) -> String {
        match self {
            RegistryValue::None(b) if b.is_empty() => String::from("(none)"),
            RegistryValue::None(b) => hex::encode(b),
            RegistryValue::Sz(s) | RegistryValue::ExpandSz(s) | RegistryValue::Link(s) => {
                s.clone()
            }
            RegistryValue::Binary(b)
            | RegistryValue::ResourceList(b)
            | RegistryValue::FullResourceDescriptor(b)
            | RegistryValue::ResourceRequirementsList(b) => hex::encode(b),
            RegistryValue::Dword(d) | RegistryValue::DwordBigEndian(d) => {
                format!("{} (0x{:08x})", d, d)
            }
            RegistryValue::Qword(q) => format!("{} (0x{:016x})", q, q),
            RegistryValue::MultiSz(strings) => strings.join(", "),
            RegistryValue::Unknown(raw) => raw.clone(),
            RegistryValue::Delete => String::from("(delete)"),
        }
    }
}
