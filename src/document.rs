//! Parsed `.reg` document model.
//!
//! A [`ParsedDocument`] is the structured form of one `.reg` file:
//! an ordered, deduplicated set of keys with their declared values, a
//! list of keys marked for deletion, the recognized version header, and
//! the non-fatal issues collected while parsing. Documents are built
//! once by the parser (or by hand through the constructors here) and
//! consumed read-only by the status checker and the writer.

use crate::value::{RegistryValue, ValueKind};
use std::collections::HashMap;

/// Well-known registry root hives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RootKey {
    /// HKEY_CLASSES_ROOT
    ClassesRoot,
    /// HKEY_CURRENT_USER
    CurrentUser,
    /// HKEY_LOCAL_MACHINE
    LocalMachine,
    /// HKEY_USERS
    Users,
    /// HKEY_CURRENT_CONFIG
    CurrentConfig,
}

impl RootKey {
    /// All root hives, in the conventional order.
    pub const ALL: [RootKey; 5] = [
        RootKey::ClassesRoot,
        RootKey::CurrentUser,
        RootKey::LocalMachine,
        RootKey::Users,
        RootKey::CurrentConfig,
    ];

    /// Returns the full HKEY_* name.
    pub fn name(&self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootKey::CurrentUser => "HKEY_CURRENT_USER",
            RootKey::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootKey::Users => "HKEY_USERS",
            RootKey::CurrentConfig => "HKEY_CURRENT_CONFIG",
        }
    }

    /// Returns the common abbreviation (HKCU, HKLM, ...).
    pub fn short_name(&self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKCR",
            RootKey::CurrentUser => "HKCU",
            RootKey::LocalMachine => "HKLM",
            RootKey::Users => "HKU",
            RootKey::CurrentConfig => "HKCC",
        }
    }

    /// Splits a full key path into its root hive and subpath.
    ///
    /// Returns `None` when the path does not start with a recognized
    /// HKEY_* name. The subpath has leading backslashes stripped and may
    /// be empty for a bare hive path.
    pub fn split(path: &str) -> Option<(RootKey, &str)> {
        for root in RootKey::ALL {
            if let Some(rest) = path.strip_prefix(root.name()) {
                if rest.is_empty() || rest.starts_with('\\') {
                    return Some((root, rest.trim_start_matches('\\')));
                }
            }
        }
        None
    }
}

/// One non-fatal problem found while parsing, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseIssue {
    /// 1-based line number in the source text.
    pub line: usize,
    /// Description of the problem.
    pub message: String,
}

impl ParseIssue {
    /// Creates an issue at the given line.
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// A registry key with its declared default and named values.
///
/// Value names keep their insertion order for deterministic
/// serialization; setting an existing name replaces the payload in
/// place. The empty string is an ordinary value name, distinct from
/// the default (`@=`) value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryKey {
    /// Full path: root hive name plus backslash-delimited subpath.
    pub path: String,
    /// The unnamed `@=` value, if declared.
    pub default_value: Option<RegistryValue>,
    values: Vec<(String, RegistryValue)>,
}

impl RegistryKey {
    /// Creates an empty key at the given path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_value: None,
            values: Vec::new(),
        }
    }

    /// Sets a named value, replacing an earlier one with the same name.
    pub fn set_value(&mut self, name: impl Into<String>, value: RegistryValue) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name, value)),
        }
    }

    /// Looks up a named value.
    pub fn value(&self, name: &str) -> Option<&RegistryValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterates named values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &RegistryValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of named values (the default value does not count).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the key declares no values at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.default_value.is_none()
    }
}

/// Aggregate statistics over a parsed document.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentSummary {
    /// Number of declared keys.
    pub total_keys: usize,
    /// Number of keys marked for deletion.
    pub deleted_keys: usize,
    /// Number of declared values, default values included.
    pub total_values: usize,
    /// Value count per REG_* type name.
    pub value_kinds: HashMap<String, usize>,
    /// Number of parse issues.
    pub errors: usize,
    /// Distinct root hive names, in order of first appearance.
    pub root_keys: Vec<String>,
}

/// The structured form of one `.reg` file.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedDocument {
    /// Recognized `Windows Registry Editor ...` header, first occurrence.
    pub version: Option<String>,
    keys: Vec<RegistryKey>,
    deleted_keys: Vec<String>,
    /// Non-fatal problems collected during parsing.
    pub issues: Vec<ParseIssue>,
}

impl ParsedDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or reopens) a key, returning a mutable handle.
    ///
    /// Reopening a path already in the document returns the existing
    /// entry, so later sections merge instead of duplicating.
    pub fn open_key(&mut self, path: &str) -> &mut RegistryKey {
        if let Some(idx) = self.keys.iter().position(|k| k.path == path) {
            return &mut self.keys[idx];
        }
        self.keys.push(RegistryKey::new(path));
        self.keys.last_mut().unwrap()
    }

    /// Looks up a key by path.
    pub fn key(&self, path: &str) -> Option<&RegistryKey> {
        self.keys.iter().find(|k| k.path == path)
    }

    /// Iterates keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &RegistryKey> {
        self.keys.iter()
    }

    /// Number of declared keys.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Marks a key path for deletion (`[-PATH]`). Duplicates are ignored.
    pub fn mark_deleted(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.deleted_keys.contains(&path) {
            self.deleted_keys.push(path);
        }
    }

    /// Key paths marked for deletion, in declaration order.
    pub fn deleted_keys(&self) -> &[String] {
        &self.deleted_keys
    }

    /// Returns true if the document declares neither keys nor deletions.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.deleted_keys.is_empty()
    }

    /// Merges another document into this one.
    ///
    /// Keys merge by path with the other document's values overwriting
    /// same-named values; deletion markers accumulate without duplicates.
    pub fn merge(&mut self, other: &ParsedDocument) {
        for key in other.keys() {
            let target = self.open_key(&key.path);
            if key.default_value.is_some() {
                target.default_value = key.default_value.clone();
            }
            for (name, value) in key.values() {
                target.set_value(name, value.clone());
            }
        }
        for path in other.deleted_keys() {
            self.mark_deleted(path.clone());
        }
    }

    /// Computes aggregate statistics over the document.
    pub fn summary(&self) -> DocumentSummary {
        let mut summary = DocumentSummary {
            total_keys: self.keys.len(),
            deleted_keys: self.deleted_keys.len(),
            errors: self.issues.len(),
            ..DocumentSummary::default()
        };

        let count = |kind: ValueKind, summary: &mut DocumentSummary| {
            *summary
                .value_kinds
                .entry(kind.name().to_string())
                .or_insert(0) += 1;
            summary.total_values += 1;
        };

        for key in &self.keys {
            let root = key.path.split('\\').next().unwrap_or("").to_string();
            if !root.is_empty() && !summary.root_keys.contains(&root) {
                summary.root_keys.push(root);
            }
            if let Some(default) = &key.default_value {
                count(default.kind(), &mut summary);
            }
            for (_, value) in key.values() {
                count(value.kind(), &mut summary);
            }
        }
        summary
    }

    /// Builds a document declaring a single string value.
    pub fn single_string(path: &str, name: &str, data: &str) -> Self {
        let mut doc = Self::new();
        doc.open_key(path)
            .set_value(name, RegistryValue::Sz(data.to_string()));
        doc
    }

    /// Builds a document declaring a single DWORD value.
    pub fn single_dword(path: &str, name: &str, data: u32) -> Self {
        let mut doc = Self::new();
        doc.open_key(path).set_value(name, RegistryValue::Dword(data));
        doc
    }

    /// Builds a document that deletes one key.
    pub fn delete_key(path: &str) -> Self {
        let mut doc = Self::new();
        doc.mark_deleted(path);
        doc
    }

    /// Builds a document that deletes one named value.
    pub fn delete_value(path: &str, name: &str) -> Self {
        let mut doc = Self::new();
        doc.open_key(path).set_value(name, RegistryValue::Delete);
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_key_split() {
        let (root, sub) = RootKey::split("HKEY_CURRENT_USER\\Software\\Test").unwrap();
        assert_eq!(root, RootKey::CurrentUser);
        assert_eq!(sub, "Software\\Test");

        let (root, sub) = RootKey::split("HKEY_USERS").unwrap();
        assert_eq!(root, RootKey::Users);
        assert_eq!(sub, "");

        assert!(RootKey::split("HKEY_BOGUS\\X").is_none());
        // A prefix match must end at a path separator
        assert!(RootKey::split("HKEY_USERSX\\Y").is_none());
    }

    #[test]
    fn test_root_key_names() {
        assert_eq!(RootKey::LocalMachine.name(), "HKEY_LOCAL_MACHINE");
        assert_eq!(RootKey::LocalMachine.short_name(), "HKLM");
    }

    #[test]
    fn test_set_value_overwrites_in_place() {
        let mut key = RegistryKey::new("HKEY_CURRENT_USER\\Software\\Test");
        key.set_value("A", RegistryValue::Dword(1));
        key.set_value("B", RegistryValue::Dword(2));
        key.set_value("A", RegistryValue::Dword(3));

        assert_eq!(key.len(), 2);
        assert_eq!(key.value("A"), Some(&RegistryValue::Dword(3)));
        let names: Vec<&str> = key.values().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_empty_string_is_a_distinct_value_name() {
        let mut key = RegistryKey::new("HKEY_CURRENT_USER\\Software\\Test");
        key.set_value("", RegistryValue::Sz("empty name".into()));
        key.default_value = Some(RegistryValue::Sz("default".into()));

        assert_eq!(key.value(""), Some(&RegistryValue::Sz("empty name".into())));
        assert_eq!(key.default_value, Some(RegistryValue::Sz("default".into())));
    }

    #[test]
    fn test_open_key_deduplicates() {
        let mut doc = ParsedDocument::new();
        doc.open_key("HKEY_CURRENT_USER\\A")
            .set_value("X", RegistryValue::Dword(1));
        doc.open_key("HKEY_CURRENT_USER\\A")
            .set_value("Y", RegistryValue::Dword(2));

        assert_eq!(doc.key_count(), 1);
        let key = doc.key("HKEY_CURRENT_USER\\A").unwrap();
        assert_eq!(key.len(), 2);
    }

    #[test]
    fn test_mark_deleted_deduplicates() {
        let mut doc = ParsedDocument::new();
        doc.mark_deleted("HKEY_CURRENT_USER\\Old");
        doc.mark_deleted("HKEY_CURRENT_USER\\Old");
        assert_eq!(doc.deleted_keys().len(), 1);
    }

    #[test]
    fn test_merge() {
        let mut a = ParsedDocument::single_dword("HKEY_CURRENT_USER\\K", "V", 1);
        let mut b = ParsedDocument::single_dword("HKEY_CURRENT_USER\\K", "V", 2);
        b.open_key("HKEY_CURRENT_USER\\K")
            .set_value("W", RegistryValue::Sz("w".into()));
        b.mark_deleted("HKEY_CURRENT_USER\\Old");

        a.merge(&b);
        let key = a.key("HKEY_CURRENT_USER\\K").unwrap();
        assert_eq!(key.value("V"), Some(&RegistryValue::Dword(2)));
        assert_eq!(key.value("W"), Some(&RegistryValue::Sz("w".into())));
        assert_eq!(a.deleted_keys(), ["HKEY_CURRENT_USER\\Old"]);
    }

    #[test]
    fn test_summary() {
        let mut doc = ParsedDocument::new();
        let key = doc.open_key("HKEY_CURRENT_USER\\K");
        key.default_value = Some(RegistryValue::Sz("d".into()));
        key.set_value("A", RegistryValue::Dword(1));
        key.set_value("B", RegistryValue::Dword(2));
        doc.open_key("HKEY_LOCAL_MACHINE\\L")
            .set_value("C", RegistryValue::Sz("c".into()));
        doc.mark_deleted("HKEY_CURRENT_USER\\Old");

        let summary = doc.summary();
        assert_eq!(summary.total_keys, 2);
        assert_eq!(summary.deleted_keys, 1);
        assert_eq!(summary.total_values, 4);
        assert_eq!(summary.value_kinds["REG_DWORD"], 2);
        assert_eq!(summary.value_kinds["REG_SZ"], 2);
        assert_eq!(
            summary.root_keys,
            vec!["HKEY_CURRENT_USER", "HKEY_LOCAL_MACHINE"]
        );
    }
}
