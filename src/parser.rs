//! Line-oriented `.reg` file parser.
//!
//! The grammar is deliberately permissive: `.reg` files in the wild are
//! hand-edited and frequently malformed, and the status checker
//! downstream must still report partial state. A malformed line never
//! rejects the document; it degrades to [`RegistryValue::Unknown`]
//! and a [`ParseIssue`] at its line number, and parsing continues.

use crate::codec::decode_value;
use crate::document::{ParseIssue, ParsedDocument, RootKey};
use crate::encoding::decode_reg_bytes;
use crate::error::Result;
use crate::value::RegistryValue;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// The `Windows Registry Editor ...` header prefix.
pub const VERSION_PREFIX: &str = "Windows Registry Editor";

/// Key path prefixes that commonly carry system-critical settings.
/// Content validation flags these with a warning.
const DANGEROUS_PREFIXES: &[&str] = &[
    "HKEY_LOCAL_MACHINE\\SYSTEM",
    "HKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run",
];

/// Result of content validation.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// False only when the content cannot be processed at all.
    pub valid: bool,
    /// Hard problems.
    pub errors: Vec<String>,
    /// Advisory findings: parse issues, missing header, risky keys.
    pub warnings: Vec<String>,
}

/// Parser for Windows Registry Editor (`.reg`) files.
///
/// Stateless and reentrant; one instance can parse any number of
/// documents from any number of call sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegFileParser;

impl RegFileParser {
    /// Creates a parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses `.reg` text into a structured document.
    ///
    /// Never fails: malformed lines are collected as issues on the
    /// returned document and an input yielding zero keys is a valid
    /// empty document.
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub fn parse(&self, text: &str) -> ParsedDocument {
        let mut doc = ParsedDocument::new();
        let mut current: Option<String> = None;

        let raw_lines: Vec<&str> = text.lines().collect();
        let mut i = 0;
        while i < raw_lines.len() {
            let line_no = i + 1;
            let mut line = raw_lines[i].trim().to_string();

            // A value line ending in `\` continues on the next physical
            // line (multi-line hex data). Issues keep the first line's
            // number. Comment lines never join; `;` makes the whole
            // physical line a no-op regardless of what it ends with.
            if line.contains('=') && !line.starts_with(';') {
                while line.ends_with('\\') && i + 1 < raw_lines.len() {
                    line.pop();
                    i += 1;
                    line.push_str(raw_lines[i].trim());
                }
            }
            i += 1;

            self.classify_line(&line, line_no, &mut current, &mut doc);
        }

        info!(
            keys = doc.key_count(),
            deleted = doc.deleted_keys().len(),
            issues = doc.issues.len(),
            "parse finished"
        );
        doc
    }

    /// Reads and parses a `.reg` file from disk.
    ///
    /// Handles the encodings `.reg` files ship in (UTF-8 with or
    /// without BOM, UTF-16, windows-1252 fallback).
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O failures; content problems land in
    /// the document's issue list as usual.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn parse_path<P: AsRef<Path>>(&self, path: P) -> Result<ParsedDocument> {
        let bytes = fs::read(path)?;
        debug!(bytes = bytes.len(), "file read");
        Ok(self.parse(&decode_reg_bytes(&bytes)))
    }

    /// Validates `.reg` content, reporting advisory findings.
    ///
    /// Parse issues, a missing version header, an empty document, and
    /// keys under well-known dangerous prefixes all surface as warnings;
    /// the content is still processable.
    pub fn validate(&self, text: &str) -> Validation {
        let doc = self.parse(text);
        let mut result = Validation {
            valid: true,
            ..Validation::default()
        };

        for issue in &doc.issues {
            result.warnings.push(issue.to_string());
        }
        if doc.version.is_none() {
            result
                .warnings
                .push(String::from("no registry version header found"));
        }
        if doc.is_empty() {
            result
                .warnings
                .push(String::from("no registry entries found"));
        }
        for key in doc.keys() {
            for prefix in DANGEROUS_PREFIXES {
                if key.path.starts_with(prefix) {
                    result
                        .warnings
                        .push(format!("potentially dangerous key: {}", key.path));
                }
            }
        }
        if !result.warnings.is_empty() {
            warn!(warnings = result.warnings.len(), "validation findings");
        }
        result
    }

    fn classify_line(
        &self,
        line: &str,
        line_no: usize,
        current: &mut Option<String>,
        doc: &mut ParsedDocument,
    ) {
        if line.is_empty() || line.starts_with(';') {
            return;
        }

        if line.starts_with(VERSION_PREFIX) {
            // First occurrence wins.
            if doc.version.is_none() {
                doc.version = Some(line.to_string());
            }
            return;
        }

        if let Some(path) = line
            .strip_prefix("[-")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            // Records the deletion without opening a value context; a
            // previously opened key stays current.
            doc.mark_deleted(path);
            return;
        }

        if let Some(path) = line
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            // Permissive: the path is not checked against the root hive
            // whitelist here. The checker resolves (or fails to resolve)
            // it later.
            doc.open_key(path);
            *current = Some(path.to_string());
            return;
        }

        if let Some(rhs) = line.strip_prefix("@=") {
            if let Some(key_path) = current.clone() {
                let value = self.decode_or_degrade(rhs, line_no, doc);
                doc.open_key(&key_path).default_value = Some(value);
            }
            // No open key: value lines are silently dropped.
            return;
        }

        if let Some((name, rhs)) = split_named_value(line) {
            if let Some(key_path) = current.clone() {
                let value = if rhs == "-" {
                    RegistryValue::Delete
                } else {
                    self.decode_or_degrade(rhs, line_no, doc)
                };
                doc.open_key(&key_path).set_value(name, value);
            }
            return;
        }

        doc.issues
            .push(ParseIssue::new(line_no, format!("unrecognized line: {line}")));
    }

    /// Decodes one right-hand side, degrading to `Unknown` on failure.
    fn decode_or_degrade(
        &self,
        raw: &str,
        line_no: usize,
        doc: &mut ParsedDocument,
    ) -> RegistryValue {
        match decode_value(raw) {
            Ok(value) => value,
            Err(message) => {
                debug!(line = line_no, %message, "value degraded to UNKNOWN");
                doc.issues.push(ParseIssue::new(line_no, message));
                RegistryValue::Unknown(raw.trim().to_string())
            }
        }
    }
}

/// Splits a `"name"=rhs` line into name and right-hand side.
///
/// Names contain no quotes (matching the `.reg` grammar), so the first
/// `"=` after the opening quote terminates the name. The right-hand
/// side must be non-empty.
fn split_named_value(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('"')?;
    let (name, rhs) = rest.split_once("\"=")?;
    if name.contains('"') || rhs.is_empty() {
        return None;
    }
    Some((name, rhs))
}

/// Returns true when every key path in the document resolves to a known
/// root hive. Purely advisory; parsing never enforces this.
pub fn all_paths_resolvable(doc: &ParsedDocument) -> bool {
    doc.keys().all(|k| RootKey::split(&k.path).is_some())
        && doc
            .deleted_keys()
            .iter()
            .all(|p| RootKey::split(p).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RegistryValue;

    fn parse(text: &str) -> ParsedDocument {
        RegFileParser::new().parse(text)
    }

    #[test]
    fn test_split_named_value() {
        assert_eq!(split_named_value("\"A\"=dword:01"), Some(("A", "dword:01")));
        assert_eq!(split_named_value("\"\"=\"x\""), Some(("", "\"x\"")));
        assert_eq!(split_named_value("\"A\"="), None);
        assert_eq!(split_named_value("A=1"), None);
    }

    #[test]
    fn test_version_header_first_occurrence_wins() {
        let doc = parse(
            "Windows Registry Editor Version 5.00\n\
             Windows Registry Editor Version 4.00\n",
        );
        assert_eq!(
            doc.version.as_deref(),
            Some("Windows Registry Editor Version 5.00")
        );
    }

    #[test]
    fn test_comments_and_blank_lines_are_ignored() {
        let doc = parse("; a comment\n\n;; another\n");
        assert!(doc.is_empty());
        assert!(doc.issues.is_empty());
    }

    #[test]
    fn test_comment_ending_in_backslash_does_not_swallow_next_line() {
        let doc = parse(
            "[HKEY_CURRENT_USER\\Software\\T]\n\
             ; note: x=1\\\n\
             \"Flag\"=dword:00000001\n",
        );
        let key = doc.key("HKEY_CURRENT_USER\\Software\\T").unwrap();
        assert_eq!(key.value("Flag"), Some(&RegistryValue::Dword(1)));
        assert!(doc.issues.is_empty());
    }

    #[test]
    fn test_key_reopening_merges() {
        let doc = parse(
            "[HKEY_CURRENT_USER\\Software\\T]\n\
             \"A\"=dword:00000001\n\
             [HKEY_CURRENT_USER\\Software\\Other]\n\
             [HKEY_CURRENT_USER\\Software\\T]\n\
             \"A\"=dword:00000002\n\
             \"B\"=\"b\"\n",
        );
        assert_eq!(doc.key_count(), 2);
        let key = doc.key("HKEY_CURRENT_USER\\Software\\T").unwrap();
        assert_eq!(key.value("A"), Some(&RegistryValue::Dword(2)));
        assert_eq!(key.value("B"), Some(&RegistryValue::Sz("b".into())));
    }

    #[test]
    fn test_delete_key_marker() {
        let doc = parse("[-HKEY_CURRENT_USER\\Software\\Old]\n");
        assert_eq!(doc.deleted_keys(), ["HKEY_CURRENT_USER\\Software\\Old"]);
        assert_eq!(doc.key_count(), 0);
    }

    #[test]
    fn test_value_lines_without_key_context_are_dropped_silently() {
        let doc = parse(
            "[-HKEY_CURRENT_USER\\Software\\Old]\n\
             \"Orphan\"=dword:00000001\n\
             @=\"orphan default\"\n",
        );
        assert_eq!(doc.key_count(), 0);
        assert!(doc.issues.is_empty());
    }

    #[test]
    fn test_values_after_delete_marker_attach_to_prior_key() {
        // A deletion marker does not close a previously opened key.
        let doc = parse(
            "[HKEY_CURRENT_USER\\Software\\T]\n\
             [-HKEY_CURRENT_USER\\Software\\Old]\n\
             \"A\"=dword:00000001\n",
        );
        let key = doc.key("HKEY_CURRENT_USER\\Software\\T").unwrap();
        assert_eq!(key.value("A"), Some(&RegistryValue::Dword(1)));
    }

    #[test]
    fn test_default_value() {
        let doc = parse("[HKEY_CURRENT_USER\\Software\\T]\n@=\"hello\"\n");
        let key = doc.key("HKEY_CURRENT_USER\\Software\\T").unwrap();
        assert_eq!(key.default_value, Some(RegistryValue::Sz("hello".into())));
    }

    #[test]
    fn test_delete_value_marker() {
        let doc = parse("[HKEY_CURRENT_USER\\Software\\T]\n\"Gone\"=-\n");
        let key = doc.key("HKEY_CURRENT_USER\\Software\\T").unwrap();
        assert_eq!(key.value("Gone"), Some(&RegistryValue::Delete));
    }

    #[test]
    fn test_malformed_line_degrades_and_parsing_continues() {
        let doc = parse(
            "[HKEY_CURRENT_USER\\Software\\T]\n\
             garbage line\n\
             \"A\"=dword:00000001\n",
        );
        let key = doc.key("HKEY_CURRENT_USER\\Software\\T").unwrap();
        assert_eq!(key.value("A"), Some(&RegistryValue::Dword(1)));
        assert_eq!(doc.issues.len(), 1);
        assert_eq!(doc.issues[0].line, 2);
    }

    #[test]
    fn test_bad_dword_becomes_unknown_with_issue() {
        let doc = parse("[HKEY_CURRENT_USER\\Software\\T]\n\"A\"=dword:zz\n");
        let key = doc.key("HKEY_CURRENT_USER\\Software\\T").unwrap();
        assert_eq!(
            key.value("A"),
            Some(&RegistryValue::Unknown("dword:zz".into()))
        );
        assert_eq!(doc.issues.len(), 1);
        assert_eq!(doc.issues[0].line, 2);
    }

    #[test]
    fn test_hex_continuation() {
        let doc = parse(
            "[HKEY_CURRENT_USER\\Software\\T]\n\
             \"Bin\"=hex:00,01,02,03,04,05,06,07,08,09,0a,0b,0c,0d,0e,0f,\\\n\
             \x20\x2010,11,12,13\n",
        );
        let key = doc.key("HKEY_CURRENT_USER\\Software\\T").unwrap();
        assert_eq!(
            key.value("Bin"),
            Some(&RegistryValue::Binary((0..20u8).collect()))
        );
        assert!(doc.issues.is_empty());
    }

    #[test]
    fn test_empty_input_is_a_valid_empty_document() {
        let doc = parse("");
        assert!(doc.is_empty());
        assert!(doc.issues.is_empty());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "Windows Registry Editor Version 5.00\n\n\
                    [HKEY_CURRENT_USER\\Software\\T]\n\
                    \"A\"=dword:00000001\n\
                    bad line\n";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_validate_warnings() {
        let parser = RegFileParser::new();

        let v = parser.validate("");
        assert!(v.valid);
        assert!(v.warnings.iter().any(|w| w.contains("version")));
        assert!(v.warnings.iter().any(|w| w.contains("no registry entries")));

        let v = parser.validate(
            "Windows Registry Editor Version 5.00\n\
             [HKEY_LOCAL_MACHINE\\SYSTEM\\Setup]\n\
             \"A\"=dword:00000001\n",
        );
        assert!(v.valid);
        assert!(v.warnings.iter().any(|w| w.contains("dangerous")));
    }

    #[test]
    fn test_all_paths_resolvable() {
        let doc = parse("[HKEY_CURRENT_USER\\Software\\T]\n");
        assert!(all_paths_resolvable(&doc));
        let doc = parse("[MYCOMPUTER\\Software\\T]\n");
        assert!(!all_paths_resolvable(&doc));
    }
}
