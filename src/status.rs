//! Live-state status checking for parsed `.reg` documents.
//!
//! The checker compares a document's declared state against a live
//! registry reached through the narrow [`ReadCapability`] seam, and
//! produces a [`StatusReport`]: per-key existence, per-value verdicts,
//! rollup statistics, and a derived overall status. Registry "not
//! found" conditions are routine classification inputs; any other
//! access failure is recorded on the affected entity and never aborts
//! the check.

use crate::document::{ParsedDocument, RegistryKey};
use crate::error::Result;
use crate::value::RegistryValue;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Report name used for a key's default (`@=`) value.
pub const DEFAULT_VALUE_NAME: &str = "@";

/// Read-only access to a live registry.
///
/// Implementations bind this to the real OS registry in production and
/// to [`MemoryRegistry`] in tests. "Not found" is expressed in the
/// types (`Ok(false)` / `Ok(None)`), never as an error; `Err` is
/// reserved for genuine access failures such as permission problems.
pub trait ReadCapability {
    /// Returns whether the key at the given full path exists.
    fn key_exists(&self, path: &str) -> Result<bool>;

    /// Reads a value under the key at `path`.
    ///
    /// `name` is `None` for the key's default value. Returns `Ok(None)`
    /// when the key exists but carries no such value.
    fn read_value(&self, path: &str, name: Option<&str>) -> Result<Option<RegistryValue>>;
}

/// In-memory [`ReadCapability`] backend.
///
/// Holds keys and values directly; paths match exactly (no case
/// folding). Used by the test suites and by callers that want to check
/// a document against a snapshot rather than a live system.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    keys: BTreeMap<String, MemoryKey>,
}

#[derive(Debug, Clone, Default)]
struct MemoryKey {
    default: Option<RegistryValue>,
    values: BTreeMap<String, RegistryValue>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a key without values; a no-op if it already exists.
    pub fn add_key(&mut self, path: &str) {
        self.keys.entry(path.to_string()).or_default();
    }

    /// Sets a value, creating the key as needed.
    ///
    /// `name` is `None` for the default value.
    pub fn set_value(&mut self, path: &str, name: Option<&str>, value: RegistryValue) {
        let key = self.keys.entry(path.to_string()).or_default();
        match name {
            Some(name) => {
                key.values.insert(name.to_string(), value);
            }
            None => key.default = Some(value),
        }
    }
}

impl ReadCapability for MemoryRegistry {
    fn key_exists(&self, path: &str) -> Result<bool> {
        Ok(self.keys.contains_key(path))
    }

    fn read_value(&self, path: &str, name: Option<&str>) -> Result<Option<RegistryValue>> {
        let Some(key) = self.keys.get(path) else {
            return Ok(None);
        };
        Ok(match name {
            Some(name) => key.values.get(name).cloned(),
            None => key.default.clone(),
        })
    }
}

/// Classification of one declared value against its live counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValueVerdict {
    /// Live value present and equal to the declared one.
    Match,
    /// Live value present but its tag or payload differs.
    Different,
    /// Declared value absent from the live registry.
    Missing,
    /// Declared for deletion but still present live.
    ShouldNotExist,
    /// Declared for deletion and indeed absent.
    CorrectlyDeleted,
}

impl ValueVerdict {
    /// Returns the snake_case name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            ValueVerdict::Match => "match",
            ValueVerdict::Different => "different",
            ValueVerdict::Missing => "missing",
            ValueVerdict::ShouldNotExist => "should_not_exist",
            ValueVerdict::CorrectlyDeleted => "correctly_deleted",
        }
    }
}

/// Status of one declared value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueStatus {
    /// Value name; [`DEFAULT_VALUE_NAME`] for the default value.
    pub name: String,
    /// Classification verdict.
    pub verdict: ValueVerdict,
    /// The declared value.
    pub expected: RegistryValue,
    /// The live value, when one could be read.
    pub actual: Option<RegistryValue>,
    /// Access failure recorded for this value, if any.
    pub error: Option<String>,
}

/// Status of one key from the document.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyStatus {
    /// Full key path.
    pub path: String,
    /// Whether the key exists in the live registry.
    pub exists: bool,
    /// True for `[-PATH]` entries.
    pub expected_deleted: bool,
    /// Deletion classification, set only when `expected_deleted`.
    pub deletion: Option<ValueVerdict>,
    /// Per-value statuses; empty for deletion entries.
    pub values: Vec<ValueStatus>,
    /// Access failures recorded for this key.
    pub errors: Vec<String>,
}

impl KeyStatus {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            exists: false,
            expected_deleted: false,
            deletion: None,
            values: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Looks up a value status by name.
    pub fn value(&self, name: &str) -> Option<&ValueStatus> {
        self.values.iter().find(|v| v.name == name)
    }
}

/// Rollup statistics over a status report.
///
/// Every value under a non-deleted key counts toward `total_values` and
/// lands in exactly one of the three value buckets; verdicts other than
/// match/different fall into `missing_values`. Deletion entries
/// (`[-PATH]`) carry no values and touch none of these counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    /// Keys processed (deletion entries excluded).
    pub total_keys: usize,
    /// Keys that exist live.
    pub active_keys: usize,
    /// Keys absent live.
    pub missing_keys: usize,
    /// Values classified.
    pub total_values: usize,
    /// Values with verdict `match`.
    pub matching_values: usize,
    /// Values with verdict `different`.
    pub different_values: usize,
    /// Everything else.
    pub missing_values: usize,
}

/// Overall verdict derived from a [`Summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OverallStatus {
    /// Every value matches.
    AllActive,
    /// No value matches.
    AllInactive,
    /// Some values match, some do not.
    Partial,
    /// Nothing to compare.
    Unknown,
}

impl OverallStatus {
    /// Returns the snake_case name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            OverallStatus::AllActive => "all_active",
            OverallStatus::AllInactive => "all_inactive",
            OverallStatus::Partial => "partial",
            OverallStatus::Unknown => "unknown",
        }
    }
}

/// Derives the overall status from rollup statistics.
///
/// Pure function, usable on its own for re-aggregation:
/// no values at all is `Unknown`, all matching is `AllActive`, none
/// matching is `AllInactive`, anything in between is `Partial`.
pub fn derive_overall_status(summary: &Summary) -> OverallStatus {
    if summary.total_values == 0 {
        OverallStatus::Unknown
    } else if summary.matching_values == summary.total_values {
        OverallStatus::AllActive
    } else if summary.matching_values == 0 {
        OverallStatus::AllInactive
    } else {
        OverallStatus::Partial
    }
}

/// Full status report for one document.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusReport {
    /// RFC 3339 timestamp of the check.
    pub timestamp: String,
    /// Per-key statuses, document order; deletion entries last.
    pub keys: Vec<KeyStatus>,
    /// Rollup statistics.
    pub summary: Summary,
    /// Derived overall verdict.
    pub overall: OverallStatus,
}

impl StatusReport {
    /// Looks up a key status by path.
    pub fn key(&self, path: &str) -> Option<&KeyStatus> {
        self.keys.iter().find(|k| k.path == path)
    }

    /// Renders a short human-readable summary.
    pub fn summary_text(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![
            String::from("Registry status summary:"),
            String::new(),
            format!("Keys: {}/{} active", s.active_keys, s.total_keys),
            format!("Values: {}/{} matching", s.matching_values, s.total_values),
            format!("Overall: {}", self.overall.name()),
        ];
        if s.missing_keys > 0 {
            lines.push(format!("{} keys missing", s.missing_keys));
        }
        if s.different_values > 0 {
            lines.push(format!("{} values differ", s.different_values));
        }
        if s.missing_values > 0 {
            lines.push(format!("{} values missing", s.missing_values));
        }
        lines.join("\n")
    }

    /// Serializes the report as pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            crate::error::RegError::InvalidDocument(format!("report serialization failed: {e}"))
        })
    }

    /// Writes the report to disk as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    #[cfg(feature = "serde")]
    pub fn export<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Checker that diffs a parsed document against a live registry.
///
/// Stateless and reentrant: one instance can run any number of checks,
/// and concurrent checks from independent call sites share nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryStatusChecker;

impl RegistryStatusChecker {
    /// Creates a checker.
    pub fn new() -> Self {
        Self
    }

    /// Checks every key and value in the document against the registry.
    ///
    /// Never aborts mid-check: unreadable keys or values are recorded
    /// on their report entries and classification continues.
    #[instrument(skip_all, fields(keys = doc.key_count(), deleted = doc.deleted_keys().len()))]
    pub fn check(&self, doc: &ParsedDocument, registry: &dyn ReadCapability) -> StatusReport {
        let mut report = StatusReport {
            timestamp: Utc::now().to_rfc3339(),
            keys: Vec::new(),
            summary: Summary::default(),
            overall: OverallStatus::Unknown,
        };

        for key in doc.keys() {
            let status = self.check_key(key, registry);

            report.summary.total_keys += 1;
            if status.exists {
                report.summary.active_keys += 1;
            } else {
                report.summary.missing_keys += 1;
            }
            for value in &status.values {
                report.summary.total_values += 1;
                match value.verdict {
                    ValueVerdict::Match => report.summary.matching_values += 1,
                    ValueVerdict::Different => report.summary.different_values += 1,
                    _ => report.summary.missing_values += 1,
                }
            }
            report.keys.push(status);
        }

        // Deletion markers: existence only, no value comparison.
        for path in doc.deleted_keys() {
            let mut status = KeyStatus::new(path);
            status.expected_deleted = true;
            match registry.key_exists(path) {
                Ok(exists) => status.exists = exists,
                Err(e) => status.errors.push(e.to_string()),
            }
            status.deletion = Some(if status.exists {
                ValueVerdict::ShouldNotExist
            } else {
                ValueVerdict::CorrectlyDeleted
            });
            report.keys.push(status);
        }

        report.overall = derive_overall_status(&report.summary);
        info!(
            overall = report.overall.name(),
            matching = report.summary.matching_values,
            total = report.summary.total_values,
            "status check finished"
        );
        report
    }

    fn check_key(&self, key: &RegistryKey, registry: &dyn ReadCapability) -> KeyStatus {
        let mut status = KeyStatus::new(&key.path);

        // Resolution failures and hard access errors both fold into the
        // not-found classification path, with the error kept on record.
        status.exists = match registry.key_exists(&key.path) {
            Ok(exists) => exists,
            Err(e) => {
                status.errors.push(e.to_string());
                false
            }
        };

        if !status.exists {
            debug!(path = %key.path, "key missing, declared values classified missing");
            if let Some(default) = &key.default_value {
                status
                    .values
                    .push(missing_status(DEFAULT_VALUE_NAME, default));
            }
            for (name, expected) in key.values() {
                status.values.push(missing_status(name, expected));
            }
            return status;
        }

        if let Some(default) = &key.default_value {
            let read = registry.read_value(&key.path, None);
            status
                .values
                .push(classify(DEFAULT_VALUE_NAME, default, read));
        }
        for (name, expected) in key.values() {
            let read = registry.read_value(&key.path, Some(name));
            status.values.push(classify(name, expected, read));
        }
        status
    }
}

fn missing_status(name: &str, expected: &RegistryValue) -> ValueStatus {
    ValueStatus {
        name: name.to_string(),
        verdict: ValueVerdict::Missing,
        expected: expected.clone(),
        actual: None,
        error: None,
    }
}

/// Classifies one declared value against the outcome of its live read.
fn classify(
    name: &str,
    expected: &RegistryValue,
    read: Result<Option<RegistryValue>>,
) -> ValueStatus {
    let mut status = missing_status(name, expected);
    match read {
        Ok(Some(actual)) => {
            status.verdict = if expected.is_delete() {
                // Content of the live value is irrelevant here.
                ValueVerdict::ShouldNotExist
            } else if *expected == actual {
                ValueVerdict::Match
            } else {
                ValueVerdict::Different
            };
            status.actual = Some(actual);
        }
        Ok(None) => {
            status.verdict = if expected.is_delete() {
                ValueVerdict::CorrectlyDeleted
            } else {
                ValueVerdict::Missing
            };
        }
        Err(e) => {
            // Best-known partial classification stays `missing`.
            status.error = Some(e.to_string());
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegError;

    fn doc_one_dword() -> ParsedDocument {
        ParsedDocument::single_dword("HKEY_CURRENT_USER\\Software\\Test", "Flag", 1)
    }

    #[test]
    fn test_overall_status_table() {
        let mut s = Summary::default();
        assert_eq!(derive_overall_status(&s), OverallStatus::Unknown);

        s.total_values = 4;
        s.matching_values = 4;
        assert_eq!(derive_overall_status(&s), OverallStatus::AllActive);

        s.matching_values = 0;
        assert_eq!(derive_overall_status(&s), OverallStatus::AllInactive);

        s.matching_values = 2;
        assert_eq!(derive_overall_status(&s), OverallStatus::Partial);
    }

    #[test]
    fn test_matching_value() {
        let mut registry = MemoryRegistry::new();
        registry.set_value(
            "HKEY_CURRENT_USER\\Software\\Test",
            Some("Flag"),
            RegistryValue::Dword(1),
        );

        let report = RegistryStatusChecker::new().check(&doc_one_dword(), &registry);
        let key = report.key("HKEY_CURRENT_USER\\Software\\Test").unwrap();
        assert!(key.exists);
        assert_eq!(key.value("Flag").unwrap().verdict, ValueVerdict::Match);
        assert_eq!(report.summary.matching_values, 1);
        assert_eq!(report.overall, OverallStatus::AllActive);
    }

    #[test]
    fn test_different_tag_is_different() {
        let mut registry = MemoryRegistry::new();
        registry.set_value(
            "HKEY_CURRENT_USER\\Software\\Test",
            Some("Flag"),
            RegistryValue::Sz("1".into()),
        );

        let report = RegistryStatusChecker::new().check(&doc_one_dword(), &registry);
        let key = report.key("HKEY_CURRENT_USER\\Software\\Test").unwrap();
        assert_eq!(key.value("Flag").unwrap().verdict, ValueVerdict::Different);
        assert_eq!(report.summary.different_values, 1);
    }

    #[test]
    fn test_missing_key_marks_all_values_missing() {
        let registry = MemoryRegistry::new();
        let mut doc = doc_one_dword();
        doc.open_key("HKEY_CURRENT_USER\\Software\\Test")
            .default_value = Some(RegistryValue::Sz("d".into()));

        let report = RegistryStatusChecker::new().check(&doc, &registry);
        let key = report.key("HKEY_CURRENT_USER\\Software\\Test").unwrap();
        assert!(!key.exists);
        assert_eq!(key.values.len(), 2);
        assert!(key
            .values
            .iter()
            .all(|v| v.verdict == ValueVerdict::Missing && v.actual.is_none()));
        assert_eq!(report.summary.missing_keys, 1);
        assert_eq!(report.summary.missing_values, 2);
    }

    #[test]
    fn test_delete_value_classifications() {
        let doc = ParsedDocument::delete_value("HKEY_CURRENT_USER\\Software\\Test", "Gone");

        // Value still present live: should_not_exist
        let mut registry = MemoryRegistry::new();
        registry.set_value(
            "HKEY_CURRENT_USER\\Software\\Test",
            Some("Gone"),
            RegistryValue::Dword(9),
        );
        let report = RegistryStatusChecker::new().check(&doc, &registry);
        let key = report.key("HKEY_CURRENT_USER\\Software\\Test").unwrap();
        assert_eq!(
            key.value("Gone").unwrap().verdict,
            ValueVerdict::ShouldNotExist
        );

        // Value absent live: correctly_deleted
        let mut registry = MemoryRegistry::new();
        registry.add_key("HKEY_CURRENT_USER\\Software\\Test");
        let report = RegistryStatusChecker::new().check(&doc, &registry);
        let key = report.key("HKEY_CURRENT_USER\\Software\\Test").unwrap();
        assert_eq!(
            key.value("Gone").unwrap().verdict,
            ValueVerdict::CorrectlyDeleted
        );
    }

    #[test]
    fn test_deletion_marker_entries() {
        let doc = ParsedDocument::delete_key("HKEY_CURRENT_USER\\Software\\Obsolete");

        let mut registry = MemoryRegistry::new();
        registry.add_key("HKEY_CURRENT_USER\\Software\\Obsolete");
        let report = RegistryStatusChecker::new().check(&doc, &registry);
        let key = report.key("HKEY_CURRENT_USER\\Software\\Obsolete").unwrap();
        assert!(key.expected_deleted);
        assert!(key.values.is_empty());
        assert_eq!(key.deletion, Some(ValueVerdict::ShouldNotExist));

        let report = RegistryStatusChecker::new().check(&doc, &MemoryRegistry::new());
        let key = report.key("HKEY_CURRENT_USER\\Software\\Obsolete").unwrap();
        assert_eq!(key.deletion, Some(ValueVerdict::CorrectlyDeleted));
        // Deletion entries contribute nothing to value counters
        assert_eq!(report.summary.total_values, 0);
        assert_eq!(report.overall, OverallStatus::Unknown);
    }

    #[test]
    fn test_default_value_is_checked_under_at_name() {
        let mut doc = ParsedDocument::new();
        doc.open_key("HKEY_CURRENT_USER\\Software\\Test")
            .default_value = Some(RegistryValue::Sz("d".into()));

        let mut registry = MemoryRegistry::new();
        registry.set_value(
            "HKEY_CURRENT_USER\\Software\\Test",
            None,
            RegistryValue::Sz("d".into()),
        );

        let report = RegistryStatusChecker::new().check(&doc, &registry);
        let key = report.key("HKEY_CURRENT_USER\\Software\\Test").unwrap();
        assert_eq!(
            key.value(DEFAULT_VALUE_NAME).unwrap().verdict,
            ValueVerdict::Match
        );
    }

    struct FailingRegistry;

    impl ReadCapability for FailingRegistry {
        fn key_exists(&self, _path: &str) -> Result<bool> {
            Ok(true)
        }
        fn read_value(&self, path: &str, _name: Option<&str>) -> Result<Option<RegistryValue>> {
            Err(RegError::live(path, "access denied"))
        }
    }

    #[test]
    fn test_access_error_is_recorded_not_fatal() {
        let report = RegistryStatusChecker::new().check(&doc_one_dword(), &FailingRegistry);
        let key = report.key("HKEY_CURRENT_USER\\Software\\Test").unwrap();
        assert!(key.exists);
        let value = key.value("Flag").unwrap();
        assert_eq!(value.verdict, ValueVerdict::Missing);
        assert!(value.error.as_deref().unwrap().contains("access denied"));
        // The check itself completed and produced a summary
        assert_eq!(report.summary.total_values, 1);
    }

    #[test]
    fn test_summary_text() {
        let mut registry = MemoryRegistry::new();
        registry.set_value(
            "HKEY_CURRENT_USER\\Software\\Test",
            Some("Flag"),
            RegistryValue::Dword(1),
        );
        let report = RegistryStatusChecker::new().check(&doc_one_dword(), &registry);
        let text = report.summary_text();
        assert!(text.contains("Keys: 1/1 active"));
        assert!(text.contains("Values: 1/1 matching"));
        assert!(text.contains("all_active"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_export_uses_snake_case_verdicts() {
        let report = RegistryStatusChecker::new().check(&doc_one_dword(), &MemoryRegistry::new());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"missing\""));
        assert!(json.contains("\"all_inactive\""));
    }
}
