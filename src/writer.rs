//! `.reg` file serializer, the inverse of the parser.
//!
//! Output uses exactly the textual encodings the parser recognizes, so
//! `parse(serialize(doc))` reproduces the document for every value kind.

use crate::codec::encode_value;
use crate::document::{ParsedDocument, RootKey};
use crate::encoding::UTF8_BOM;
use crate::error::Result;
use chrono::Local;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

/// The header line written when a document carries none of its own.
pub const DEFAULT_VERSION: &str = "Windows Registry Editor Version 5.00";

/// Serializer for Windows Registry Editor (`.reg`) files.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegFileWriter;

impl RegFileWriter {
    /// Creates a writer.
    pub fn new() -> Self {
        Self
    }

    /// Serializes a document to `.reg` text.
    ///
    /// An optional title and description become a `;`-prefixed comment
    /// block under the version header, together with a generation
    /// timestamp. Key sections are separated by blank lines; deletion
    /// markers (`[-PATH]`) follow the key sections.
    #[instrument(skip_all, fields(keys = doc.key_count()))]
    pub fn serialize(
        &self,
        doc: &ParsedDocument,
        title: Option<&str>,
        description: Option<&str>,
    ) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push(
            doc.version
                .clone()
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        );
        lines.push(String::new());

        if title.is_some() || description.is_some() {
            lines.push(String::from("; =========================================="));
            if let Some(title) = title {
                lines.push(format!("; {title}"));
            }
            if let Some(description) = description {
                lines.push(String::from("; "));
                for desc_line in description.lines() {
                    lines.push(format!("; {desc_line}"));
                }
            }
            lines.push(String::from("; "));
            lines.push(format!(
                "; Generated: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ));
            lines.push(String::from("; =========================================="));
            lines.push(String::new());
        }

        for key in doc.keys() {
            lines.push(format!("[{}]", key.path));
            if let Some(default) = &key.default_value {
                lines.push(format!("@={}", encode_value(default)));
            }
            for (name, value) in key.values() {
                lines.push(format!("\"{name}\"={}", encode_value(value)));
            }
            lines.push(String::new());
        }

        for path in doc.deleted_keys() {
            lines.push(format!("[-{path}]"));
            lines.push(String::new());
        }

        lines.join("\n")
    }

    /// Serializes a document and writes it to disk with a UTF-8 BOM,
    /// the encoding regedit accepts without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[instrument(skip(self, doc, title, description, path), fields(path = %path.as_ref().display()))]
    pub fn write_file<P: AsRef<Path>>(
        &self,
        path: P,
        doc: &ParsedDocument,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let content = format!("{UTF8_BOM}{}", self.serialize(doc, title, description));
        fs::write(&path, content)?;
        info!("reg file written");
        Ok(())
    }

    /// Returns true if the path starts with a recognized root hive.
    pub fn validate_key_path(&self, path: &str) -> bool {
        RootKey::split(path).is_some()
    }
}
