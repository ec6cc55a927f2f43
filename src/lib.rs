//! # Windows Registry Editor (`.reg`) file toolkit
//!
//! Parse `.reg` files into structured documents, serialize documents
//! back to `.reg` text, and diff declared state against a live registry.
//!
//! ## Components
//!
//! 1. **Parser** ([`RegFileParser`]): line-oriented, deliberately
//!    permissive. Malformed lines degrade to [`RegistryValue::Unknown`]
//!    with an issue recorded on the document; a bad line never rejects
//!    the file.
//! 2. **Writer** ([`RegFileWriter`]): the parser's inverse. Emits the
//!    canonical encodings for every value kind, so documents round-trip.
//! 3. **Status checker** ([`RegistryStatusChecker`]): compares a parsed
//!    document against a live registry reached through the
//!    [`ReadCapability`] seam and produces a [`StatusReport`] with
//!    per-value verdicts, rollup statistics, and an overall status.
//!
//! The live registry is only ever read. Applying or reverting changes
//! is a separate concern outside this crate.
//!
//! ## Recognized grammar
//!
//! ```text
//! Windows Registry Editor Version 5.00
//!
//! ; comment
//! [HKEY_CURRENT_USER\Software\Example]
//! @="default value"
//! "String"="text with \" escapes"
//! "Number"=dword:0000002a
//! "Big"=qword:000000012a05f200
//! "Blob"=hex:de,ad,be,ef,\
//!   00,11,22,33
//! "Multi"=hex(7):61,00,00,00,62,00,00,00,00,00
//! "Gone"=-
//!
//! [-HKEY_CURRENT_USER\Software\Obsolete]
//! ```
//!
//! ## Example
//!
//! ```
//! use reg_status::{
//!     MemoryRegistry, OverallStatus, RegFileParser, RegistryStatusChecker, RegistryValue,
//! };
//!
//! let doc = RegFileParser::new().parse(
//!     "[HKEY_CURRENT_USER\\Software\\Test]\n\"Flag\"=dword:00000001\n",
//! );
//!
//! let mut registry = MemoryRegistry::new();
//! registry.set_value(
//!     "HKEY_CURRENT_USER\\Software\\Test",
//!     Some("Flag"),
//!     RegistryValue::Dword(1),
//! );
//!
//! let report = RegistryStatusChecker::new().check(&doc, &registry);
//! assert_eq!(report.overall, OverallStatus::AllActive);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod document;
pub mod encoding;
pub mod error;
pub mod parser;
pub mod status;
pub mod value;
pub mod writer;

// Re-export main types for convenience
pub use document::{DocumentSummary, ParseIssue, ParsedDocument, RegistryKey, RootKey};
pub use error::{RegError, Result};
pub use parser::{RegFileParser, Validation, VERSION_PREFIX};
pub use status::{
    derive_overall_status, KeyStatus, MemoryRegistry, OverallStatus, ReadCapability,
    RegistryStatusChecker, StatusReport, Summary, ValueStatus, ValueVerdict,
    DEFAULT_VALUE_NAME,
};
pub use value::{RegistryValue, ValueKind};
pub use writer::{RegFileWriter, DEFAULT_VERSION};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
