//! Error types for `.reg` file handling and live-registry access.
//!
//! Only genuinely exceptional conditions surface as a [`RegError`].
//! Malformed lines inside a `.reg` file are *not* errors at this level:
//! the parser collects them as [`crate::document::ParseIssue`] records on
//! the document and keeps going.

use std::io;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegError>;

/// Errors that can occur while reading `.reg` files or querying the
/// live registry collaborator.
#[derive(Error, Debug)]
pub enum RegError {
    /// I/O error while reading or writing a `.reg` file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A key path does not start with a recognized root hive name.
    #[error("Unknown root key in path: {path}")]
    UnknownRootKey {
        /// The full key path that failed to resolve.
        path: String,
    },

    /// The live registry reported a failure other than "not found".
    ///
    /// Not-found conditions are routine classification inputs and never
    /// reach this variant.
    #[error("Registry access failed for {key}: {reason}")]
    Live {
        /// Key path that was being accessed.
        key: String,
        /// Backend-provided description of the failure.
        reason: String,
    },

    /// Invalid `.reg` document structure that cannot be represented.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl RegError {
    /// Creates an unknown-root-key error for the given path.
    pub fn unknown_root(path: &str) -> Self {
        Self::UnknownRootKey {
            path: path.to_string(),
        }
    }

    /// Creates a live-access error with context.
    ///
    /// # Arguments
    ///
    /// * `key` - Key path that was being accessed
    /// * `reason` - Backend-provided description
    pub fn live(key: &str, reason: impl Into<String>) -> Self {
        Self::Live {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
