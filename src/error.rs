//! Error types for trueno-tag
//!
//! Every failure surfaces synchronously to the caller. A flush aborts on the
//! first error and leaves already-written objects in place.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-tag error types
#[derive(Error, Debug)]
pub enum Error {
    /// Custom slot saved without a kind
    #[error("Invalid tag: slot '{slot}' is not a known slot and no kind was provided\nPass an ArtifactKind to save() for custom slots")]
    InvalidTag {
        /// Offending slot name
        slot: String,
    },

    /// Artifact variant does not fit the slot's kind
    #[error("Kind mismatch for slot '{slot}': expected {kind} artifact, found {found}")]
    KindMismatch {
        /// Slot name
        slot: String,
        /// Declared or configured kind
        kind: String,
        /// Variant actually stored
        found: String,
    },

    /// Kind string could not be parsed
    #[error("Unknown artifact kind: {0}")]
    UnknownKind(String),

    /// Schema or flush configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model or table encoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Object store rejected a write
    #[error("Object store write failed for '{key}': {reason}")]
    Store {
        /// Object key (`experiment/tag/file`)
        key: String,
        /// Backend-specific reason
        reason: String,
    },

    /// JSON encoding or decoding failed (summary document, schema files)
    #[error("JSON encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
