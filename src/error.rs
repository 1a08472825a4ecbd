//! Error types for phraserule.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for phraserule operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The rule file does not exist and no fresh cache could stand in for it
    #[error("rule file not found: {}", .0.display())]
    RuleSourceMissing(PathBuf),

    /// Invalid cache file magic bytes
    #[error("invalid magic bytes: expected PHRULE header")]
    InvalidMagic,

    /// Unsupported cache format version
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u32),

    /// Cache flags this build does not understand
    #[error("unsupported format flags: {0:#x}")]
    UnsupportedFlags(u32),

    /// Checksum mismatch
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Invalid header size
    #[error("invalid header size: expected {expected}, got {actual}")]
    InvalidHeaderSize { expected: usize, actual: usize },

    /// Structurally broken cache payload
    #[error("corrupt cache: {0}")]
    Corrupt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for phraserule operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a rule file line was not turned into a rule.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No `=>` separator on the line
    #[error("missing `=>` separator")]
    MissingSeparator,

    /// Pattern side is empty after trimming
    #[error("empty pattern")]
    EmptyPattern,
}
