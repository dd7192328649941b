//! Error types for perception log inspection.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for log inspection and playback.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid magic bytes at start of file
    #[error("Invalid log archive: expected Ogawa magic bytes")]
    InvalidMagic,

    /// File is truncated or corrupted
    #[error("Unexpected end of file at position {0}")]
    UnexpectedEof(u64),

    /// Invalid data structure in file
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// No node exists at the given path
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Node kind or element type differs from what the operation needs
    #[error("Type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Frames cannot be stacked because their widths differ
    #[error("Shape mismatch at {path}: expected {expected} columns, got {actual}")]
    ShapeMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },

    /// Child of a frame namespace is not a non-negative integer
    #[error("Invalid frame key '{key}' under {namespace}")]
    InvalidFrameKey { namespace: String, key: String },

    /// Namespace has no frames to stack
    #[error("Namespace has no frames: {0}")]
    EmptyNamespace(String),

    /// Child index out of bounds
    #[error("Child index {index} out of bounds (count: {count})")]
    ChildOutOfBounds { index: usize, count: usize },

    /// Frame payload could not be decoded as an image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Display sink failure
    #[error("Display error: {0}")]
    Display(String),

    /// Configuration could not be resolved
    #[error("Configuration error: {0}")]
    Config(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HDF5 library error
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a node kind mismatch error.
    pub fn kind_mismatch(path: impl Into<String>, expected: &str, actual: &str) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Result type alias for log operations.
pub type Result<T> = std::result::Result<T, Error>;
