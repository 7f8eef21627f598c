//! Error types for the Square format readers.

use thiserror::Error;

/// Result type alias for format decoding operations.
pub type Result<T> = std::result::Result<T, SquareFormatError>;

/// Errors that can occur when decoding WinSSS-SW or Square Data files.
#[derive(Error, Debug)]
pub enum SquareFormatError {
    /// File version below the supported floor (WinSSS-SW requires >= 1.4)
    #[error("Incompatible file: expected version >= 1.4, found {version}")]
    Compatibility { version: f64 },

    /// A read required more bytes than remain in the buffer
    #[error("Truncated buffer: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// Scan-line pairing failed (mismatched pulse or sample counts)
    #[error("Pairing error: {0}")]
    Pairing(String),

    /// Malformed data (e.g. wave sample count outside 1024/2048)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Field lookup or type mismatch against a decoded group
    #[error("Schema error: {0}")]
    Schema(String),

    /// I/O error occurred while reading a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error during DataFrame construction
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

/// A non-fatal data-integrity finding recorded during a decode.
///
/// Probe configuration blocks are expected to occupy exactly 482 bytes; a
/// deviating block is reported through one of these and decoding continues
/// with the declared field layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityWarning {
    /// Zero-based index of the probe block that deviated.
    pub probe_index: usize,
    /// Bytes the block actually decoded to.
    pub actual_len: usize,
    /// Bytes the block was expected to decode to.
    pub expected_len: usize,
}

impl std::fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "probe block {} decoded to {} bytes, expected {}",
            self.probe_index, self.actual_len, self.expected_len
        )
    }
}
