//! Readers for the Square ultrasonic inspection data containers.
//!
//! This library decodes the two proprietary binary formats written by the
//! inspection instruments — the WinSSS-SW scan-line format and the Square
//! Data PAUT format — from in-memory byte buffers into structured, immutable
//! records, and flattens the decoded metadata into Polars DataFrames for
//! downstream analysis.
//!
//! # Features
//!
//! - Declarative, schema-driven decoding (ordered field specifications
//!   evaluated against a forward-only cursor)
//! - WinSSS-SW: version gate, file/line headers, short and GPS waveform
//!   layouts, wave/mask records, palette block passthrough
//! - Scan-line pairing into `[pulse, 2, sample]` signal cubes with wheel
//!   normalization
//! - Square Data: probe configuration blocks with non-fatal integrity
//!   warnings, bulk typed arrays, gates
//! - Memory-mapped file entry points
//! - DataFrame export of per-waveform and per-probe metadata
//!
//! # Example
//!
//! ```no_run
//! use square_formats::WinsssFile;
//!
//! // Parse from file (uses memory mapping)
//! let file = WinsssFile::from_file("survey.ssw")?;
//! println!("version {}, {} scan lines", file.version, file.lines.len());
//!
//! // Pair the scan lines into per-scan signal cubes
//! let (cubes, locations) = file.signals()?;
//! assert_eq!(cubes.len(), locations.len());
//! # Ok::<(), square_formats::SquareFormatError>(())
//! ```
//!
//! # Errors
//!
//! Decoding is deterministic and aborts on the first fatal condition: a file
//! version below 1.4 (`Compatibility`), a read past the end of the buffer
//! (`Truncated`), or malformed data such as an out-of-range wave length
//! (`Parse`). Probe blocks of unexpected size are the one deliberate
//! exception: they are recorded as [`IntegrityWarning`]s on the returned
//! [`SquareDataFile`] and decoding continues.

pub mod codec;
pub mod convert;
pub mod error;
pub mod reshape;
pub mod square;
pub mod winsss;

pub use error::{IntegrityWarning, Result, SquareFormatError};
pub use reshape::{LocationGrid, SignalCube, Wheel};
pub use square::SquareDataFile;
pub use winsss::WinsssFile;

/// Parses an entire WinSSS-SW buffer.
///
/// Equivalent to [`WinsssFile::from_bytes`]; provided as a free function for
/// ETL callers.
pub fn decode_winsss(data: &[u8]) -> Result<WinsssFile> {
    WinsssFile::from_bytes(data)
}

/// Parses an entire Square Data buffer.
///
/// Equivalent to [`SquareDataFile::from_bytes`].
pub fn decode_square_data(data: &[u8]) -> Result<SquareDataFile> {
    SquareDataFile::from_bytes(data)
}
