//! WinSSS-SW file reader.
//!
//! The format is a single forward stream: an 8-byte file version, a file
//! header group, then `numLines` scan lines, each a line header group followed
//! by its waveform records. Whatever follows the last waveform is a color
//! palette block and is retained verbatim rather than parsed.
//!
//! Files below version 1.4 are rejected. From version 1.7 on, every waveform
//! carries a GPS block; the variant is selected once per file, not per line.

use std::fs::File;
use std::path::Path;

use crate::codec::{decode_group, ByteCursor, Codec, FieldSpec, GroupValue};
use crate::error::{Result, SquareFormatError};
use crate::reshape::{pair_scan_lines, LocationGrid, SignalCube};

/// Oldest file version this reader accepts.
pub const MIN_SUPPORTED_VERSION: f64 = 1.4;

/// First version whose waveforms carry the GPS block.
pub const GPS_VERSION: f64 = 1.7;

/// Wire layout of the file header. Field names follow the instrument
/// software; the `*TextBox` entries are operator-entered strings even where
/// they hold numbers.
const FILE_HEADER: &FieldSpec = &[
    ("fileId", Codec::PString),
    ("numLines", Codec::Int32),
    ("encoderSize", Codec::Int32),
    ("numChannels", Codec::Int32),
    ("samplesPerWave", Codec::Int32),
    ("scanIncrement", Codec::Double),
    ("startPosition", Codec::Double),
    ("endPosition", Codec::Double),
    ("probeType", Codec::Int32),
    ("probeSerial", Codec::PString),
    ("probeFrequency", Codec::Double),
    ("wheelSpacing", Codec::Double),
    ("wheelDiameter", Codec::Double),
    ("pulseVoltage", Codec::Int32),
    ("pulseWidth", Codec::Double),
    ("pulseRepRate", Codec::Double),
    ("timePerPointTextBox", Codec::PString),
    ("velToolStripTextBox", Codec::PString),
    ("gainTextBox", Codec::PString),
    ("calibrationFactor", Codec::Double),
    ("calibrationDate", Codec::PString),
    ("zeroOffset", Codec::Double),
    ("dacEnabled", Codec::Boolean),
    ("dacSlope", Codec::Double),
    ("operatorTextBox", Codec::PString),
    ("siteTextBox", Codec::PString),
    ("jobIdTextBox", Codec::PString),
    ("commentsTextBox", Codec::PString),
    ("softwareBuild", Codec::Int32),
    ("reserved1", Codec::Reserved(192)),
];

/// Wire layout of a scan-line header.
const LINE_HEADER: &FieldSpec = &[
    ("name", Codec::PString),
    ("wheel", Codec::PString),
    ("distance", Codec::Double),
    ("gain", Codec::Int32),
    ("startScan", Codec::Double),
    ("direction", Codec::Boolean),
    ("minThreshold", Codec::Double),
    ("minAmpF", Codec::Double),
    ("thicknessMin", Codec::Double),
    ("thicknessMax", Codec::Double),
    ("ch", Codec::Int32),
    ("nominalThickness", Codec::Double),
    ("filterPass", Codec::PString),
    ("f1", Codec::Int32),
    ("f2", Codec::Int32),
    ("numWaveforms", Codec::Int32),
];

/// Decoded file header with typed access to the fields the readers and the
/// downstream analysis care about. The full field map stays reachable.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub fields: GroupValue,
}

impl FileHeader {
    pub fn num_lines(&self) -> Result<usize> {
        self.fields.get_count("numLines")
    }

    /// Sampling period in microseconds, as entered in the instrument UI.
    pub fn time_per_point_us(&self) -> Result<f64> {
        self.text_f64("timePerPointTextBox")
    }

    /// P-wave velocity in ft/s, as entered in the instrument UI.
    pub fn velocity_p(&self) -> Result<f64> {
        self.text_f64("velToolStripTextBox")
    }

    fn text_f64(&self, name: &str) -> Result<f64> {
        let text = self.fields.get_str(name)?;
        text.trim().parse::<f64>().map_err(|_| {
            SquareFormatError::Parse(format!("field '{}' is not numeric: '{}'", name, text))
        })
    }
}

/// Waveform layout variant, selected once per file from the version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformKind {
    /// Pre-1.7 layout without GPS fields.
    Short,
    /// 1.7+ layout with the GPS block between `distance` and `t1`.
    Full,
}

impl WaveformKind {
    pub fn for_version(version: f64) -> Self {
        if version >= GPS_VERSION {
            WaveformKind::Full
        } else {
            WaveformKind::Short
        }
    }
}

/// GPS block carried by full-format waveforms.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsFix {
    pub timestamp: i64,
    pub lat: f64,
    pub lon: f64,
    pub lat_corr: f64,
    pub lon_corr: f64,
    pub height: f64,
    pub quality: i32,
    /// Antenna offset from the sensor head, inches.
    pub offset_x_in: f64,
    pub offset_y_in: f64,
}

/// One excitation-pulse record: metadata, the sampled wave and the exclusion
/// mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub thickness: f64,
    pub f: i32,
    pub thickness_change_disabled: bool,
    pub omitted: bool,
    pub distance: f64,
    /// Present for files at version 1.7 and above.
    pub gps: Option<GpsFix>,
    pub t1: i32,
    pub t2: i32,
    pub t3: i32,
    pub max_amp_f: f64,
    pub dominant: bool,
    pub delamination: bool,
    pub wave: Wave,
    pub mask: Mask,
}

impl Waveform {
    fn decode(cur: &mut ByteCursor<'_>, kind: WaveformKind) -> Result<Self> {
        let thickness = cur.read_f64()?;
        let f = cur.read_i32()?;
        let thickness_change_disabled = cur.read_bool()?;
        let omitted = cur.read_bool()?;
        let distance = cur.read_f64()?;

        let gps = match kind {
            WaveformKind::Full => Some(GpsFix {
                timestamp: cur.read_i64()?,
                lat: cur.read_f64()?,
                lon: cur.read_f64()?,
                lat_corr: cur.read_f64()?,
                lon_corr: cur.read_f64()?,
                height: cur.read_f64()?,
                quality: cur.read_i32()?,
                offset_x_in: cur.read_f64()?,
                offset_y_in: cur.read_f64()?,
            }),
            WaveformKind::Short => None,
        };

        let t1 = cur.read_i32()?;
        let t2 = cur.read_i32()?;
        let t3 = cur.read_i32()?;
        let max_amp_f = cur.read_f64()?;
        let dominant = cur.read_bool()?;
        let delamination = cur.read_bool()?;

        let wave = Wave::decode(cur)?;
        let mask = Mask::decode(cur)?;

        Ok(Waveform {
            thickness,
            f,
            thickness_change_disabled,
            omitted,
            distance,
            gps,
            t1,
            t2,
            t3,
            max_amp_f,
            dominant,
            delamination,
            wave,
            mask,
        })
    }
}

/// The sampled amplitude signal of one waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct Wave {
    pub samples: Vec<i32>,
}

impl Wave {
    fn decode(cur: &mut ByteCursor<'_>) -> Result<Self> {
        let declared = cur.read_i32()?;
        // The instrument only ever writes these two lengths; anything else
        // means the stream is out of alignment.
        if declared != 1024 && declared != 2048 {
            return Err(SquareFormatError::Parse(format!(
                "wave declares {} samples, expected 1024 or 2048",
                declared
            )));
        }
        let samples = cur.read_i32_array(declared as usize)?;
        Ok(Wave { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A region of the phase diagram excluded from thickness evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskPoint {
    pub f1: f64,
    pub f2: f64,
    pub cycle: i32,
}

/// Exclusion mask attached to one waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub points: Vec<MaskPoint>,
}

impl Mask {
    fn decode(cur: &mut ByteCursor<'_>) -> Result<Self> {
        let declared = cur.read_i32()?;
        if declared < 0 {
            return Err(SquareFormatError::Parse(format!(
                "mask declares negative point count {}",
                declared
            )));
        }
        let mut points = Vec::with_capacity(declared as usize);
        for _ in 0..declared {
            points.push(MaskPoint {
                f1: cur.read_f64()?,
                f2: cur.read_f64()?,
                cycle: cur.read_i32()?,
            });
        }
        Ok(Mask { points })
    }
}

/// One recorded pass of a transducer wheel, with its waveforms.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanLine {
    pub header: GroupValue,
    pub waveforms: Vec<Waveform>,
}

impl ScanLine {
    pub fn name(&self) -> Result<&str> {
        self.header.get_str("name")
    }

    /// Wheel tag, "L" or "R".
    pub fn wheel(&self) -> Result<&str> {
        self.header.get_str("wheel")
    }

    pub fn distance(&self) -> Result<f64> {
        self.header.get_f64("distance")
    }
}

/// A fully decoded WinSSS-SW file.
#[derive(Debug, Clone, PartialEq)]
pub struct WinsssFile {
    pub version: f64,
    pub header: FileHeader,
    pub lines: Vec<ScanLine>,
    trailing: Vec<u8>,
    consumed: usize,
}

impl WinsssFile {
    /// Decodes an entire WinSSS-SW buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cur = ByteCursor::new(data);

        // File version "as written".
        let version = cur.read_f64()?;
        if version < MIN_SUPPORTED_VERSION {
            return Err(SquareFormatError::Compatibility { version });
        }
        let kind = WaveformKind::for_version(version);

        let header = FileHeader {
            fields: decode_group(FILE_HEADER, &mut cur)?,
        };
        let num_lines = header.num_lines()?;

        let mut lines = Vec::with_capacity(num_lines);
        for _ in 0..num_lines {
            let fields = decode_group(LINE_HEADER, &mut cur)?;
            let wave_count = fields.get_count("numWaveforms")?;

            let mut waveforms = Vec::with_capacity(wave_count);
            for _ in 0..wave_count {
                waveforms.push(Waveform::decode(&mut cur, kind)?);
            }

            lines.push(ScanLine {
                header: fields,
                waveforms,
            });
        }

        // The rest of the file is a color palette block. Keep it as-is.
        let consumed = cur.position();
        let trailing = cur.rest().to_vec();

        Ok(WinsssFile {
            version,
            header,
            lines,
            trailing,
            consumed,
        })
    }

    /// Decodes a WinSSS-SW file from disk using memory mapping.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    /// Bytes consumed by version + header + all lines and waveforms.
    pub fn consumed_len(&self) -> usize {
        self.consumed
    }

    /// The un-parsed palette block after the last waveform.
    pub fn trailing_bytes(&self) -> &[u8] {
        &self.trailing
    }

    /// Sample rate in Hz, derived from the microsecond period text field.
    pub fn sample_rate(&self) -> Result<f64> {
        let period_us = self.header.time_per_point_us()?;
        if period_us <= 0.0 {
            return Err(SquareFormatError::Parse(format!(
                "non-positive sampling period: {} us",
                period_us
            )));
        }
        Ok(1e6 / period_us)
    }

    /// P-wave velocity in ft/s.
    pub fn velocity_p(&self) -> Result<f64> {
        self.header.velocity_p()
    }

    /// Pairs the scan lines into per-scan signal cubes and location grids.
    pub fn signals(&self) -> Result<(Vec<SignalCube>, Vec<LocationGrid>)> {
        pair_scan_lines(&self.lines)
    }
}
