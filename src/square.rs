//! Square Data file reader.
//!
//! A Square Data container is one header group, a run of fixed-size probe
//! configuration blocks, and a handful of large typed arrays whose element
//! counts come multiplicatively from header fields, closed out by a gates
//! group. Unlike the wave-length check in the WinSSS reader, a probe block
//! of unexpected size is a recorded warning, not an abort; the instrument
//! vendor ships files with drifting probe tables and the trailing arrays
//! remain decodable from the declared field layout.

use std::fs::File;
use std::path::Path;

use crate::codec::{decode_group, ByteCursor, Codec, FieldSpec, GroupValue};
use crate::error::{IntegrityWarning, Result, SquareFormatError};

/// Expected size of one probe configuration block.
pub const PROBE_BLOCK_LEN: usize = 482;

const FILE_HEADER: &FieldSpec = &[
    ("encoder_size", Codec::Uint32),
    ("num_cycles", Codec::Uint32),
    ("num_points", Codec::Uint32),
    ("bit_size", Codec::Int32),
    ("scan_length", Codec::Double),
    ("scan_step", Codec::Double),
    ("sampling_period", Codec::Double),
    ("vel_1", Codec::Double),
    ("vel_2", Codec::Double),
    ("vel_3", Codec::Double),
    ("thickness", Codec::Double),
    ("ascan_type", Codec::Int32),
    ("vel_couplant", Codec::Double),
    ("ascan_type2", Codec::Int32),
    ("sw_version", Codec::Int32),
    ("probe_mode", Codec::Int32),
    ("num_selected_probes", Codec::Int32),
    ("ascan_start", Codec::Double),
    ("ascan_range", Codec::Double),
    ("compression_type", Codec::Int32),
    ("point_factor", Codec::Double),
    ("posix_time_start", Codec::PString),
    ("posix_time_end", Codec::PString),
    ("nav_trackline_id", Codec::PString),
    ("nav_num_pulses", Codec::PString),
    ("reserved1", Codec::Reserved(192)),
    ("master_setup_filename", Codec::PString),
    ("slave_setup_filename", Codec::PString),
    ("driver_version", Codec::PString),
    ("cycle_count_per_device", Codec::Int32),
    ("gain_analog", Codec::Double),
    ("time_slot", Codec::Double),
    ("filter_index", Codec::Int32),
    ("dac_enabled", Codec::Boolean),
];

/// Per-probe configuration block. 482 bytes when the table matches the file.
const PROBE_DATA: &FieldSpec = &[
    ("selected", Codec::Boolean),
    ("element_count", Codec::Int32),
    ("pitch", Codec::Double),
    ("frequency", Codec::Double),
    ("radius", Codec::Double),
    ("wedge_enable", Codec::Boolean),
    ("wedge_velocity", Codec::Double),
    ("wedge_height", Codec::Double),
    ("wedge_angle", Codec::Double),
    ("specimen_velocity", Codec::Double),
    ("specimen_wave", Codec::Int32),
    ("specimen_radius", Codec::Double),
    ("elem_count", Codec::Int32),
    ("depth_emission", Codec::Double),
    ("depth_reception", Codec::Opaque(256)),
    ("num_ddf", Codec::Int32),
    ("angle_start", Codec::Double),
    ("angle_stop", Codec::Double),
    ("angle_step", Codec::Double),
    ("elem_start", Codec::Int32),
    ("elem_stop", Codec::Int32),
    ("elem_step", Codec::Int32),
    ("depth_mode", Codec::Int32),
    ("gate_start", Codec::Double),
    ("gate_range", Codec::Double),
    ("time_slot_index", Codec::Int32),
    ("pulser_width", Codec::Int32),
    ("trigger", Codec::Int32),
    ("io", Codec::Int32),
    ("encoder_mode", Codec::Int32),
    ("encoder_dir", Codec::Int32),
    ("enc1_type", Codec::Int32),
    ("enc1_a", Codec::Int32),
    ("enc1_b", Codec::Int32),
    ("enc2_type", Codec::Int32),
    ("enc2_a", Codec::Int32),
    ("enc2_b", Codec::Int32),
    ("enc1_res", Codec::Int64),
    ("enc1_div", Codec::Int64),
    ("enc2_res", Codec::Int64),
    ("enc2_div", Codec::Int64),
];

const GATES: &FieldSpec = &[
    ("gate1_start", Codec::Double),
    ("gate1_length", Codec::Double),
    ("gate1_thres", Codec::Double),
    ("gate2_start", Codec::Double),
    ("gate2_length", Codec::Double),
    ("gate2_thres", Codec::Double),
    ("gate3_start", Codec::Double),
    ("gate3_length", Codec::Double),
    ("gate3_thres", Codec::Double),
];

/// One configured ultrasonic transducer channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeData {
    pub fields: GroupValue,
}

/// A time window the instrument uses to qualify reflected signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateWindow {
    pub start: f64,
    pub length: f64,
    pub threshold: f64,
}

/// The three gate windows closing the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Gates {
    pub windows: [GateWindow; 3],
}

impl Gates {
    fn from_group(group: &GroupValue) -> Result<Self> {
        let window = |n: &str| -> Result<GateWindow> {
            Ok(GateWindow {
                start: group.get_f64(&format!("{}_start", n))?,
                length: group.get_f64(&format!("{}_length", n))?,
                threshold: group.get_f64(&format!("{}_thres", n))?,
            })
        };
        Ok(Gates {
            windows: [window("gate1")?, window("gate2")?, window("gate3")?],
        })
    }
}

/// Raw PAUT amplitude samples, shaped `[encoder, cycle, point]` over flat
/// storage.
#[derive(Debug, Clone, PartialEq)]
pub struct PautCube {
    encoder_size: usize,
    num_cycles: usize,
    num_points: usize,
    data: Vec<i8>,
}

impl PautCube {
    /// `(encoder_size, num_cycles, num_points)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.encoder_size, self.num_cycles, self.num_points)
    }

    /// One A-scan: the sample array of one cycle at one encoder position.
    ///
    /// Panics if either index is out of range.
    pub fn a_scan(&self, encoder: usize, cycle: usize) -> &[i8] {
        assert!(encoder < self.encoder_size, "encoder {} out of range", encoder);
        assert!(cycle < self.num_cycles, "cycle {} out of range", cycle);
        let start = (encoder * self.num_cycles + cycle) * self.num_points;
        &self.data[start..start + self.num_points]
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.data
    }
}

/// A fully decoded Square Data file.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareDataFile {
    pub header: GroupValue,
    pub probes: Vec<ProbeData>,
    pub angles: Vec<f64>,
    pub exits: Vec<f64>,
    pub waveforms: PautCube,
    pub probe_numbers: Vec<i32>,
    pub digital_inputs: Vec<i32>,
    pub timestamps: Vec<f64>,
    pub gates: Gates,
    /// Non-fatal findings recorded while decoding; empty for clean files.
    pub warnings: Vec<IntegrityWarning>,
}

impl SquareDataFile {
    /// Decodes an entire Square Data buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cur = ByteCursor::new(data);

        let header = decode_group(FILE_HEADER, &mut cur)?;
        let num_selected_probes = header.get_count("num_selected_probes")?;
        let num_cycles = header.get_count("num_cycles")?;
        let encoder_size = header.get_count("encoder_size")?;
        let num_points = header.get_count("num_points")?;

        let (probes, warnings) = decode_probe_blocks(&mut cur, num_selected_probes, PROBE_DATA)?;

        cur.skip(192)?;

        let angles = cur.read_f64_array(num_cycles)?;
        let exits = cur.read_f64_array(num_cycles)?;

        let frame_count = checked_mul(encoder_size, num_cycles)?;
        let sample_count = checked_mul(frame_count, num_points)?;
        let waveforms = PautCube {
            encoder_size,
            num_cycles,
            num_points,
            data: cur.read_i8_array(sample_count)?,
        };

        let probe_numbers = cur.read_i32_array(frame_count)?;
        let digital_inputs = cur.read_i32_array(frame_count)?;
        let timestamps = cur.read_f64_array(encoder_size)?;

        cur.skip(1)?;

        let gates = Gates::from_group(&decode_group(GATES, &mut cur)?)?;

        Ok(SquareDataFile {
            header,
            probes,
            angles,
            exits,
            waveforms,
            probe_numbers,
            digital_inputs,
            timestamps,
            gates,
            warnings,
        })
    }

    /// Decodes a Square Data file from disk using memory mapping.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }
}

/// Decodes `count` probe blocks, recording (not raising) a warning for every
/// block whose decoded size deviates from [`PROBE_BLOCK_LEN`].
fn decode_probe_blocks(
    cur: &mut ByteCursor<'_>,
    count: usize,
    spec: &'static FieldSpec,
) -> Result<(Vec<ProbeData>, Vec<IntegrityWarning>)> {
    let mut probes = Vec::with_capacity(count);
    let mut warnings = Vec::new();

    for probe_index in 0..count {
        let fields = decode_group(spec, cur)?;
        if fields.byte_len() != PROBE_BLOCK_LEN {
            let warning = IntegrityWarning {
                probe_index,
                actual_len: fields.byte_len(),
                expected_len: PROBE_BLOCK_LEN,
            };
            eprintln!("Warning: {}", warning);
            warnings.push(warning);
        }
        probes.push(ProbeData { fields });
    }

    Ok((probes, warnings))
}

fn checked_mul(a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b).ok_or_else(|| {
        SquareFormatError::Parse(format!("array size overflow: {} * {}", a, b))
    })
}
