//! Shared builders for synthetic WinSSS-SW and Square Data buffers.
//!
//! The library is strictly a reader, so the encoders needed to fabricate
//! test inputs live here. Field order and widths mirror the wire layouts the
//! decoders expect; changing one side without the other is how these tests
//! catch drift.

use byteorder::{LittleEndian, WriteBytesExt};

pub fn put_pstring(buf: &mut Vec<u8>, s: &str) {
    assert!(s.len() <= u8::MAX as usize, "fixture string too long");
    buf.push(s.len() as u8);
    buf.extend_from_slice(s.as_bytes());
}

fn put_f64(buf: &mut Vec<u8>, v: f64) {
    buf.write_f64::<LittleEndian>(v).unwrap();
}

fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.write_i32::<LittleEndian>(v).unwrap();
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.write_u32::<LittleEndian>(v).unwrap();
}

fn put_i64(buf: &mut Vec<u8>, v: i64) {
    buf.write_i64::<LittleEndian>(v).unwrap();
}

/// One waveform of a fixture scan line.
pub struct WaveFixture {
    pub distance: f64,
    pub samples: Vec<i32>,
}

/// One fixture scan line.
pub struct LineFixture {
    pub name: String,
    pub wheel: char,
    pub distance: f64,
    pub waves: Vec<WaveFixture>,
}

/// The 30-field WinSSS-SW file header with representative instrument values.
pub fn file_header_bytes(num_lines: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    put_pstring(&mut buf, "SSW-1"); // fileId
    put_i32(&mut buf, num_lines); // numLines
    put_i32(&mut buf, 1800); // encoderSize
    put_i32(&mut buf, 2); // numChannels
    put_i32(&mut buf, 1024); // samplesPerWave
    put_f64(&mut buf, 0.5); // scanIncrement
    put_f64(&mut buf, 0.0); // startPosition
    put_f64(&mut buf, 120.0); // endPosition
    put_i32(&mut buf, 3); // probeType
    put_pstring(&mut buf, "P-4412"); // probeSerial
    put_f64(&mut buf, 2.25); // probeFrequency
    put_f64(&mut buf, 6.0); // wheelSpacing
    put_f64(&mut buf, 8.5); // wheelDiameter
    put_i32(&mut buf, 200); // pulseVoltage
    put_f64(&mut buf, 0.4); // pulseWidth
    put_f64(&mut buf, 500.0); // pulseRepRate
    put_pstring(&mut buf, "0.5"); // timePerPointTextBox
    put_pstring(&mut buf, "11800"); // velToolStripTextBox
    put_pstring(&mut buf, "32"); // gainTextBox
    put_f64(&mut buf, 1.0); // calibrationFactor
    put_pstring(&mut buf, "2023-06-14"); // calibrationDate
    put_f64(&mut buf, 0.0); // zeroOffset
    buf.push(1); // dacEnabled
    put_f64(&mut buf, 0.0); // dacSlope
    put_pstring(&mut buf, "jdoe"); // operatorTextBox
    put_pstring(&mut buf, "tank 12"); // siteTextBox
    put_pstring(&mut buf, "J-1044"); // jobIdTextBox
    put_pstring(&mut buf, ""); // commentsTextBox
    put_i32(&mut buf, 4120); // softwareBuild
    buf.extend_from_slice(&[0u8; 192]); // reserved1
    buf
}

/// The 16-field scan-line header.
pub fn line_header_bytes(name: &str, wheel: char, distance: f64, num_waveforms: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    put_pstring(&mut buf, name);
    put_pstring(&mut buf, &wheel.to_string());
    put_f64(&mut buf, distance);
    put_i32(&mut buf, 32); // gain
    put_f64(&mut buf, 0.0); // startScan
    buf.push(1); // direction
    put_f64(&mut buf, 0.1); // minThreshold
    put_f64(&mut buf, 0.2); // minAmpF
    put_f64(&mut buf, 0.05); // thicknessMin
    put_f64(&mut buf, 1.5); // thicknessMax
    put_i32(&mut buf, 1); // ch
    put_f64(&mut buf, 0.375); // nominalThickness
    put_pstring(&mut buf, "BP"); // filterPass
    put_i32(&mut buf, 0); // f1
    put_i32(&mut buf, 0); // f2
    put_i32(&mut buf, num_waveforms);
    buf
}

/// One waveform record; `full` selects the GPS (1.7+) layout.
pub fn waveform_bytes(full: bool, distance: f64, samples: &[i32]) -> Vec<u8> {
    let mut buf = Vec::new();
    put_f64(&mut buf, 0.25); // thickness
    put_i32(&mut buf, 3); // f
    buf.push(0); // thicknessChangeDisabled
    buf.push(0); // omitted
    put_f64(&mut buf, distance);
    if full {
        put_i64(&mut buf, 1_600_000_000); // timestamp
        put_f64(&mut buf, 29.76); // lat
        put_f64(&mut buf, -95.36); // lon
        put_f64(&mut buf, 0.0); // latCorr
        put_f64(&mut buf, 0.0); // lonCorr
        put_f64(&mut buf, 14.2); // height
        put_i32(&mut buf, 4); // qual
        put_f64(&mut buf, 1.5); // offset x
        put_f64(&mut buf, -1.5); // offset y
    }
    put_i32(&mut buf, 10); // t1
    put_i32(&mut buf, 20); // t2
    put_i32(&mut buf, 30); // t3
    put_f64(&mut buf, 0.9); // maxAmpF
    buf.push(1); // dominantFlag
    buf.push(0); // delaminationFlag

    put_i32(&mut buf, samples.len() as i32);
    for s in samples {
        put_i32(&mut buf, *s);
    }

    put_i32(&mut buf, 0); // mask point count
    buf
}

/// A complete WinSSS-SW buffer: version, header, lines, trailing palette.
pub fn winsss_bytes(version: f64, lines: &[LineFixture], trailing: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    put_f64(&mut buf, version);
    buf.extend_from_slice(&file_header_bytes(lines.len() as i32));

    let full = version >= 1.7;
    for line in lines {
        buf.extend_from_slice(&line_header_bytes(
            &line.name,
            line.wheel,
            line.distance,
            line.waves.len() as i32,
        ));
        for wave in &line.waves {
            buf.extend_from_slice(&waveform_bytes(full, wave.distance, &wave.samples));
        }
    }

    buf.extend_from_slice(trailing);
    buf
}

/// Shape parameters for a synthetic Square Data file.
pub struct SquareFixture {
    pub num_probes: usize,
    pub num_cycles: usize,
    pub encoder_size: usize,
    pub num_points: usize,
}

/// The 34-field Square Data header.
pub fn square_header_bytes(fix: &SquareFixture) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u32(&mut buf, fix.encoder_size as u32);
    put_u32(&mut buf, fix.num_cycles as u32);
    put_u32(&mut buf, fix.num_points as u32);
    put_i32(&mut buf, 8); // bit_size
    put_f64(&mut buf, 36.0); // scan_length
    put_f64(&mut buf, 0.02); // scan_step
    put_f64(&mut buf, 0.01); // sampling_period
    put_f64(&mut buf, 5900.0); // vel_1
    put_f64(&mut buf, 3230.0); // vel_2
    put_f64(&mut buf, 0.0); // vel_3
    put_f64(&mut buf, 0.5); // thickness
    put_i32(&mut buf, 1); // ascan_type
    put_f64(&mut buf, 1480.0); // vel_couplant
    put_i32(&mut buf, 0); // ascan_type2
    put_i32(&mut buf, 312); // sw_version
    put_i32(&mut buf, 1); // probe_mode
    put_i32(&mut buf, fix.num_probes as i32); // num_selected_probes
    put_f64(&mut buf, 0.0); // ascan_start
    put_f64(&mut buf, 10.0); // ascan_range
    put_i32(&mut buf, 0); // compression_type
    put_f64(&mut buf, 1.0); // point_factor
    put_pstring(&mut buf, "1687622400"); // posix_time_start
    put_pstring(&mut buf, "1687626000"); // posix_time_end
    put_pstring(&mut buf, "TL-07"); // nav_trackline_id
    put_pstring(&mut buf, "512"); // nav_num_pulses
    buf.extend_from_slice(&[0u8; 192]); // reserved1
    put_pstring(&mut buf, "master.setup"); // master_setup_filename
    put_pstring(&mut buf, "slave.setup"); // slave_setup_filename
    put_pstring(&mut buf, "2.4.1"); // driver_version
    put_i32(&mut buf, 16); // cycle_count_per_device
    put_f64(&mut buf, 24.0); // gain_analog
    put_f64(&mut buf, 120.0); // time_slot
    put_i32(&mut buf, 2); // filter_index
    buf.push(0); // dac_enabled
    buf
}

/// One 482-byte probe configuration block with index-dependent values.
pub fn probe_block_bytes(index: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(1); // selected
    put_i32(&mut buf, 64); // element_count
    put_f64(&mut buf, 0.6); // pitch
    put_f64(&mut buf, 5.0 + index as f64); // frequency
    put_f64(&mut buf, 0.0); // radius
    buf.push(1); // wedge_enable
    put_f64(&mut buf, 2330.0); // wedge_velocity
    put_f64(&mut buf, 14.3); // wedge_height
    put_f64(&mut buf, 36.1); // wedge_angle
    put_f64(&mut buf, 3230.0); // specimen_velocity
    put_i32(&mut buf, 1); // specimen_wave
    put_f64(&mut buf, 0.0); // specimen_radius
    put_i32(&mut buf, 64); // elem_count
    put_f64(&mut buf, 25.0); // depth_emission
    buf.extend_from_slice(&[0u8; 256]); // depth_reception
    put_i32(&mut buf, 0); // num_ddf
    put_f64(&mut buf, 40.0); // angle_start
    put_f64(&mut buf, 70.0); // angle_stop
    put_f64(&mut buf, 1.0); // angle_step
    put_i32(&mut buf, 1); // elem_start
    put_i32(&mut buf, 64); // elem_stop
    put_i32(&mut buf, 1); // elem_step
    put_i32(&mut buf, 0); // depth_mode
    put_f64(&mut buf, 0.0); // gate_start
    put_f64(&mut buf, 10.0); // gate_range
    put_i32(&mut buf, index as i32); // time_slot_index
    put_i32(&mut buf, 100); // pulser_width
    put_i32(&mut buf, 0); // trigger
    put_i32(&mut buf, 0); // io
    put_i32(&mut buf, 1); // encoder_mode
    put_i32(&mut buf, 1); // encoder_dir
    put_i32(&mut buf, 2); // enc1_type
    put_i32(&mut buf, 0); // enc1_a
    put_i32(&mut buf, 1); // enc1_b
    put_i32(&mut buf, 2); // enc2_type
    put_i32(&mut buf, 2); // enc2_a
    put_i32(&mut buf, 3); // enc2_b
    put_i64(&mut buf, 5000); // enc1_res
    put_i64(&mut buf, 1); // enc1_div
    put_i64(&mut buf, 5000); // enc2_res
    put_i64(&mut buf, 1); // enc2_div
    buf
}

/// Deterministic sample for the raw PAUT cube.
pub fn paut_sample(encoder: usize, cycle: usize, point: usize) -> i8 {
    ((encoder * 31 + cycle * 7 + point) % 127) as i8 - 63
}

/// A complete Square Data buffer.
pub fn square_bytes(fix: &SquareFixture) -> Vec<u8> {
    let mut buf = square_header_bytes(fix);

    for i in 0..fix.num_probes {
        buf.extend_from_slice(&probe_block_bytes(i));
    }

    buf.extend_from_slice(&[0u8; 192]); // reserved2

    for c in 0..fix.num_cycles {
        put_f64(&mut buf, 40.0 + c as f64); // angles
    }
    for c in 0..fix.num_cycles {
        put_f64(&mut buf, c as f64 * 0.25); // exits
    }
    for e in 0..fix.encoder_size {
        for c in 0..fix.num_cycles {
            for p in 0..fix.num_points {
                buf.push(paut_sample(e, c, p) as u8);
            }
        }
    }
    for e in 0..fix.encoder_size {
        for c in 0..fix.num_cycles {
            put_i32(&mut buf, ((e + c) % fix.num_probes.max(1)) as i32); // probe_numbers
        }
    }
    for e in 0..fix.encoder_size {
        for c in 0..fix.num_cycles {
            put_i32(&mut buf, ((e + c) % 2) as i32); // digital_inputs
        }
    }
    for e in 0..fix.encoder_size {
        put_f64(&mut buf, e as f64 * 0.001); // timestamps
    }

    buf.push(0); // reserved3

    for (start, length, thres) in [(1.0, 2.0, 0.5), (3.0, 4.0, 0.6), (5.0, 6.0, 0.7)] {
        put_f64(&mut buf, start);
        put_f64(&mut buf, length);
        put_f64(&mut buf, thres);
    }

    buf
}
