//! Flattening of decoded files into Polars DataFrames.
//!
//! The decoders keep the nested file structure; downstream ETL wants columnar
//! tables. `waveform_frame` emits one row per waveform with its line context,
//! `probe_frame` one row per probe configuration block. GPS columns are
//! nullable so short-format (pre-1.7) files produce the same schema.

use polars::prelude::*;

use crate::error::Result;
use crate::square::SquareDataFile;
use crate::winsss::WinsssFile;

/// One row per waveform across all scan lines of a WinSSS-SW file.
pub fn waveform_frame(file: &WinsssFile) -> Result<DataFrame> {
    let total: usize = file.lines.iter().map(|l| l.waveforms.len()).sum();

    let mut line: Vec<i64> = Vec::with_capacity(total);
    let mut line_name: Vec<String> = Vec::with_capacity(total);
    let mut wheel: Vec<String> = Vec::with_capacity(total);
    let mut line_distance: Vec<f64> = Vec::with_capacity(total);
    let mut distance: Vec<f64> = Vec::with_capacity(total);
    let mut thickness: Vec<f64> = Vec::with_capacity(total);
    let mut max_amp_f: Vec<f64> = Vec::with_capacity(total);
    let mut t1: Vec<i32> = Vec::with_capacity(total);
    let mut t2: Vec<i32> = Vec::with_capacity(total);
    let mut t3: Vec<i32> = Vec::with_capacity(total);
    let mut omitted: Vec<bool> = Vec::with_capacity(total);
    let mut dominant: Vec<bool> = Vec::with_capacity(total);
    let mut delamination: Vec<bool> = Vec::with_capacity(total);
    let mut sample_count: Vec<u32> = Vec::with_capacity(total);
    let mut gps_time: Vec<Option<i64>> = Vec::with_capacity(total);
    let mut gps_lat: Vec<Option<f64>> = Vec::with_capacity(total);
    let mut gps_lon: Vec<Option<f64>> = Vec::with_capacity(total);
    let mut gps_quality: Vec<Option<i32>> = Vec::with_capacity(total);

    for (index, scan_line) in file.lines.iter().enumerate() {
        let name = scan_line.name()?.to_string();
        let tag = scan_line.wheel()?.to_string();
        let x = scan_line.distance()?;

        for w in &scan_line.waveforms {
            line.push(index as i64);
            line_name.push(name.clone());
            wheel.push(tag.clone());
            line_distance.push(x);
            distance.push(w.distance);
            thickness.push(w.thickness);
            max_amp_f.push(w.max_amp_f);
            t1.push(w.t1);
            t2.push(w.t2);
            t3.push(w.t3);
            omitted.push(w.omitted);
            dominant.push(w.dominant);
            delamination.push(w.delamination);
            sample_count.push(w.wave.len() as u32);
            match &w.gps {
                Some(gps) => {
                    gps_time.push(Some(gps.timestamp));
                    gps_lat.push(Some(gps.lat));
                    gps_lon.push(Some(gps.lon));
                    gps_quality.push(Some(gps.quality));
                }
                None => {
                    gps_time.push(None);
                    gps_lat.push(None);
                    gps_lon.push(None);
                    gps_quality.push(None);
                }
            }
        }
    }

    let columns: Vec<Column> = vec![
        Series::new("line".into(), line).into(),
        Series::new("line_name".into(), line_name).into(),
        Series::new("wheel".into(), wheel).into(),
        Series::new("line_distance".into(), line_distance).into(),
        Series::new("distance".into(), distance).into(),
        Series::new("thickness".into(), thickness).into(),
        Series::new("max_amp_f".into(), max_amp_f).into(),
        Series::new("t1".into(), t1).into(),
        Series::new("t2".into(), t2).into(),
        Series::new("t3".into(), t3).into(),
        Series::new("omitted".into(), omitted).into(),
        Series::new("dominant".into(), dominant).into(),
        Series::new("delamination".into(), delamination).into(),
        Series::new("sample_count".into(), sample_count).into(),
        Series::new("gps_time".into(), gps_time).into(),
        Series::new("gps_lat".into(), gps_lat).into(),
        Series::new("gps_lon".into(), gps_lon).into(),
        Series::new("gps_quality".into(), gps_quality).into(),
    ];

    Ok(DataFrame::new(columns)?)
}

/// One row per probe configuration block of a Square Data file.
pub fn probe_frame(file: &SquareDataFile) -> Result<DataFrame> {
    let count = file.probes.len();

    let mut probe: Vec<i64> = Vec::with_capacity(count);
    let mut selected: Vec<bool> = Vec::with_capacity(count);
    let mut element_count: Vec<i32> = Vec::with_capacity(count);
    let mut pitch: Vec<f64> = Vec::with_capacity(count);
    let mut frequency: Vec<f64> = Vec::with_capacity(count);
    let mut radius: Vec<f64> = Vec::with_capacity(count);
    let mut wedge_velocity: Vec<f64> = Vec::with_capacity(count);
    let mut wedge_angle: Vec<f64> = Vec::with_capacity(count);
    let mut specimen_velocity: Vec<f64> = Vec::with_capacity(count);
    let mut angle_start: Vec<f64> = Vec::with_capacity(count);
    let mut angle_stop: Vec<f64> = Vec::with_capacity(count);
    let mut angle_step: Vec<f64> = Vec::with_capacity(count);
    let mut gate_start: Vec<f64> = Vec::with_capacity(count);
    let mut gate_range: Vec<f64> = Vec::with_capacity(count);

    for (index, p) in file.probes.iter().enumerate() {
        probe.push(index as i64);
        selected.push(p.fields.get_bool("selected")?);
        element_count.push(p.fields.get_i32("element_count")?);
        pitch.push(p.fields.get_f64("pitch")?);
        frequency.push(p.fields.get_f64("frequency")?);
        radius.push(p.fields.get_f64("radius")?);
        wedge_velocity.push(p.fields.get_f64("wedge_velocity")?);
        wedge_angle.push(p.fields.get_f64("wedge_angle")?);
        specimen_velocity.push(p.fields.get_f64("specimen_velocity")?);
        angle_start.push(p.fields.get_f64("angle_start")?);
        angle_stop.push(p.fields.get_f64("angle_stop")?);
        angle_step.push(p.fields.get_f64("angle_step")?);
        gate_start.push(p.fields.get_f64("gate_start")?);
        gate_range.push(p.fields.get_f64("gate_range")?);
    }

    let columns: Vec<Column> = vec![
        Series::new("probe".into(), probe).into(),
        Series::new("selected".into(), selected).into(),
        Series::new("element_count".into(), element_count).into(),
        Series::new("pitch".into(), pitch).into(),
        Series::new("frequency".into(), frequency).into(),
        Series::new("radius".into(), radius).into(),
        Series::new("wedge_velocity".into(), wedge_velocity).into(),
        Series::new("wedge_angle".into(), wedge_angle).into(),
        Series::new("specimen_velocity".into(), specimen_velocity).into(),
        Series::new("angle_start".into(), angle_start).into(),
        Series::new("angle_stop".into(), angle_stop).into(),
        Series::new("angle_step".into(), angle_step).into(),
        Series::new("gate_start".into(), gate_start).into(),
        Series::new("gate_range".into(), gate_range).into(),
    ];

    Ok(DataFrame::new(columns)?)
}
