use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use polars::prelude::*;
use square_formats::convert::{probe_frame, waveform_frame};
use square_formats::{SquareDataFile, Wheel, WinsssFile};
use std::path::PathBuf;
use std::time::Instant;

/// Decoder for WinSSS-SW and Square Data ultrasonic inspection files
#[derive(Parser)]
#[command(name = "square-formats")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show general information about an inspection file
    Info {
        /// Input file path
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// File format
        #[arg(short, long, value_enum)]
        format: FileKind,
    },

    /// Decode a WinSSS-SW file and summarize the paired signal cubes
    Signals {
        /// Input WinSSS-SW file path
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Export decoded metadata to CSV or Parquet
    Export {
        /// Input file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file path
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// File format
        #[arg(short, long, value_enum)]
        format: FileKind,

        /// Output format (auto-detected from extension if not specified)
        #[arg(short, long, value_enum)]
        output_format: Option<ExportFormat>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FileKind {
    /// WinSSS-SW scan-line file
    Winsss,
    /// Square Data PAUT file
    Square,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Parquet,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input, format } => info_command(input, format)?,
        Commands::Signals { input } => signals_command(input)?,
        Commands::Export {
            input,
            output,
            format,
            output_format,
        } => export_command(input, output, format, output_format)?,
    }

    Ok(())
}

fn info_command(input: PathBuf, format: FileKind) -> Result<()> {
    let metadata = std::fs::metadata(&input)?;
    println!("File Information:");
    println!("  Path:           {}", input.display());
    println!(
        "  Size:           {} bytes ({:.2} MB)",
        metadata.len(),
        metadata.len() as f64 / 1_048_576.0
    );

    match format {
        FileKind::Winsss => {
            let parse_start = Instant::now();
            let file = WinsssFile::from_file(&input)
                .with_context(|| format!("Failed to decode WinSSS-SW file: {}", input.display()))?;
            let parse_duration = parse_start.elapsed();

            let waveform_count: usize = file.lines.iter().map(|l| l.waveforms.len()).sum();
            println!("\nWinSSS-SW ({:.3}s):", parse_duration.as_secs_f64());
            println!("  Version:        {}", file.version);
            println!("  Scan lines:     {}", file.lines.len());
            println!("  Waveforms:      {}", waveform_count);
            if let Ok(rate) = file.sample_rate() {
                println!("  Sample rate:    {:.0} Hz", rate);
            }
            if let Ok(vel) = file.velocity_p() {
                println!("  P-wave vel:     {} ft/s", vel);
            }
            for name in ["operatorTextBox", "siteTextBox", "commentsTextBox"] {
                if let Ok(text) = file.header.fields.get_str(name) {
                    if !text.is_empty() {
                        println!("  {:14} {}", name.trim_end_matches("TextBox"), text);
                    }
                }
            }
            let trailing = file.trailing_bytes();
            let preview = &trailing[..trailing.len().min(16)];
            println!(
                "  Palette block:  {} bytes [{}]",
                trailing.len(),
                hex::encode(preview)
            );
        }
        FileKind::Square => {
            let parse_start = Instant::now();
            let file = SquareDataFile::from_file(&input).with_context(|| {
                format!("Failed to decode Square Data file: {}", input.display())
            })?;
            let parse_duration = parse_start.elapsed();

            let (encoder_size, num_cycles, num_points) = file.waveforms.shape();
            println!("\nSquare Data ({:.3}s):", parse_duration.as_secs_f64());
            println!("  Probes:         {}", file.probes.len());
            println!("  Encoder size:   {}", encoder_size);
            println!("  Cycles:         {}", num_cycles);
            println!("  Points/A-scan:  {}", num_points);
            println!("  Timestamps:     {}", file.timestamps.len());
            for (i, gate) in file.gates.windows.iter().enumerate() {
                println!(
                    "  Gate {}:         start {:.3}, length {:.3}, threshold {:.3}",
                    i + 1,
                    gate.start,
                    gate.length,
                    gate.threshold
                );
            }
            if !file.warnings.is_empty() {
                println!("  Warnings:       {}", file.warnings.len());
                for w in &file.warnings {
                    println!("    {}", w);
                }
            }
        }
    }

    Ok(())
}

fn signals_command(input: PathBuf) -> Result<()> {
    println!("Decoding {}...", input.display());
    let parse_start = Instant::now();
    let file = WinsssFile::from_file(&input)
        .with_context(|| format!("Failed to decode WinSSS-SW file: {}", input.display()))?;
    let (cubes, locations) = file
        .signals()
        .context("Failed to pair scan lines into signals")?;
    let parse_duration = parse_start.elapsed();

    println!(
        "Paired {} scans from {} lines ({:.3}s)\n",
        cubes.len(),
        file.lines.len(),
        parse_duration.as_secs_f64()
    );

    for (scan, (cube, location)) in cubes.iter().zip(locations.iter()).enumerate() {
        let (pulses, _, samples) = cube.shape();
        let left_at = if pulses > 0 {
            format!("{:.2}", location.line_distance(0, Wheel::Left))
        } else {
            "n/a".to_string()
        };
        println!(
            "  Scan {:4}: {} pulses x 2 wheels x {} samples, left wheel at {}",
            scan, pulses, samples, left_at
        );
    }

    Ok(())
}

fn export_command(
    input: PathBuf,
    output: PathBuf,
    format: FileKind,
    output_format: Option<ExportFormat>,
) -> Result<()> {
    let out_format = if let Some(f) = output_format {
        f
    } else {
        match output.extension().and_then(|s| s.to_str()) {
            Some("csv") => ExportFormat::Csv,
            Some("parquet") => ExportFormat::Parquet,
            _ => anyhow::bail!(
                "Cannot determine output format from extension. Use --output-format to specify."
            ),
        }
    };

    println!("Decoding {}...", input.display());
    let parse_start = Instant::now();
    let mut df = match format {
        FileKind::Winsss => {
            let file = WinsssFile::from_file(&input)
                .with_context(|| format!("Failed to decode WinSSS-SW file: {}", input.display()))?;
            waveform_frame(&file)?
        }
        FileKind::Square => {
            let file = SquareDataFile::from_file(&input).with_context(|| {
                format!("Failed to decode Square Data file: {}", input.display())
            })?;
            probe_frame(&file)?
        }
    };
    let parse_duration = parse_start.elapsed();

    println!(
        "Loaded {} rows and {} columns ({:.3}s)",
        df.height(),
        df.width(),
        parse_duration.as_secs_f64()
    );

    match out_format {
        ExportFormat::Csv => {
            let mut file = std::fs::File::create(&output)?;
            CsvWriter::new(&mut file).finish(&mut df)?;
            println!("Exported to CSV: {}", output.display());
        }
        ExportFormat::Parquet => {
            let file = std::fs::File::create(&output)?;
            let save_start = Instant::now();
            ParquetWriter::new(file).finish(&mut df)?;
            let save_duration = save_start.elapsed();
            println!(
                "Exported to Parquet: {} ({:.3}s)",
                output.display(),
                save_duration.as_secs_f64()
            );
        }
    }

    Ok(())
}
