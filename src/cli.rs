//
// cli.rs
// dcm2jpeg
//
// Defines the CLI surface with Clap and dispatches to single-file or
// directory conversion depending on the input path.
//

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, ValueEnum};
use dicom_pixeldata::WindowLevel;
use tracing_subscriber::EnvFilter;

use crate::batch;
use crate::convert::{self, JpegExportOptions};
use crate::models::BatchReport;
use crate::normalize::WindowFallback;

/// Command-line arguments for dcm2jpeg
#[derive(Parser, Debug)]
#[command(name = "dcm2jpeg")]
#[command(about = "Convert DICOM files to JPEG.", long_about = None)]
#[command(version)]
pub struct Cli {
    /// DICOM file to convert, or a directory to scan for .dcm files
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output JPEG path (file mode) or output directory (directory mode)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// JPEG quality
    #[arg(long, default_value_t = 95, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Frame to convert for multi-frame files
    #[arg(long, default_value_t = 0)]
    pub frame: u32,

    /// Window center override (requires --window-width)
    #[arg(long)]
    pub window_center: Option<f64>,

    /// Window width override (requires --window-center)
    #[arg(long)]
    pub window_width: Option<f64>,

    /// Fail files without a window pair instead of normalizing their range
    #[arg(long)]
    pub require_window: bool,

    /// Report format for directory conversions
    #[arg(long, value_enum, default_value = "text")]
    pub report: ReportFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Report format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    /// Per-file progress lines and a final summary
    Text,
    /// JSON report on stdout
    Json,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let window = parse_window(cli.window_center, cli.window_width)?;
    let fallback = if cli.require_window {
        WindowFallback::Require
    } else {
        WindowFallback::Normalize
    };
    let options = JpegExportOptions {
        quality: cli.quality,
        frame: cli.frame,
        window,
        fallback,
    };

    if cli.input.is_dir() {
        run_batch(&cli.input, cli.output, &options, cli.report)
    } else {
        run_single(&cli.input, cli.output, &options)
    }
}

fn run_single(
    input: &Path,
    output: Option<PathBuf>,
    options: &JpegExportOptions,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| convert::default_output_path(input));
    convert::convert_file(input, &output, options)
        .with_context(|| format!("Failed to convert {}", input.display()))?;
    println!("{} -> {}", input.display(), output.display());
    Ok(())
}

fn run_batch(
    input_dir: &Path,
    output: Option<PathBuf>,
    options: &JpegExportOptions,
    format: ReportFormat,
) -> anyhow::Result<()> {
    let output_dir = output.unwrap_or_else(|| input_dir.join("jpeg"));
    let report = batch::convert_directory(input_dir, &output_dir, options)
        .with_context(|| format!("Failed to scan {}", input_dir.display()))?;

    match format {
        ReportFormat::Text => {
            if report.total() == 0 {
                println!("No .dcm files found.");
                return Ok(());
            }
            print_text_report(&report, input_dir);
        }
        // JSON consumers always get a report, even an empty one.
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.failed.is_empty() {
        bail!("{} file(s) failed", report.failed.len());
    }
    Ok(())
}

fn print_text_report(report: &BatchReport, root: &Path) {
    for record in &report.converted {
        let name = record.output.file_name().unwrap_or_default().to_string_lossy();
        println!(
            "  {} -> {}",
            batch::display_relative(&record.input, root),
            name
        );
    }
    for failure in &report.failed {
        eprintln!(
            "  FAILED {}: {}",
            batch::display_relative(&failure.input, root),
            failure.error
        );
    }
    println!(
        "\nDone. {} file(s) processed -> {}",
        report.total(),
        report.output_dir.display()
    );
}

fn parse_window(center: Option<f64>, width: Option<f64>) -> anyhow::Result<Option<WindowLevel>> {
    // Window requires both center and width to make sense; reject mismatched input early.
    match (center, width) {
        (Some(c), Some(w)) => {
            if w <= 0.0 {
                bail!("--window-width must be positive");
            }
            Ok(Some(WindowLevel {
                center: c,
                width: w,
            }))
        }
        (None, None) => Ok(None),
        _ => Err(anyhow!(
            "Provide both --window-center and --window-width, or neither"
        )),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Diagnostics go to stderr so stdout stays clean for reports.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_mentions_dicom_conversion() {
        let mut cmd = Cli::command();
        let help = cmd.render_long_help().to_string();
        assert!(help.contains("Convert DICOM"));
    }

    #[test]
    fn window_flags_must_come_as_a_pair() {
        assert!(parse_window(Some(40.0), None).is_err());
        assert!(parse_window(None, Some(400.0)).is_err());
        assert!(parse_window(None, None).unwrap().is_none());
        let window = parse_window(Some(40.0), Some(400.0)).unwrap().unwrap();
        assert_eq!(window.center, 40.0);
        assert_eq!(window.width, 400.0);
    }

    #[test]
    fn nonpositive_window_width_flag_is_rejected() {
        assert!(parse_window(Some(100.0), Some(0.0)).is_err());
        assert!(parse_window(Some(100.0), Some(-1.0)).is_err());
    }

    #[test]
    fn quality_outside_range_is_rejected() {
        assert!(Cli::try_parse_from(["dcm2jpeg", "in.dcm", "--quality", "0"]).is_err());
        assert!(Cli::try_parse_from(["dcm2jpeg", "in.dcm", "--quality", "101"]).is_err());
    }

    #[test]
    fn defaults_apply_without_flags() {
        let cli = Cli::try_parse_from(["dcm2jpeg", "in.dcm"]).unwrap();
        assert_eq!(cli.quality, 95);
        assert_eq!(cli.frame, 0);
        assert!(!cli.require_window);
        assert!(matches!(cli.report, ReportFormat::Text));
        assert!(cli.output.is_none());
    }
}
