//! lcstack command line tool
//!
//! Reads a forced-photometry light curve, stacks it into day-windows and
//! writes the combined points as CSV or as a JSON report.
//!
//! # Usage
//!
//! ```bash
//! lcstack forcedphotometry_req00012345_lc.txt --width 3 --output stacked.csv
//! lcstack tde.dat --format tabular --policy fixed_grid --output-format json
//! ```
//!
//! Settings come from `--config`, else from `lcstack.toml` in the standard
//! locations, else from the built-in defaults; flags override all three.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use lcstack::config::{StackConfig, WindowScope, WindowingPolicy, ZeroPointPolicy};
use lcstack::output::{to_rows, write_csv, write_json, StackReport};
use lcstack::parsing::{parse_str, IndexRange, InputFormat};
use lcstack::stacking::StackPipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Stack forced-photometry light curves into day-windows")]
struct Args {
    /// Light-curve file (ZTF forced-photometry output or a jd/filter/flux/unc table)
    input: PathBuf,

    /// Input format (ztf, tabular); detected from the content when omitted
    #[arg(long)]
    format: Option<InputFormat>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window width in days
    #[arg(long)]
    width: Option<f64>,

    /// Windowing policy (run_based, fixed_grid)
    #[arg(long)]
    policy: Option<WindowingPolicy>,

    /// Largest gap in days allowed inside a run-based window
    #[arg(long)]
    max_gap: Option<f64>,

    /// Build windows per band or pooled across bands (per_band, pooled)
    #[arg(long)]
    scope: Option<WindowScope>,

    /// How the reference zero point is chosen (min, mean)
    #[arg(long)]
    zero_point_policy: Option<ZeroPointPolicy>,

    /// SNR above which a combined flux counts as a detection
    #[arg(long)]
    detection_snr: Option<f64>,

    /// Multiple of the flux uncertainty quoted as the upper limit
    #[arg(long)]
    upper_limit_multiplier: Option<f64>,

    /// Inflate uncertainties of bands whose mean chi-square is not ~1
    #[arg(long, default_value_t = false)]
    validate_uncertainties: bool,

    /// Residual baseline flux subtracted before stacking
    #[arg(long)]
    baseline: Option<f64>,

    /// Missing-value token in the input
    #[arg(long)]
    null_sentinel: Option<String>,

    /// Zero point assigned to rows of a tabular input
    #[arg(long)]
    tabular_zero_point: Option<f64>,

    /// First source row index to keep (inclusive)
    #[arg(long)]
    start_index: Option<usize>,

    /// Last source row index to keep (inclusive)
    #[arg(long)]
    end_index: Option<usize>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    output_format: OutputFormat,
}

impl Args {
    fn base_config(&self) -> anyhow::Result<StackConfig> {
        if let Some(path) = &self.config {
            return StackConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()));
        }
        match StackConfig::from_default_location() {
            Ok(config) => Ok(config),
            Err(e) => {
                debug!("Using built-in defaults: {}", e);
                Ok(StackConfig::default())
            }
        }
    }

    /// Resolve the configuration and apply command-line overrides.
    fn resolve_config(&self) -> anyhow::Result<StackConfig> {
        let mut config = self.base_config()?;

        if let Some(width) = self.width {
            config.window_width_days = qtty::Days::new(width);
        }
        if let Some(policy) = self.policy {
            config.windowing_policy = policy;
        }
        if let Some(gap) = self.max_gap {
            config.max_gap_days = Some(qtty::Days::new(gap));
        }
        if let Some(scope) = self.scope {
            config.window_scope = scope;
        }
        if let Some(policy) = self.zero_point_policy {
            config.reference_zero_point_policy = policy;
        }
        if let Some(snr) = self.detection_snr {
            config.detection_snr_threshold = snr;
        }
        if let Some(multiplier) = self.upper_limit_multiplier {
            config.upper_limit_snr_multiplier = multiplier;
        }
        if self.validate_uncertainties {
            config.apply_uncertainty_validation = true;
        }
        if let Some(baseline) = self.baseline {
            config.baseline = baseline;
        }
        if let Some(sentinel) = &self.null_sentinel {
            config.parser.null_sentinel = sentinel.clone();
        }
        if let Some(zp) = self.tabular_zero_point {
            config.parser.tabular_zero_point = zp;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    // stdout carries the table
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = args.resolve_config()?;
    let source = args.input.display().to_string();

    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", source))?;
    let parsed = parse_str(&content, args.format, &config.parser)
        .map_err(|e| e.with_source(source.clone()))?;
    info!(
        "Read {} measurements from {} ({})",
        parsed.measurements.len(),
        source,
        parsed.format
    );

    let range = IndexRange::new(args.start_index, args.end_index);
    let measurements = range.apply(parsed.measurements)?;

    let pipeline = StackPipeline::with_config(config.clone())?;
    let outcome = pipeline.process(&measurements)?;

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    match args.output_format {
        OutputFormat::Csv => write_csv(&to_rows(&outcome.points), writer)?,
        OutputFormat::Json => {
            let report = StackReport::new(config, &outcome)
                .with_source(source)
                .with_input_text(&content)
                .with_parse_report(parsed.report);
            write_json(&report, writer)?;
        }
    }

    if let Some(path) = &args.output {
        info!("Wrote {} points to {}", outcome.points.len(), path.display());
    }

    Ok(())
}
