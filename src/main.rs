use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod batch;
mod config;
mod dataset;
mod diagnostics;
mod error;
mod log;
mod metrics;
mod report;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "qoe-metrics")]
#[command(about = "Video QoE metrics from per-session player logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

/// Where the per-class logs live.
#[derive(Args, Debug, Clone)]
struct LayoutArgs {
    /// Number of class folders (0..N).
    #[arg(long, default_value_t = config::CLASS_COUNT)]
    classes: u32,

    /// Traces per class.
    #[arg(long, default_value_t = config::TRACES_PER_CLASS)]
    traces: u32,

    /// Samples per trace.
    #[arg(long, default_value_t = config::SAMPLES_PER_TRACE)]
    samples: u32,
}

impl LayoutArgs {
    fn dataset(&self, root: PathBuf) -> Result<dataset::Dataset> {
        dataset::Dataset::new(
            root,
            config::DatasetLayout {
                classes: self.classes,
                traces: self.traces,
                samples: self.samples,
            },
        )
    }
}

#[derive(Args, Debug, Clone)]
struct UtilityArgs {
    /// Segments per session; divisor of the mean utility.
    #[arg(long, default_value_t = config::TOTAL_SEGMENTS, allow_negative_numbers = true)]
    total_segments: i64,
}

#[derive(Args, Debug, Clone)]
struct SwitchingArgs {
    /// Divisor of the switching rate (segments - 1).
    #[arg(long, default_value_t = config::SWITCH_DIVISOR)]
    switch_divisor: u32,

    /// Trailing window for quality changes, in milliseconds.
    #[arg(long, default_value_t = config::WINDOW_MS)]
    window_ms: f64,
}

/// Metric parameters from whichever option groups a command takes.
fn params(
    utility: Option<&UtilityArgs>,
    switching: Option<&SwitchingArgs>,
) -> Result<config::MetricParams> {
    let mut params = config::MetricParams::default();
    if let Some(u) = utility {
        params.total_segments = u.total_segments;
    }
    if let Some(s) = switching {
        params.switch_divisor = s.switch_divisor;
        params.window_ms = s.window_ms;
    }
    params.validate()?;
    Ok(params)
}

#[derive(Subcommand)]
enum Commands {
    /// Mean utility of every `*_btr.qoe.log` bitrate log.
    Utility {
        /// Dataset path.
        input_dir: PathBuf,
        /// Output CSV file path.
        output_csv: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
        #[command(flatten)]
        utility: UtilityArgs,
    },

    /// Total stall time and rebuffering ratio of every `*.qoe.log`.
    Rebuffering {
        /// Dataset path.
        input_dir: PathBuf,
        /// Output CSV file path.
        output_csv: PathBuf,
        /// Session duration in seconds.
        #[arg(default_value_t = config::DEFAULT_SESSION_SECS)]
        duration: f64,
    },

    /// Quality changes in the trailing window of every event log.
    Switching {
        /// Dataset path.
        input_dir: PathBuf,
        /// Output CSV file path.
        output_csv: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
        #[command(flatten)]
        switching: SwitchingArgs,
    },

    /// All three metrics, one CSV each, into an output directory.
    All {
        /// Dataset path.
        input_dir: PathBuf,
        /// Directory for the output CSV files.
        out_dir: PathBuf,
        /// Session duration in seconds.
        #[arg(long, default_value_t = config::DEFAULT_SESSION_SECS)]
        duration: f64,
        #[command(flatten)]
        layout: LayoutArgs,
        #[command(flatten)]
        utility: UtilityArgs,
        #[command(flatten)]
        switching: SwitchingArgs,
    },
}

fn main() -> Result<()> {
    diagnostics::init();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Utility {
            input_dir,
            output_csv,
            layout,
            utility,
        } => {
            let params = params(Some(&utility), None)?;
            let ds = layout.dataset(input_dir)?;
            batch::write(&output_csv, &batch::utility(&ds, &params))?;
        }
        Commands::Rebuffering {
            input_dir,
            output_csv,
            duration,
        } => {
            // the walk does not use the grid layout
            let ds = dataset::Dataset::new(input_dir, config::DatasetLayout::default())?;
            let rows = batch::rebuffering(&ds, duration)?;
            batch::write(&output_csv, &rows)?;
        }
        Commands::Switching {
            input_dir,
            output_csv,
            layout,
            switching,
        } => {
            let params = params(None, Some(&switching))?;
            let ds = layout.dataset(input_dir)?;
            batch::write(&output_csv, &batch::switching(&ds, &params))?;
        }
        Commands::All {
            input_dir,
            out_dir,
            duration,
            layout,
            utility,
            switching,
        } => {
            let params = params(Some(&utility), Some(&switching))?;
            let ds = layout.dataset(input_dir)?;
            batch::all(&ds, &params, duration, &out_dir)?;
        }
    }

    Ok(())
}
