//! Command-line interface components.

use crate::config::{CompressionAlgorithm, PipelineConfig};
use crate::constants::{DEFAULT_MIN_YEAR, MAX_OUTAGE_DURATION_MINUTES};
use crate::error::Result;
use crate::models::TemperatureLayout;
use crate::processor::{OutagePipeline, PipelineOutcome};
use crate::reconcile::StateNameMapping;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "outage-climate")]
#[command(
    about = "Join major U.S. power outage events with NOAA state monthly temperatures"
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Outage spreadsheet export (CSV with banner and units rows)
    #[arg(value_name = "EVENTS")]
    pub events_path: PathBuf,

    /// NOAA state monthly average temperature file
    #[arg(value_name = "TEMPERATURE")]
    pub temperature_path: PathBuf,

    /// Output table (.csv or .parquet); defaults to outage_temperature.csv next to EVENTS
    #[arg(short, long = "output", value_name = "OUTPUT")]
    pub output_path: Option<PathBuf>,

    /// State mapping file: one name per line (positional) or `code,name` per line
    #[arg(long, value_name = "FILE")]
    pub state_names: Option<PathBuf>,

    /// Temperature file layout (whitespace, fixed-width)
    #[arg(long, default_value = "whitespace", value_parser = parse_layout)]
    pub temperature_layout: TemperatureLayout,

    /// Earliest temperature year kept
    #[arg(long, default_value_t = DEFAULT_MIN_YEAR)]
    pub min_year: i32,

    /// Longest outage kept, in minutes
    #[arg(long, default_value_t = MAX_OUTAGE_DURATION_MINUTES)]
    pub max_duration: f64,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, default_value = "snappy")]
    pub compression: String,

    /// Skip the regression and t-test summary
    #[arg(long)]
    pub skip_analysis: bool,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

fn parse_layout(value: &str) -> std::result::Result<TemperatureLayout, String> {
    TemperatureLayout::from_name(value)
        .ok_or_else(|| format!("unknown layout '{}' (expected whitespace or fixed-width)", value))
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show step output (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Build the pipeline configuration from the flags
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::default()
            .with_temperature_layout(self.temperature_layout)
            .with_min_year(self.min_year)
            .with_max_duration(self.max_duration)
            .with_compression(CompressionAlgorithm::from_name(&self.compression)?);
        if self.skip_analysis {
            config = config.without_analysis();
        }
        config.validate()?;
        Ok(config)
    }

    /// Load the state mapping, falling back to the 48 contiguous states
    pub fn state_mapping(&self) -> Result<StateNameMapping> {
        match &self.state_names {
            Some(path) => StateNameMapping::from_file(path),
            None => Ok(StateNameMapping::contiguous_states()),
        }
    }
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("outage_climate={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Run the pipeline described by the arguments
pub async fn run(args: &Args) -> Result<PipelineOutcome> {
    let config = args.to_config()?;
    let mapping = args.state_mapping()?;

    OutagePipeline::new(
        args.events_path.clone(),
        args.temperature_path.clone(),
        args.output_path.clone(),
    )?
    .with_config(config)
    .with_state_mapping(mapping)
    .with_progress(args.show_progress())
    .run()
    .await
}
