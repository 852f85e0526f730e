//! Pipeline orchestration.
//!
//! Runs the stages in order (load, normalize, reconcile, join, derive,
//! filter, write, analyse) and reports progress and statistics for the
//! run. Stage work is CPU-bound Polars code and runs on a blocking thread.

pub mod writer;

#[cfg(test)]
pub mod tests;

use self::writer::TableWriter;

use crate::analysis::AnalysisReport;
use crate::config::PipelineConfig;
use crate::constants::columns;
use crate::error::Result;
use crate::features::{FeatureDeriver, HotThreshold};
use crate::filter::RowFilter;
use crate::join::join_temperatures;
use crate::loader::{ensure_source_exists, load_event_source, load_temperature_source};
use crate::models::PipelineStats;
use crate::reconcile::{KeyReconciler, StateNameMapping};
use crate::schema::SchemaNormalizer;

use colored::*;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::task;
use tracing::{debug, info};

/// File name used when no output path is given
pub const DEFAULT_OUTPUT_NAME: &str = "outage_temperature.csv";

/// Everything a pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub table: DataFrame,
    pub threshold: HotThreshold,
    pub stats: PipelineStats,
    pub analysis: Option<AnalysisReport>,
}

/// Outage/temperature reconciliation pipeline
#[derive(Debug, Clone)]
pub struct OutagePipeline {
    events_path: PathBuf,
    temperature_path: PathBuf,
    output_path: PathBuf,
    config: PipelineConfig,
    state_mapping: StateNameMapping,
    show_progress: bool,
}

impl OutagePipeline {
    /// Create a new pipeline; both inputs must exist
    ///
    /// Without an explicit output the table is written next to the event
    /// source as `outage_temperature.csv`.
    pub fn new(
        events_path: PathBuf,
        temperature_path: PathBuf,
        output_path: Option<PathBuf>,
    ) -> Result<Self> {
        ensure_source_exists(&events_path)?;
        ensure_source_exists(&temperature_path)?;

        let output_path = output_path.unwrap_or_else(|| {
            events_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DEFAULT_OUTPUT_NAME)
        });

        Ok(Self {
            events_path,
            temperature_path,
            output_path,
            config: PipelineConfig::default(),
            state_mapping: StateNameMapping::contiguous_states(),
            show_progress: true,
        })
    }

    /// Configure the pipeline
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default 48-state positional mapping
    pub fn with_state_mapping(mut self, mapping: StateNameMapping) -> Self {
        self.state_mapping = mapping;
        self
    }

    /// Toggle the step-by-step terminal output
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Main processing entry point
    pub async fn run(&self) -> Result<PipelineOutcome> {
        self.config.validate()?;

        if self.show_progress {
            println!(
                "{}",
                "Starting outage/temperature reconciliation"
                    .bright_green()
                    .bold()
            );
            println!(
                "  {} {}",
                "Events:".bright_cyan(),
                self.events_path.display()
            );
            println!(
                "  {} {}",
                "Temperature:".bright_cyan(),
                self.temperature_path.display()
            );
            println!(
                "  {} {}",
                "Output:".bright_cyan(),
                self.output_path.display()
            );
        }

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let pipeline = self.clone();
        let outcome = task::spawn_blocking(move || pipeline.execute()).await??;

        if self.show_progress {
            print_summary(&outcome);
        }

        Ok(outcome)
    }

    /// Run every stage synchronously on the current thread
    ///
    /// The output directory must already exist.
    pub fn execute(&self) -> Result<PipelineOutcome> {
        let start_time = Instant::now();
        let writer = TableWriter::new(self.output_path.clone(), self.config.output.clone())?;
        let mut stats = PipelineStats {
            output_path: self.output_path.clone(),
            ..Default::default()
        };

        // Step 1: Events
        self.step("Loading outage events...");
        let raw_events = load_event_source(&self.events_path, &self.config.events)?;
        let events = SchemaNormalizer::new().normalize_events(raw_events)?;
        stats.event_rows = events.height();
        self.detail("Loaded", format!("{} outage events", stats.event_rows));

        // Step 2: Temperatures
        self.step("Loading and reconciling temperatures...");
        let wide = load_temperature_source(&self.temperature_path, &self.config.temperature)?;
        let reconciler =
            KeyReconciler::new(self.state_mapping.clone(), self.config.temperature.min_year);
        let (temperatures, summary) = reconciler.reconcile(&wide)?;
        stats.temperature_rows_wide = summary.wide_rows;
        stats.temperature_rows_long = summary.long_rows;
        stats.state_codes = summary.state_codes;
        self.detail(
            "Reconciled",
            format!(
                "{} state codes into {} monthly rows",
                summary.state_codes, summary.long_rows
            ),
        );

        // Step 3: Join
        self.step("Joining events to temperatures...");
        let (joined, join_summary) = join_temperatures(events, temperatures)?;
        stats.matched_rows = join_summary.matched;
        stats.unmatched_rows = join_summary.unmatched;
        if join_summary.unmatched > 0 {
            debug!(
                "{} events have no temperature for their state and month",
                join_summary.unmatched
            );
        }
        self.detail(
            "Matched",
            format!(
                "{} of {} events",
                join_summary.matched,
                join_summary.matched + join_summary.unmatched
            ),
        );

        // Step 4: Features over the unfiltered join
        let threshold = HotThreshold::from_joined(&joined)?;
        let featured = FeatureDeriver::new(&self.config.features).derive(joined, threshold)?;

        // Step 5: Filter
        self.step("Filtering...");
        let filtered = RowFilter::new(self.config.filter.clone()).apply(featured)?;
        let mut table = filtered.select(columns::OUTPUT.iter().copied())?;
        stats.filtered_rows = table.height();
        self.detail("Kept", format!("{} rows", stats.filtered_rows));

        // Step 6: Write
        writer.write(&mut table)?;

        // Step 7: Analysis
        let analysis = if self.config.skip_analysis {
            None
        } else {
            Some(AnalysisReport::from_table(&table)?)
        };

        stats.processing_time_ms = start_time.elapsed().as_millis();
        info!(
            "Pipeline finished: {} events, {} matched, {} rows written in {}ms",
            stats.event_rows, stats.matched_rows, stats.filtered_rows, stats.processing_time_ms
        );

        Ok(PipelineOutcome {
            table,
            threshold,
            stats,
            analysis,
        })
    }

    fn step(&self, message: &str) {
        if self.show_progress {
            println!("\n{}", message.bright_yellow());
        }
    }

    fn detail(&self, label: &str, message: String) {
        if self.show_progress {
            println!("  {} {}", label.bright_green(), message.bright_white().bold());
        }
    }
}

fn print_summary(outcome: &PipelineOutcome) {
    let stats = &outcome.stats;
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Events loaded:".bright_cyan(),
        stats.event_rows.to_string().bright_white()
    );
    println!(
        "  {} {} wide / {} long",
        "Temperature rows:".bright_cyan(),
        stats.temperature_rows_wide.to_string().bright_white(),
        stats.temperature_rows_long.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Matched:".bright_cyan(),
        stats.matched_rows.to_string().bright_white()
    );
    if stats.unmatched_rows > 0 {
        println!(
            "  {} {}",
            "Unmatched:".bright_red(),
            stats.unmatched_rows.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "is_hot threshold:".bright_cyan(),
        outcome
            .threshold
            .value()
            .map(|t| format!("{:.2}°F", t))
            .unwrap_or_else(|| "undefined".to_string())
            .bright_white()
    );
    println!(
        "  {} {} ({} removed)",
        "Rows written:".bright_cyan(),
        stats.filtered_rows.to_string().bright_white().bold(),
        stats.rows_removed()
    );

    if let Some(analysis) = &outcome.analysis {
        println!("\n{}", "Analysis".bright_green().bold());
        for line in analysis.to_string().lines() {
            println!("  {}", line);
        }
    }
}
