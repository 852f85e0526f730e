//! Output writing for the final analysis table
//!
//! Writes the table as CSV or Parquet depending on the configured (or
//! inferred) format. Parquet output honours the configured compression
//! and always carries column statistics.

use crate::config::{OutputConfig, OutputFormat};
use crate::constants::TIMESTAMP_FORMAT;
use crate::error::{OutageError, Result};

use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::{
    CsvWriter, DataFrame, ParquetWriter as PolarsParquetWriter, SerWriter, StatisticsOptions,
};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Writer for the final table
#[derive(Debug)]
pub struct TableWriter {
    output_path: PathBuf,
    format: OutputFormat,
    config: OutputConfig,
}

impl TableWriter {
    /// Create a writer, resolving the format from the config or the path extension
    pub fn new(output_path: PathBuf, config: OutputConfig) -> Result<Self> {
        let format = match config.format {
            Some(format) => format,
            None => OutputFormat::from_path(&output_path)?,
        };
        Ok(Self {
            output_path,
            format,
            config,
        })
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write the table into an existing directory; returns rows written
    pub fn write(&self, df: &mut DataFrame) -> Result<usize> {
        let progress_bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            progress_bar.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        progress_bar.set_message(format!(
            "Writing {} rows to {}",
            df.height(),
            self.output_path.display()
        ));

        let result = match self.format {
            OutputFormat::Csv => self.write_csv(df),
            OutputFormat::Parquet => self.write_parquet(df),
        };
        progress_bar.finish_and_clear();
        result?;

        debug!(
            "Wrote {} rows x {} columns as {:?} to {}",
            df.height(),
            df.width(),
            self.format,
            self.output_path.display()
        );

        Ok(df.height())
    }

    fn write_csv(&self, df: &mut DataFrame) -> Result<()> {
        let file = File::create(&self.output_path)?;
        CsvWriter::new(file)
            .include_header(true)
            .with_datetime_format(Some(TIMESTAMP_FORMAT.to_string()))
            .finish(df)
            .map_err(|e| self.write_failed(e))
    }

    fn write_parquet(&self, df: &mut DataFrame) -> Result<()> {
        let file = File::create(&self.output_path)?;
        PolarsParquetWriter::new(file)
            .with_compression(self.config.compression.to_polars_compression())
            .with_statistics(StatisticsOptions::full())
            .finish(df)
            .map(|_| ())
            .map_err(|e| self.write_failed(e))
    }

    fn write_failed(&self, error: polars::prelude::PolarsError) -> OutageError {
        OutageError::OutputFailed {
            path: self.output_path.clone(),
            reason: error.to_string(),
        }
    }
}
