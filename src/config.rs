//! Configuration management and validation.
//!
//! Provides configuration structures for the source layouts, feature
//! bounds, row filter predicates and output settings of a pipeline run.

use crate::constants::{
    COLD_MAX_F, DEFAULT_MIN_YEAR, EVENT_BANNER_ROWS, EVENT_RAW_COLUMN_COUNT, EVENT_UNITS_ROWS,
    EXCLUDED_CAUSE_CATEGORIES, EXCLUDED_CAUSE_DETAILS, HOT_MIN_F, MAX_OUTAGE_DURATION_MINUTES,
    NOAA_MISSING_VALUE,
};
use crate::error::{OutageError, Result};
use crate::models::TemperatureLayout;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported compression algorithms for parquet output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }

    /// Parse a compression name as accepted on the command line
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "snappy" => Ok(CompressionAlgorithm::Snappy),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            "none" | "uncompressed" => Ok(CompressionAlgorithm::Uncompressed),
            other => Err(OutageError::Configuration {
                message: format!(
                    "Unknown compression '{}' (expected snappy, zstd, lz4 or none)",
                    other
                ),
            }),
        }
    }
}

/// Serialization format of the final table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    /// Pick the format from an output file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" | "pq" => Ok(OutputFormat::Parquet),
            _ => Err(OutageError::Configuration {
                message: format!(
                    "Cannot infer output format from '{}' (use .csv or .parquet)",
                    path.display()
                ),
            }),
        }
    }
}

/// Layout of the outage spreadsheet export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSourceConfig {
    /// Banner rows above the header row
    pub banner_rows: usize,

    /// Units-annotation rows below the header row
    pub units_rows: usize,

    /// Cell token read as null in addition to empty cells
    pub null_token: String,

    /// Exact raw column count to enforce (None = only check required columns)
    pub expected_raw_columns: Option<usize>,
}

impl Default for EventSourceConfig {
    fn default() -> Self {
        Self {
            banner_rows: EVENT_BANNER_ROWS,
            units_rows: EVENT_UNITS_ROWS,
            null_token: "NA".to_string(),
            expected_raw_columns: Some(EVENT_RAW_COLUMN_COUNT),
        }
    }
}

/// Layout and coverage of the NOAA temperature file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureSourceConfig {
    pub layout: TemperatureLayout,

    /// Earliest year kept before reconciliation
    pub min_year: i32,

    /// Sentinel decoded as a missing measurement
    pub missing_value: Option<f64>,
}

impl Default for TemperatureSourceConfig {
    fn default() -> Self {
        Self {
            layout: TemperatureLayout::Whitespace,
            min_year: DEFAULT_MIN_YEAR,
            missing_value: Some(NOAA_MISSING_VALUE),
        }
    }
}

/// Bounds for the temperature category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub cold_max_f: f64,
    pub hot_min_f: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            cold_max_f: COLD_MAX_F,
            hot_min_f: HOT_MIN_F,
        }
    }
}

/// Row filter predicates applied to the joined table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_duration_minutes: f64,
    pub excluded_cause_details: Vec<String>,
    pub excluded_cause_categories: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_duration_minutes: MAX_OUTAGE_DURATION_MINUTES,
            excluded_cause_details: EXCLUDED_CAUSE_DETAILS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_cause_categories: EXCLUDED_CAUSE_CATEGORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Output file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Explicit format; inferred from the output extension when None
    pub format: Option<OutputFormat>,

    pub compression: CompressionAlgorithm,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            compression: CompressionAlgorithm::Snappy,
        }
    }
}

/// Global configuration for a pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub events: EventSourceConfig,
    pub temperature: TemperatureSourceConfig,
    pub features: FeatureConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,

    /// Skip the regression / t-test summary
    pub skip_analysis: bool,
}

impl PipelineConfig {
    /// Set the temperature file layout
    pub fn with_temperature_layout(mut self, layout: TemperatureLayout) -> Self {
        self.temperature.layout = layout;
        self
    }

    /// Set the earliest temperature year kept
    pub fn with_min_year(mut self, min_year: i32) -> Self {
        self.temperature.min_year = min_year;
        self
    }

    /// Set the outage duration bound of the row filter
    pub fn with_max_duration(mut self, minutes: f64) -> Self {
        self.filter.max_duration_minutes = minutes;
        self
    }

    /// Set parquet compression
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.output.compression = compression;
        self
    }

    /// Force an output format regardless of extension
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output.format = Some(format);
        self
    }

    /// Accept event sources of any width that carry the required columns
    pub fn without_event_width_check(mut self) -> Self {
        self.events.expected_raw_columns = None;
        self
    }

    /// Disable the regression / t-test summary
    pub fn without_analysis(mut self) -> Self {
        self.skip_analysis = true;
        self
    }

    /// Check internal consistency of the configuration
    pub fn validate(&self) -> Result<()> {
        if self.features.cold_max_f >= self.features.hot_min_f {
            return Err(OutageError::Configuration {
                message: format!(
                    "cold bound {}°F must be below hot bound {}°F",
                    self.features.cold_max_f, self.features.hot_min_f
                ),
            });
        }

        if !self.filter.max_duration_minutes.is_finite() || self.filter.max_duration_minutes < 0.0
        {
            return Err(OutageError::Configuration {
                message: format!(
                    "max outage duration must be a non-negative number, got {}",
                    self.filter.max_duration_minutes
                ),
            });
        }

        Ok(())
    }
}
