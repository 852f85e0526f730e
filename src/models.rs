//! Core data structures and types for outage/temperature processing.
//!
//! Defines source layouts, decoded keys, derived categories and the
//! statistics reported for each pipeline run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Layouts understood by the temperature loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureLayout {
    /// Whitespace separated cells; blank cells from repeated spaces are discarded
    Whitespace,
    /// NOAA fixed-width records: 10-char identifier then twelve 7-char values
    FixedWidth,
}

impl TemperatureLayout {
    /// Parse a layout name as accepted on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "whitespace" | "ws" => Some(TemperatureLayout::Whitespace),
            "fixed-width" | "fixed" | "fixedwidth" => Some(TemperatureLayout::FixedWidth),
            _ => None,
        }
    }
}

/// Encoded temperature identifier split into its components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateCodeKey {
    pub state_code: String,
    pub year: i32,
}

/// Temperature bucket of an outage month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TempCategory {
    Cold,
    Neutral,
    Hot,
}

impl TempCategory {
    /// Classify an average temperature; hot is checked before cold
    pub fn classify(avg_temp_f: f64, cold_max_f: f64, hot_min_f: f64) -> Self {
        if avg_temp_f >= hot_min_f {
            TempCategory::Hot
        } else if avg_temp_f <= cold_max_f {
            TempCategory::Cold
        } else {
            TempCategory::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TempCategory::Cold => "cold",
            TempCategory::Neutral => "neutral",
            TempCategory::Hot => "hot",
        }
    }
}

/// Statistics for one pipeline run
#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    pub event_rows: usize,
    pub temperature_rows_wide: usize,
    pub temperature_rows_long: usize,
    pub state_codes: usize,
    pub matched_rows: usize,
    pub unmatched_rows: usize,
    pub filtered_rows: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}

impl PipelineStats {
    /// Rows removed by the row filter
    pub fn rows_removed(&self) -> usize {
        (self.matched_rows + self.unmatched_rows).saturating_sub(self.filtered_rows)
    }
}
