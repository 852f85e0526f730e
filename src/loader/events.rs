//! Outage event source loading.

use super::ensure_source_exists;
use crate::config::EventSourceConfig;
use crate::error::{OutageError, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// Load the outage spreadsheet export into a raw `DataFrame`
///
/// Skips `banner_rows` lines, reads the header row, then drops the
/// `units_rows` annotation lines that follow it. Column names are kept
/// exactly as they appear in the source; renaming happens in the
/// schema normalizer.
pub fn load_event_source(path: &Path, config: &EventSourceConfig) -> Result<DataFrame> {
    ensure_source_exists(path)?;

    let null_token: PlSmallStr = config.null_token.as_str().into();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows(config.banner_rows)
        .with_skip_rows_after_header(config.units_rows)
        .with_infer_schema_length(None)
        .map_parse_options(|opts| {
            opts.with_null_values(Some(NullValues::AllColumnsSingle(null_token.clone())))
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    if let Some(expected) = config.expected_raw_columns {
        if df.width() != expected {
            return Err(OutageError::schema_mismatch(
                "event source",
                format!("{} columns", expected),
                format!("{} columns", df.width()),
                format!("{}", path.display()),
            ));
        }
    }

    debug!(
        "Loaded event source {}: {} rows x {} columns",
        path.display(),
        df.height(),
        df.width()
    );

    Ok(df)
}
