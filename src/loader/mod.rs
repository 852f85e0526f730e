//! Source loading for the two raw inputs.
//!
//! The outage spreadsheet export is read with the Polars CSV reader after
//! skipping its banner and units rows. The NOAA temperature file is decoded
//! line by line into a wide table keyed by the encoded identifier.

pub mod events;
pub mod temperature;

pub use events::load_event_source;
pub use temperature::{decode_temperature_line, load_temperature_source};

use crate::error::{OutageError, Result};
use std::path::Path;

/// Fail with `SourceNotFound` when an input path does not exist
pub(crate) fn ensure_source_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(OutageError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
