//! NOAA climate-division temperature file decoding.
//!
//! Each record is an encoded identifier followed by twelve monthly
//! averages. Splitting the whitespace layout naively on single spaces
//! yields blank cells between the values; those are discarded and the
//! surviving cells are bound to `code, jan..dec` by name. Any line that
//! does not decode to exactly thirteen cells is a schema mismatch.

use super::ensure_source_exists;
use crate::config::TemperatureSourceConfig;
use crate::constants::{
    FIXED_WIDTH_CODE_CHARS, FIXED_WIDTH_VALUE_CHARS, TEMPERATURE_CELLS, columns,
};
use crate::error::{OutageError, Result};
use crate::models::TemperatureLayout;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// One decoded line of the temperature file
#[derive(Debug, Clone, PartialEq)]
pub struct WideTemperatureRow {
    pub code: String,
    pub monthly: [Option<f64>; 12],
}

/// Load the temperature file into a wide `DataFrame` (`code`, `jan`..`dec`)
pub fn load_temperature_source(
    path: &Path,
    config: &TemperatureSourceConfig,
) -> Result<DataFrame> {
    ensure_source_exists(path)?;

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(decode_temperature_line(
            &line,
            line_num + 1,
            config.layout,
            config.missing_value,
        )?);
    }

    debug!(
        "Decoded {} temperature records from {} ({:?} layout)",
        rows.len(),
        path.display(),
        config.layout
    );

    Ok(wide_frame(&rows)?)
}

/// Decode one raw line into a wide temperature row
///
/// `line_num` is only used for error context.
pub fn decode_temperature_line(
    line: &str,
    line_num: usize,
    layout: TemperatureLayout,
    missing_value: Option<f64>,
) -> Result<WideTemperatureRow> {
    let cells = match layout {
        TemperatureLayout::Whitespace => split_discarding_blanks(line),
        TemperatureLayout::FixedWidth => split_fixed_width(line),
    };

    if cells.len() != TEMPERATURE_CELLS {
        return Err(OutageError::schema_mismatch(
            "temperature source",
            format!("{} cells", TEMPERATURE_CELLS),
            format!("{} cells", cells.len()),
            format!("line {}", line_num),
        ));
    }

    let code = cells[0].clone();
    let mut monthly = [None; 12];
    for (i, (month, cell)) in columns::MONTHS.iter().zip(&cells[1..]).enumerate() {
        let value: f64 = cell.parse().map_err(|_| {
            OutageError::schema_mismatch(
                "temperature source",
                format!("numeric value for {}", month),
                format!("'{}'", cell),
                format!("line {}", line_num),
            )
        })?;

        monthly[i] = match missing_value {
            Some(sentinel) if (value - sentinel).abs() < 1e-6 => None,
            _ => Some(value),
        };
    }

    Ok(WideTemperatureRow { code, monthly })
}

/// Split on single spaces and drop the blank cells produced by runs of spaces
fn split_discarding_blanks(line: &str) -> Vec<String> {
    line.split([' ', '\t'])
        .filter(|cell| !cell.is_empty())
        .map(|cell| cell.to_string())
        .collect()
}

/// Split a NOAA fixed-width record into identifier and value fields
fn split_fixed_width(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.trim_end().chars().collect();
    if chars.len() < FIXED_WIDTH_CODE_CHARS {
        return vec![chars.iter().collect::<String>().trim().to_string()];
    }

    let (code, rest) = chars.split_at(FIXED_WIDTH_CODE_CHARS);
    let mut cells = vec![code.iter().collect::<String>().trim().to_string()];
    cells.extend(
        rest.chunks(FIXED_WIDTH_VALUE_CHARS)
            .map(|field| field.iter().collect::<String>().trim().to_string()),
    );
    cells
}

fn wide_frame(rows: &[WideTemperatureRow]) -> PolarsResult<DataFrame> {
    let codes: Vec<String> = rows.iter().map(|row| row.code.clone()).collect();

    let mut frame_columns = Vec::with_capacity(TEMPERATURE_CELLS);
    frame_columns.push(Column::new(columns::TEMPERATURE_CODE.into(), codes));
    for (i, month) in columns::MONTHS.iter().enumerate() {
        let values: Vec<Option<f64>> = rows.iter().map(|row| row.monthly[i]).collect();
        frame_columns.push(Column::new((*month).into(), values));
    }

    DataFrame::new(frame_columns)
}
