//! Key reconciliation between the temperature and outage sources.
//!
//! The NOAA identifier packs a state code and a year into one digit
//! string. Reconciliation splits it, keeps the years covered by the
//! outage records, resolves each state code to a state name through an
//! injected [`StateNameMapping`] and reshapes the twelve month columns
//! into one `(state, year, month, avg_temp_f)` row per month.

use crate::constants::{CONTIGUOUS_STATES, YEAR_DIGITS, columns};
use crate::error::{OutageError, Result};
use crate::models::StateCodeKey;
use polars::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

static ENCODED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^([0-9]+)([0-9]{{{}}})$", YEAR_DIGITS)).expect("valid identifier pattern")
});

/// Split an encoded identifier into state code and year
///
/// The trailing four digits are the year; everything before them is the
/// state code, leading zeros included.
pub fn decompose_state_key(encoded: &str) -> Result<StateCodeKey> {
    let trimmed = encoded.trim();
    let captures = ENCODED_KEY
        .captures(trimmed)
        .ok_or_else(|| OutageError::InvalidIdentifier {
            identifier: encoded.to_string(),
            reason: format!(
                "expected at least {} digits ending in a {}-digit year",
                YEAR_DIGITS + 1,
                YEAR_DIGITS
            ),
        })?;

    let year = captures[2]
        .parse::<i32>()
        .map_err(|e| OutageError::InvalidIdentifier {
            identifier: encoded.to_string(),
            reason: e.to_string(),
        })?;

    Ok(StateCodeKey {
        state_code: captures[1].to_string(),
        year,
    })
}

/// Correspondence between NOAA state codes and state names
#[derive(Debug, Clone, PartialEq)]
pub enum StateNameMapping {
    /// Names in code order: the Nth distinct code maps to the Nth name
    Positional(Vec<String>),
    /// Explicit code -> name table
    Explicit(BTreeMap<String, String>),
}

impl Default for StateNameMapping {
    fn default() -> Self {
        Self::contiguous_states()
    }
}

impl StateNameMapping {
    /// The 48 contiguous states in NOAA order
    pub fn contiguous_states() -> Self {
        StateNameMapping::Positional(CONTIGUOUS_STATES.iter().map(|s| s.to_string()).collect())
    }

    /// Number of names available
    pub fn len(&self) -> usize {
        match self {
            StateNameMapping::Positional(names) => names.len(),
            StateNameMapping::Explicit(table) => table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse a mapping file
    ///
    /// Lines of the form `code,name` produce an explicit table; plain
    /// names produce a positional list. Blank lines and `#` comments are
    /// ignored. Mixing both forms, or a file without entries, is rejected.
    pub fn parse(content: &str) -> Result<Self> {
        let mapping = Self::parse_entries(content)?;
        if mapping.is_empty() {
            return Err(OutageError::Configuration {
                message: "state mapping has no entries".to_string(),
            });
        }
        Ok(mapping)
    }

    fn parse_entries(content: &str) -> Result<Self> {
        let entries: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();

        let explicit = entries.iter().filter(|line| line.contains(',')).count();
        if explicit == 0 {
            return Ok(StateNameMapping::Positional(
                entries.iter().map(|s| s.to_string()).collect(),
            ));
        }
        if explicit != entries.len() {
            return Err(OutageError::Configuration {
                message: "state mapping mixes 'code,name' lines with bare names".to_string(),
            });
        }

        let mut table = BTreeMap::new();
        for line in entries {
            let (code, name) = line.split_once(',').unwrap_or((line, ""));
            let (code, name) = (code.trim(), name.trim());
            if code.is_empty() || name.is_empty() {
                return Err(OutageError::Configuration {
                    message: format!("invalid state mapping line '{}'", line),
                });
            }
            if table.insert(code.to_string(), name.to_string()).is_some() {
                return Err(OutageError::Configuration {
                    message: format!("state code {} mapped twice", code),
                });
            }
        }
        Ok(StateNameMapping::Explicit(table))
    }

    /// Load a mapping file from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Resolve the observed distinct codes (first-appearance order) to names
    ///
    /// The code count must equal the number of names available.
    pub fn resolve(&self, distinct_codes: &[String]) -> Result<HashMap<String, String>> {
        if distinct_codes.len() != self.len() {
            return Err(OutageError::ReconciliationCountMismatch {
                codes: distinct_codes.len(),
                names: self.len(),
            });
        }

        match self {
            StateNameMapping::Positional(names) => Ok(distinct_codes
                .iter()
                .cloned()
                .zip(names.iter().cloned())
                .collect()),
            StateNameMapping::Explicit(table) => distinct_codes
                .iter()
                .map(|code| {
                    table
                        .get(code)
                        .map(|name| (code.clone(), name.clone()))
                        .ok_or_else(|| OutageError::UnknownStateCode { code: code.clone() })
                })
                .collect(),
        }
    }
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileSummary {
    pub wide_rows: usize,
    pub rows_in_window: usize,
    pub state_codes: usize,
    pub long_rows: usize,
}

/// Reconciler turning the wide NOAA table into long `(state, year, month)` rows
#[derive(Debug, Clone)]
pub struct KeyReconciler {
    mapping: StateNameMapping,
    min_year: i32,
}

impl KeyReconciler {
    pub fn new(mapping: StateNameMapping, min_year: i32) -> Self {
        Self { mapping, min_year }
    }

    /// Reconcile the wide table produced by the temperature loader
    pub fn reconcile(&self, wide: &DataFrame) -> Result<(DataFrame, ReconcileSummary)> {
        let codes = wide.column(columns::TEMPERATURE_CODE)?.str()?;
        let month_values = columns::MONTHS
            .iter()
            .map(|month| wide.column(month).and_then(|c| c.f64()))
            .collect::<PolarsResult<Vec<_>>>()?;

        // Decompose and keep the rows inside the year window
        let mut in_window: Vec<(usize, StateCodeKey)> = Vec::new();
        for (row, encoded) in codes.into_iter().enumerate() {
            let encoded = encoded.ok_or_else(|| OutageError::InvalidIdentifier {
                identifier: String::new(),
                reason: format!("missing identifier on row {}", row + 1),
            })?;
            let key = decompose_state_key(encoded)?;
            if key.year >= self.min_year {
                in_window.push((row, key));
            }
        }

        let mut seen = HashSet::new();
        let distinct_codes: Vec<String> = in_window
            .iter()
            .filter(|(_, key)| seen.insert(key.state_code.clone()))
            .map(|(_, key)| key.state_code.clone())
            .collect();

        let names = self.mapping.resolve(&distinct_codes)?;

        let mut states = Vec::new();
        let mut years = Vec::new();
        let mut months = Vec::new();
        let mut temps = Vec::new();
        let mut keys = HashSet::new();

        for (row, key) in &in_window {
            let state = &names[&key.state_code];
            for (month_idx, values) in month_values.iter().enumerate() {
                let Some(avg_temp) = values.get(*row) else {
                    continue;
                };
                let month = month_idx as u32 + 1;
                if !keys.insert((state.clone(), key.year, month)) {
                    return Err(OutageError::DuplicateTemperatureKey {
                        state: state.clone(),
                        year: key.year,
                        month,
                    });
                }
                states.push(state.clone());
                years.push(key.year);
                months.push(month as i32);
                temps.push(avg_temp);
            }
        }

        let summary = ReconcileSummary {
            wide_rows: wide.height(),
            rows_in_window: in_window.len(),
            state_codes: distinct_codes.len(),
            long_rows: states.len(),
        };

        let long = DataFrame::new(vec![
            Column::new(columns::STATE.into(), states),
            Column::new(columns::YEAR.into(), years),
            Column::new(columns::MONTH.into(), months),
            Column::new(columns::AVG_TEMP_F.into(), temps),
        ])?;

        info!(
            "Reconciled {} temperature records ({} from {} on) across {} states into {} monthly rows",
            summary.wide_rows, summary.rows_in_window, self.min_year, summary.state_codes, summary.long_rows
        );
        debug!("Reconciliation summary: {:?}", summary);

        Ok((long, summary))
    }
}
