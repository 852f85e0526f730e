//! Whole-pipeline properties over the scenario sources

use super::fixtures::*;
use crate::constants::{EXCLUDED_CAUSE_CATEGORIES, EXCLUDED_CAUSE_DETAILS, columns};
use crate::processor::{OutagePipeline, PipelineOutcome};
use crate::reconcile::decompose_state_key;
use polars::prelude::*;
use std::fs;
use tempfile::TempDir;

const YEARS: [i32; 2] = [2011, 2012];

fn run_scenario(temp_dir: &TempDir, output_name: &str) -> PipelineOutcome {
    let events = write_events(temp_dir.path(), &scenario_events());
    let temperature = write_temperatures(temp_dir.path(), &YEARS, scenario_temperature);

    OutagePipeline::new(
        events,
        temperature,
        Some(temp_dir.path().join(output_name)),
    )
    .unwrap()
    .with_progress(false)
    .execute()
    .unwrap()
}

fn row_of(df: &DataFrame, obs_id: i64) -> Option<usize> {
    df.column(columns::OBS_ID)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .position(|id| id == Some(obs_id))
}

#[test]
fn test_idempotent_csv_output() {
    let temp_dir = TempDir::new().unwrap();
    run_scenario(&temp_dir, "first.csv");
    run_scenario(&temp_dir, "second.csv");

    let first = fs::read(temp_dir.path().join("first.csv")).unwrap();
    let second = fs::read(temp_dir.path().join("second.csv")).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_row_count_monotonicity() {
    let temp_dir = TempDir::new().unwrap();
    let stats = run_scenario(&temp_dir, "out.csv").stats;

    let joined = stats.matched_rows + stats.unmatched_rows;
    assert!(stats.filtered_rows <= joined);
    assert_eq!(joined, stats.event_rows);
    assert_eq!(stats.rows_removed(), 3);
}

#[test]
fn test_null_propagation() {
    let temp_dir = TempDir::new().unwrap();
    let table = run_scenario(&temp_dir, "out.csv").table;

    let temps = table.column(columns::AVG_TEMP_F).unwrap().f64().unwrap();
    let categories = table.column(columns::TEMP_CATEGORY).unwrap().str().unwrap();
    let is_hot = table.column(columns::IS_HOT).unwrap().i32().unwrap();

    for i in 0..table.height() {
        let null_temp = temps.get(i).is_none();
        assert_eq!(categories.get(i).is_none(), null_temp, "row {}", i);
        assert_eq!(is_hot.get(i).is_none(), null_temp, "row {}", i);
    }

    // Alaska has no temperature series and the month-less Ohio row cannot match
    for obs_id in [5, 6] {
        let row = row_of(&table, obs_id).unwrap();
        assert_eq!(temps.get(row), None);
    }
}

#[test]
fn test_threshold_consistency() {
    let temp_dir = TempDir::new().unwrap();
    let outcome = run_scenario(&temp_dir, "out.csv");
    let threshold = outcome.threshold.value().unwrap();

    let temps = outcome.table.column(columns::AVG_TEMP_F).unwrap().f64().unwrap();
    let is_hot = outcome.table.column(columns::IS_HOT).unwrap().i32().unwrap();

    for (temp, flag) in temps.into_iter().zip(is_hot.into_iter()) {
        if let (Some(temp), Some(flag)) = (temp, flag) {
            assert_eq!(flag == 1, temp >= threshold);
        }
    }
}

#[test]
fn test_filter_correctness() {
    let temp_dir = TempDir::new().unwrap();
    let table = run_scenario(&temp_dir, "out.csv").table;

    let durations = table.column(columns::OUTAGE_DURATION).unwrap().f64().unwrap();
    assert!(durations.into_iter().all(|d| d.is_some_and(|d| d <= 30_000.0)));

    let details = table.column(columns::CAUSE_DETAIL).unwrap().str().unwrap();
    for detail in details.into_iter().flatten() {
        assert!(!EXCLUDED_CAUSE_DETAILS.contains(&detail));
    }
    let categories = table.column(columns::CAUSE_CATEGORY).unwrap().str().unwrap();
    for category in categories.into_iter().flatten() {
        assert!(!EXCLUDED_CAUSE_CATEGORIES.contains(&category));
    }
}

#[test]
fn test_texas_heatwave_row() {
    let temp_dir = TempDir::new().unwrap();
    let outcome = run_scenario(&temp_dir, "out.csv");
    let table = &outcome.table;
    assert!(outcome.threshold.value().unwrap() < 85.0);

    let row = row_of(table, 1).unwrap();
    assert_eq!(
        table.column(columns::STATE).unwrap().str().unwrap().get(row),
        Some("Texas")
    );
    assert_eq!(
        table.column(columns::AVG_TEMP_F).unwrap().f64().unwrap().get(row),
        Some(85.0)
    );
    assert_eq!(
        table.column(columns::TEMP_CATEGORY).unwrap().str().unwrap().get(row),
        Some("hot")
    );
    assert_eq!(
        table.column(columns::IS_HOT).unwrap().i32().unwrap().get(row),
        Some(1)
    );
    let start = table
        .column(columns::OUTAGE_START)
        .unwrap()
        .datetime()
        .unwrap()
        .as_datetime_iter()
        .nth(row)
        .flatten()
        .unwrap();
    assert_eq!(start.to_string(), "2011-08-01 17:00:00");
}

#[test]
fn test_earthquake_row_excluded() {
    let temp_dir = TempDir::new().unwrap();
    let table = run_scenario(&temp_dir, "out.csv").table;

    assert!(row_of(&table, 2).is_none());
    let details = table.column(columns::CAUSE_DETAIL).unwrap().str().unwrap();
    assert!(details.into_iter().all(|d| d != Some("earthquake")));
}

#[test]
fn test_short_identifier_decomposition() {
    let key = decompose_state_key("0102011").unwrap();
    assert_eq!(key.state_code, "010");
    assert_eq!(key.year, 2011);
}

#[test]
fn test_analysis_runs_over_final_table() {
    let temp_dir = TempDir::new().unwrap();
    let outcome = run_scenario(&temp_dir, "out.csv");
    let analysis = outcome.analysis.unwrap();

    // Two rows with a temperature survive the filter, both at 85°F
    assert!(analysis.duration_on_temperature.is_none());
    assert!(analysis.hot_vs_not_hot.is_none());
}
