//! Error handling integration tests

use super::fixtures::*;
use crate::error::OutageError;
use crate::processor::OutagePipeline;
use crate::reconcile::StateNameMapping;
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_nonexistent_event_source() {
    let temp_dir = TempDir::new().unwrap();
    let temperature = write_temperatures(temp_dir.path(), &[2011], scenario_temperature);
    let missing = temp_dir.path().join("missing.csv");

    let result = OutagePipeline::new(missing.clone(), temperature, None);

    match result.unwrap_err() {
        OutageError::SourceNotFound { path } => assert_eq!(path, missing),
        other => panic!("Expected SourceNotFound error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_nonexistent_temperature_source() {
    let temp_dir = TempDir::new().unwrap();
    let events = write_events(temp_dir.path(), &scenario_events());
    let missing = temp_dir.path().join("missing.txt");

    let err = OutagePipeline::new(events, missing, None).unwrap_err();
    assert!(matches!(err, OutageError::SourceNotFound { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_extra_state_code_is_count_mismatch() {
    let temp_dir = TempDir::new().unwrap();
    let events = write_events(temp_dir.path(), &scenario_events());
    let temperature =
        write_temperature_lines(temp_dir.path(), &[2011], 49, &scenario_temperature, false);

    let err = OutagePipeline::new(events, temperature, Some(temp_dir.path().join("o.csv")))
        .unwrap()
        .with_progress(false)
        .run()
        .await
        .unwrap_err();

    match &err {
        OutageError::ReconciliationCountMismatch { codes, names } => {
            assert_eq!(*codes, 49);
            assert_eq!(*names, 48);
        }
        other => panic!("Expected ReconciliationCountMismatch, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 2);
    assert!(!temp_dir.path().join("o.csv").exists());
}

#[tokio::test]
async fn test_unknown_code_in_explicit_mapping() {
    let temp_dir = TempDir::new().unwrap();
    let events = write_events(temp_dir.path(), &scenario_events());
    let temperature =
        write_temperature_lines(temp_dir.path(), &[2011], 2, &scenario_temperature, false);
    let mapping = StateNameMapping::parse("001002,Alabama\n999002,Nowhere\n").unwrap();

    let err = OutagePipeline::new(events, temperature, Some(temp_dir.path().join("o.csv")))
        .unwrap()
        .with_state_mapping(mapping)
        .with_progress(false)
        .run()
        .await
        .unwrap_err();

    match &err {
        OutageError::UnknownStateCode { code } => assert_eq!(code, "002002"),
        other => panic!("Expected UnknownStateCode, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_malformed_temperature_line() {
    let temp_dir = TempDir::new().unwrap();
    let events = write_events(temp_dir.path(), &scenario_events());
    let temperature =
        write_temperature_lines(temp_dir.path(), &[2011], 48, &scenario_temperature, false);
    let mut content = fs::read_to_string(&temperature).unwrap();
    content.push_str("0490022011   40.10   41.20   50.00\n");
    fs::write(&temperature, content).unwrap();

    let err = OutagePipeline::new(events, temperature, Some(temp_dir.path().join("o.csv")))
        .unwrap()
        .with_progress(false)
        .run()
        .await
        .unwrap_err();

    match &err {
        OutageError::SchemaMismatch { found, detail, .. } => {
            assert_eq!(found, "4 cells");
            assert_eq!(detail, "line 49");
        }
        other => panic!("Expected SchemaMismatch, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_event_source_with_wrong_width() {
    let temp_dir = TempDir::new().unwrap();
    let events = write_events_with_width(temp_dir.path(), &scenario_events(), 40);
    let temperature = write_temperatures(temp_dir.path(), &[2011], scenario_temperature);

    let err = OutagePipeline::new(events, temperature, Some(temp_dir.path().join("o.csv")))
        .unwrap()
        .with_progress(false)
        .run()
        .await
        .unwrap_err();

    match &err {
        OutageError::SchemaMismatch {
            expected, found, ..
        } => {
            assert_eq!(expected, "56 columns");
            assert_eq!(found, "40 columns");
        }
        other => panic!("Expected SchemaMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_narrow_event_source_accepted_without_width_check() {
    let temp_dir = TempDir::new().unwrap();
    let events = write_events_with_width(temp_dir.path(), &scenario_events(), 20);
    let temperature = write_temperatures(temp_dir.path(), &[2011, 2012], scenario_temperature);

    let config = crate::config::PipelineConfig::default().without_event_width_check();
    let outcome = OutagePipeline::new(events, temperature, Some(temp_dir.path().join("o.csv")))
        .unwrap()
        .with_config(config)
        .with_progress(false)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.stats.event_rows, 7);
}

#[tokio::test]
async fn test_invalid_configuration_rejected_before_loading() {
    let temp_dir = TempDir::new().unwrap();
    let events = write_events(temp_dir.path(), &scenario_events());
    let temperature = write_temperatures(temp_dir.path(), &[2011], scenario_temperature);

    let mut config = crate::config::PipelineConfig::default();
    config.features.hot_min_f = 10.0;

    let err = OutagePipeline::new(events, temperature, Some(temp_dir.path().join("o.csv")))
        .unwrap()
        .with_config(config)
        .with_progress(false)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, OutageError::Configuration { .. }));
}
