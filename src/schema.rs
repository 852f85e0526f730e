//! Schema normalization for the raw outage table.
//!
//! Maps source labels to canonical names by explicit named selection,
//! casts each retained column to its canonical type, assembles the start
//! and restoration timestamps as nanosecond datetimes and drops every pricing, economic and
//! demographic covariate. Row order and count are preserved.

use crate::constants::{columns, event_columns as raw};
use crate::error::{OutageError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use tracing::debug;

const START_DATE_TMP: &str = "__start_date";
const START_TIME_TMP: &str = "__start_time";
const RESTORATION_DATE_TMP: &str = "__restoration_date";
const RESTORATION_TIME_TMP: &str = "__restoration_time";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%A, %B %d, %Y", "%B %d, %Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// A raw event column retained under a canonical name
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub raw: &'static str,
    pub canonical: &'static str,
    pub dtype: DataType,
}

impl FieldMapping {
    fn new((raw, canonical): (&'static str, &'static str), dtype: DataType) -> Self {
        Self {
            raw,
            canonical,
            dtype,
        }
    }
}

/// Normalizer for the outage event source
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    fields: Vec<FieldMapping>,
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaNormalizer {
    pub fn new() -> Self {
        Self {
            fields: vec![
                FieldMapping::new(raw::OBS, DataType::Int64),
                FieldMapping::new(raw::YEAR, DataType::Int32),
                FieldMapping::new(raw::MONTH, DataType::Int32),
                FieldMapping::new(raw::STATE, DataType::String),
                FieldMapping::new(raw::POSTAL_CODE, DataType::String),
                FieldMapping::new(raw::NERC_REGION, DataType::String),
                FieldMapping::new(raw::CLIMATE_REGION, DataType::String),
                FieldMapping::new(raw::ANOMALY_LEVEL, DataType::Float64),
                FieldMapping::new(raw::CLIMATE_CATEGORY, DataType::String),
                FieldMapping::new(raw::CAUSE_CATEGORY, DataType::String),
                FieldMapping::new(raw::CAUSE_DETAIL, DataType::String),
                FieldMapping::new(raw::HURRICANE_NAMES, DataType::String),
                FieldMapping::new(raw::DURATION, DataType::Float64),
                FieldMapping::new(raw::DEMAND_LOSS, DataType::Float64),
                FieldMapping::new(raw::CUSTOMERS_AFFECTED, DataType::Float64),
            ],
        }
    }

    /// Raw column names the event source must provide
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut required: Vec<&'static str> = self.fields.iter().map(|f| f.raw).collect();
        required.extend([
            raw::START_DATE,
            raw::START_TIME,
            raw::RESTORATION_DATE,
            raw::RESTORATION_TIME,
        ]);
        required
    }

    /// Canonical event columns in output order
    pub fn event_columns() -> &'static [&'static str] {
        &columns::OUTPUT[..columns::OUTPUT.len() - 3]
    }

    /// Project the raw event table onto the canonical schema
    pub fn normalize_events(&self, raw_df: DataFrame) -> Result<DataFrame> {
        self.check_required_columns(&raw_df)?;
        let input_rows = raw_df.height();

        let mut projection: Vec<Expr> = self
            .fields
            .iter()
            .map(|f| col(f.raw).cast(f.dtype.clone()).alias(f.canonical))
            .collect();
        projection.extend([
            col(raw::START_DATE)
                .cast(DataType::String)
                .alias(START_DATE_TMP),
            col(raw::START_TIME)
                .cast(DataType::String)
                .alias(START_TIME_TMP),
            col(raw::RESTORATION_DATE)
                .cast(DataType::String)
                .alias(RESTORATION_DATE_TMP),
            col(raw::RESTORATION_TIME)
                .cast(DataType::String)
                .alias(RESTORATION_TIME_TMP),
        ]);

        let mut df = raw_df.lazy().select(projection).collect()?;

        let start = timestamp_column(&df, START_DATE_TMP, START_TIME_TMP, columns::OUTAGE_START)?;
        let restoration = timestamp_column(
            &df,
            RESTORATION_DATE_TMP,
            RESTORATION_TIME_TMP,
            columns::OUTAGE_RESTORATION,
        )?;
        df.with_column(start)?;
        df.with_column(restoration)?;

        let df = df.select(Self::event_columns().iter().copied())?;

        debug_assert_eq!(df.height(), input_rows);
        debug!(
            "Normalized event table: {} rows, {} -> {} columns",
            df.height(),
            self.required_columns().len(),
            df.width()
        );

        Ok(df)
    }

    fn check_required_columns(&self, df: &DataFrame) -> Result<()> {
        let present: Vec<&str> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect();

        let missing: Vec<&str> = self
            .required_columns()
            .into_iter()
            .filter(|name| !present.contains(name))
            .collect();

        if !missing.is_empty() {
            return Err(OutageError::schema_mismatch(
                "event source",
                format!("{} required columns", self.required_columns().len()),
                format!("{} missing", missing.len()),
                format!("missing: {}", missing.join(", ")),
            ));
        }

        Ok(())
    }
}

/// Combine a date cell and a time cell into one timestamp
///
/// Returns None when either part is absent or unparseable.
pub fn assemble_timestamp(date: Option<&str>, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = parse_date(date?.trim())?;
    let time = parse_time(time?.trim())?;
    Some(NaiveDateTime::new(date, time))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    // Spreadsheet exports sometimes carry a midnight time on date cells
    let value = value.strip_suffix(" 00:00:00").unwrap_or(value);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}

fn timestamp_column(df: &DataFrame, date_col: &str, time_col: &str, name: &str) -> Result<Column> {
    let dates = df.column(date_col)?.str()?;
    let times = df.column(time_col)?.str()?;

    let values: Vec<Option<NaiveDateTime>> = dates
        .into_iter()
        .zip(times)
        .map(|(date, time)| assemble_timestamp(date, time))
        .collect();

    Ok(Column::new(name.into(), values)
        .cast(&DataType::Datetime(TimeUnit::Nanoseconds, None))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: (i32, u32, u32), time: (u32, u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(time.0, time.1, time.2)
            .unwrap()
    }

    fn timestamps(df: &DataFrame, name: &str) -> Vec<Option<NaiveDateTime>> {
        df.column(name)
            .unwrap()
            .datetime()
            .unwrap()
            .as_datetime_iter()
            .collect()
    }

    fn raw_events() -> DataFrame {
        let mut frame_columns = vec![
            Column::new("variables".into(), vec![None::<&str>, None]),
            Column::new("OBS".into(), vec![1i64, 2]),
            Column::new("YEAR".into(), vec![2011i64, 2014]),
            Column::new("MONTH".into(), vec![Some(7i64), None]),
            Column::new("U.S._STATE".into(), vec!["Minnesota", "Texas"]),
            Column::new("POSTAL.CODE".into(), vec!["MN", "TX"]),
            Column::new("NERC.REGION".into(), vec!["MRO", "TRE"]),
            Column::new("CLIMATE.REGION".into(), vec!["East North Central", "South"]),
            Column::new("ANOMALY.LEVEL".into(), vec![-0.3, 0.2]),
            Column::new("CLIMATE.CATEGORY".into(), vec!["normal", "warm"]),
            Column::new("OUTAGE.START.DATE".into(), vec![Some("2011-07-01"), None]),
            Column::new("OUTAGE.START.TIME".into(), vec![Some("17:00:00"), None]),
            Column::new("OUTAGE.RESTORATION.DATE".into(), vec!["2011-07-03", "2014-08-01"]),
            Column::new("OUTAGE.RESTORATION.TIME".into(), vec!["8:00:00 PM", "garbage"]),
            Column::new("CAUSE.CATEGORY".into(), vec!["severe weather", "public appeal"]),
            Column::new("CAUSE.CATEGORY.DETAIL".into(), vec![None, Some("heatwave")]),
            Column::new("HURRICANE.NAMES".into(), vec![None::<&str>, None]),
            Column::new("OUTAGE.DURATION".into(), vec![Some(3060i64), None]),
            Column::new("DEMAND.LOSS.MW".into(), vec![None, Some(250i64)]),
            Column::new("CUSTOMERS.AFFECTED".into(), vec![70000i64, 1200]),
        ];
        // Covariates that must be dropped
        frame_columns.push(Column::new("RES.PRICE".into(), vec![11.6, 10.1]));
        frame_columns.push(Column::new("POPULATION".into(), vec![5348119i64, 26956958]));
        DataFrame::new(frame_columns).unwrap()
    }

    #[test]
    fn test_normalize_projects_canonical_columns() {
        let df = SchemaNormalizer::new().normalize_events(raw_events()).unwrap();

        assert_eq!(df.height(), 2);
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, SchemaNormalizer::event_columns());
        assert!(df.column("RES.PRICE").is_err());
        assert!(df.column("POPULATION").is_err());

        assert_eq!(df.column("year").unwrap().dtype(), &DataType::Int32);
        assert_eq!(
            df.column("outage_duration_minutes").unwrap().dtype(),
            &DataType::Float64
        );
        assert_eq!(df.column("month").unwrap().null_count(), 1);
    }

    #[test]
    fn test_normalize_assembles_timestamps() {
        let df = SchemaNormalizer::new().normalize_events(raw_events()).unwrap();

        for name in ["outage_start", "outage_restoration"] {
            assert_eq!(
                df.column(name).unwrap().dtype(),
                &DataType::Datetime(TimeUnit::Nanoseconds, None)
            );
        }
        assert_eq!(
            timestamps(&df, "outage_start"),
            vec![Some(at((2011, 7, 1), (17, 0, 0))), None]
        );
        assert_eq!(
            timestamps(&df, "outage_restoration"),
            vec![Some(at((2011, 7, 3), (20, 0, 0))), None]
        );
    }

    #[test]
    fn test_missing_columns_are_schema_mismatch() {
        let df = raw_events().drop("CAUSE.CATEGORY.DETAIL").unwrap();

        match SchemaNormalizer::new().normalize_events(df) {
            Err(OutageError::SchemaMismatch { detail, .. }) => {
                assert!(detail.contains("CAUSE.CATEGORY.DETAIL"));
            }
            other => panic!("Expected SchemaMismatch, got {:?}", other.map(|df| df.shape())),
        }
    }

    #[test]
    fn test_assemble_timestamp_formats() {
        let five_pm = Some(at((2011, 7, 1), (17, 0, 0)));
        assert_eq!(
            assemble_timestamp(Some("Friday, July 01, 2011"), Some("5:00:00 PM")),
            five_pm
        );
        assert_eq!(assemble_timestamp(Some("7/1/2011"), Some("17:00")), five_pm);
        assert_eq!(
            assemble_timestamp(Some("2011-07-01 00:00:00"), Some("06:30:00")),
            Some(at((2011, 7, 1), (6, 30, 0)))
        );
        assert_eq!(assemble_timestamp(Some("2011-07-01"), None), None);
        assert_eq!(assemble_timestamp(Some("not a date"), Some("17:00")), None);
    }
}
