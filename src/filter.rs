//! Row filter producing the final analysis table.

use crate::config::FilterConfig;
use crate::constants::columns;
use crate::error::Result;
use polars::prelude::*;
use tracing::{debug, info};

/// AND-combined inclusion predicates over the featured table
#[derive(Debug, Clone)]
pub struct RowFilter {
    config: FilterConfig,
}

impl Default for RowFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

impl RowFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Duration bound; a null duration compares as null and is dropped
    fn duration_predicate(&self) -> Expr {
        col(columns::OUTAGE_DURATION).lt_eq(lit(self.config.max_duration_minutes))
    }

    /// Null cause values are not members of the excluded set and survive
    fn not_in(column: &str, excluded: &[String]) -> Expr {
        excluded
            .iter()
            .map(|value| col(column).neq_missing(lit(value.as_str())))
            .reduce(|acc, pred| acc.and(pred))
            .unwrap_or_else(|| lit(true))
    }

    /// The combined predicate
    pub fn predicate(&self) -> Expr {
        self.duration_predicate()
            .and(Self::not_in(
                columns::CAUSE_DETAIL,
                &self.config.excluded_cause_details,
            ))
            .and(Self::not_in(
                columns::CAUSE_CATEGORY,
                &self.config.excluded_cause_categories,
            ))
    }

    /// Apply the filter; an exhausted table comes back empty with its schema intact
    pub fn apply(&self, df: DataFrame) -> Result<DataFrame> {
        let input_rows = df.height();
        let filtered = df.lazy().filter(self.predicate()).collect()?;

        debug!(
            "Row filter: {} -> {} rows (duration <= {}, {} details and {} categories excluded)",
            input_rows,
            filtered.height(),
            self.config.max_duration_minutes,
            self.config.excluded_cause_details.len(),
            self.config.excluded_cause_categories.len()
        );

        if filtered.height() == 0 {
            info!(
                "Row filter removed all {} rows; the analysis table is empty",
                input_rows
            );
        }

        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn featured() -> DataFrame {
        df!(
            "obs_id" => [1i64, 2, 3, 4, 5, 6, 7, 8],
            "cause_category" => [
                Some("severe weather"),
                Some("severe weather"),
                Some("intentional attack"),
                Some("equipment failure"),
                Some("severe weather"),
                None,
                Some("system operability disruption"),
                Some("public appeal"),
            ],
            "cause_detail" => [
                Some("heatwave"),
                Some("earthquake"),
                Some("vandalism"),
                None,
                Some("thunderstorm"),
                Some("heatwave"),
                None,
                Some("snow/ice storm"),
            ],
            "outage_duration_minutes" => [
                Some(3000.0),
                Some(10.0),
                Some(10.0),
                Some(30000.0),
                Some(30001.0),
                Some(42.0),
                Some(10.0),
                None,
            ]
        )
        .unwrap()
    }

    fn kept_ids(df: &DataFrame) -> Vec<i64> {
        df.column("obs_id")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    #[test]
    fn test_default_predicates() {
        let filtered = RowFilter::default().apply(featured()).unwrap();
        // 2 earthquake, 3 attack, 5 too long, 7 operability, 8 null duration + snow/ice
        assert_eq!(kept_ids(&filtered), vec![1, 4, 6]);
    }

    #[test]
    fn test_filter_exhaustion_returns_empty_table() {
        let config = FilterConfig {
            max_duration_minutes: 1.0,
            ..Default::default()
        };
        let filtered = RowFilter::new(config).apply(featured()).unwrap();

        assert_eq!(filtered.height(), 0);
        assert_eq!(filtered.width(), 4);
    }

    #[test]
    fn test_empty_exclusion_sets() {
        let config = FilterConfig {
            max_duration_minutes: 30_000.0,
            excluded_cause_details: vec![],
            excluded_cause_categories: vec![],
        };
        let filtered = RowFilter::new(config).apply(featured()).unwrap();
        assert_eq!(kept_ids(&filtered), vec![1, 2, 3, 4, 6, 7]);
    }
}
