//! Derived temperature features.
//!
//! `temp_category` buckets the monthly average into cold / neutral / hot
//! and `is_hot` flags months at or above a threshold. The threshold is a
//! parameter: the pipeline computes it once as the mean temperature of
//! the joined, unfiltered table and hands it to [`FeatureDeriver::derive`].

use crate::config::FeatureConfig;
use crate::constants::columns;
use crate::error::Result;
use crate::models::TempCategory;
use polars::prelude::*;
use tracing::{debug, info};

/// Threshold used for the `is_hot` flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotThreshold(pub Option<f64>);

impl HotThreshold {
    /// Mean of `avg_temp_f` over the joined table, ignoring nulls
    ///
    /// `None` when no row has a temperature.
    pub fn from_joined(joined: &DataFrame) -> Result<Self> {
        let mean = joined.column(columns::AVG_TEMP_F)?.f64()?.mean();
        info!(
            "is_hot threshold: {}",
            mean.map(|m| format!("{:.2}°F", m))
                .unwrap_or_else(|| "undefined (no temperature matches)".to_string())
        );
        Ok(HotThreshold(mean))
    }

    /// A fixed threshold
    pub fn fixed(value: f64) -> Self {
        HotThreshold(Some(value))
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }
}

/// Adds `temp_category` and `is_hot` to the joined table
#[derive(Debug, Clone)]
pub struct FeatureDeriver {
    cold_max_f: f64,
    hot_min_f: f64,
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::new(&FeatureConfig::default())
    }
}

impl FeatureDeriver {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            cold_max_f: config.cold_max_f,
            hot_min_f: config.hot_min_f,
        }
    }

    /// Expression computing the temperature category
    ///
    /// Hot is evaluated first, so a value on the cold bound is cold and
    /// anything strictly between the bounds is neutral.
    pub fn category_expr(&self) -> Expr {
        let temp = || col(columns::AVG_TEMP_F);
        when(temp().is_null())
            .then(lit(NULL).cast(DataType::String))
            .when(temp().gt_eq(lit(self.hot_min_f)))
            .then(lit(TempCategory::Hot.as_str()))
            .when(temp().lt_eq(lit(self.cold_max_f)))
            .then(lit(TempCategory::Cold.as_str()))
            .otherwise(lit(TempCategory::Neutral.as_str()))
            .alias(columns::TEMP_CATEGORY)
    }

    /// Expression computing the 0/1 hot flag; null where the temperature is null
    pub fn is_hot_expr(&self, threshold: HotThreshold) -> Expr {
        let temp = || col(columns::AVG_TEMP_F);
        match threshold.value() {
            Some(cutoff) => when(temp().is_null())
                .then(lit(NULL).cast(DataType::Int32))
                .when(temp().gt_eq(lit(cutoff)))
                .then(lit(1i32))
                .otherwise(lit(0i32))
                .alias(columns::IS_HOT),
            None => lit(NULL).cast(DataType::Int32).alias(columns::IS_HOT),
        }
    }

    /// Add both derived columns
    pub fn derive(&self, joined: DataFrame, threshold: HotThreshold) -> Result<DataFrame> {
        let df = joined
            .lazy()
            .with_columns([self.category_expr(), self.is_hot_expr(threshold)])
            .collect()?;

        debug!(
            "Derived features on {} rows (cold <= {}°F, hot >= {}°F, is_hot >= {:?})",
            df.height(),
            self.cold_max_f,
            self.hot_min_f,
            threshold.value()
        );

        Ok(df)
    }
}
