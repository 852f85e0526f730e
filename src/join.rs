//! Left join of outage events against monthly state temperatures.

use crate::constants::columns;
use crate::error::Result;
use polars::prelude::*;
use tracing::debug;

const ROW_INDEX: &str = "__event_row";

/// Row counts of a join
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinSummary {
    pub matched: usize,
    pub unmatched: usize,
}

/// Join events to temperatures on `(state, year, month)`
///
/// Every event row is kept in its original order; events without a
/// temperature row carry a null `avg_temp_f`. The temperature table is
/// expected to have unique keys, so the output has exactly as many rows
/// as `events`.
pub fn join_temperatures(
    events: DataFrame,
    temperatures: DataFrame,
) -> Result<(DataFrame, JoinSummary)> {
    let event_rows = events.height();
    let keys = || {
        [
            col(columns::STATE),
            col(columns::YEAR),
            col(columns::MONTH),
        ]
    };

    let right = temperatures.lazy().select([
        col(columns::STATE).cast(DataType::String),
        col(columns::YEAR).cast(DataType::Int32),
        col(columns::MONTH).cast(DataType::Int32),
        col(columns::AVG_TEMP_F).cast(DataType::Float64),
    ]);

    let joined = events
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .join(right, keys(), keys(), JoinArgs::new(JoinType::Left))
        .sort_by_exprs([col(ROW_INDEX)], SortMultipleOptions::default())
        .collect()?
        .drop(ROW_INDEX)?;

    let unmatched = joined.column(columns::AVG_TEMP_F)?.null_count();
    let summary = JoinSummary {
        matched: joined.height() - unmatched,
        unmatched,
    };

    debug_assert_eq!(joined.height(), event_rows);
    debug!(
        "Joined {} events: {} with temperature, {} without",
        event_rows, summary.matched, summary.unmatched
    );

    Ok((joined, summary))
}
