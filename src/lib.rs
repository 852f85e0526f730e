//! Outage/temperature reconciliation
//!
//! Joins major U.S. power outage events with NOAA state monthly average
//! temperatures and derives temperature features for outage analysis.
//!
//! The pipeline stages are:
//! - [`loader`]: read the outage spreadsheet export and the NOAA text file
//! - [`schema`]: project raw event columns onto canonical names and types
//! - [`reconcile`]: decode NOAA identifiers and reshape temperatures to long form
//! - [`join`]: left join events to temperatures on state, year and month
//! - [`features`]: temperature category and the `is_hot` flag
//! - [`filter`]: duration bound and cause exclusions
//! - [`analysis`]: regression and t-test summary of the final table
//!
//! [`processor::OutagePipeline`] runs them in order.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod features;
pub mod filter;
pub mod join;
pub mod loader;
pub mod models;
pub mod processor;
pub mod reconcile;
pub mod schema;

pub use config::PipelineConfig;
pub use error::{OutageError, Result};
pub use processor::{OutagePipeline, PipelineOutcome};
pub use reconcile::StateNameMapping;
