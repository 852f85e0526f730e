//! Integration tests for the processor module
//!
//! Runs the complete pipeline over generated outage and temperature sources.

pub mod error_handling;
pub mod properties;
