//! Query execution for querychat.
//!
//! This module isolates backend execution and the visualization repair
//! from the orchestrator.

pub mod executor;

pub use executor::{QueryExecutor, QueryOutcome};
