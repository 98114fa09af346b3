//! Filtering and aggregation engine for the driver dashboard.
//!
//! Normalizes raw trip and payment rows into typed records, filters them by
//! date range and weekday, and computes grouped aggregates and rankings.
//! Every operation is a pure function of its inputs.

pub mod aggregator;
pub mod domain;
pub mod error;
pub mod filter;
pub mod formatting;
pub mod models;
pub mod normalizer;
pub mod settings;

pub use error::{DashboardError, Result};
