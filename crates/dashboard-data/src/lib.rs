//! Data loading and dashboard assembly for the driver dashboard.
//!
//! Reads the trip and payment CSV exports into raw rows, normalizes them
//! through `dashboard-core`, and runs the pipeline that produces the
//! serializable [`analysis::DashboardReport`].

pub mod analysis;
pub mod reader;

pub use dashboard_core as core;
