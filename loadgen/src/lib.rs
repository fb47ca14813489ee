//! Kronos Load Generator Library
//!
//! Drives staged synthetic traffic against the Kronos world-clock service
//! and evaluates pass/fail thresholds over the collected outcomes. The
//! binary in `main.rs` is a thin wrapper; integration tests use the library
//! directly.

pub mod config;
pub mod profile;
pub mod runner;
pub mod scenario;
pub mod stats;
pub mod transport;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use profile::{Profile, ProfileCatalog, ProfileError};
pub use runner::{RunOptions, RunState, Runner};
pub use scenario::{Scenario, ScenarioRouter};
pub use stats::{MetricsSink, Report};
pub use transport::{HttpTransport, RequestError, Transport};
