//! Outcome collection and end-of-run reporting
//!
//! This module provides:
//! - `MetricsSink` accumulating `RequestOutcome`s from all virtual users
//! - `LatencyStats` exact percentile computation
//! - `Report` with JSON and text renderings
//! - Prometheus recorder installation for the live `loadgen_*` metrics

mod exporter;
mod latency;
mod report;
mod sink;

pub use exporter::{
    REQUEST_DURATION_SECONDS, REQUEST_FAILURES_TOTAL, REQUESTS_TOTAL, describe_metrics,
    install_recorder, prometheus_builder,
};
pub use latency::LatencyStats;
pub use report::{LatencySummary, Report, ScenarioSummary};
pub use sink::{MetricsSink, RequestOutcome};
