//! Prometheus exposition of the live request metrics

use metrics::{Unit, describe_counter, describe_histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

pub const REQUESTS_TOTAL: &str = "loadgen_requests_total";
pub const REQUEST_FAILURES_TOTAL: &str = "loadgen_request_failures_total";
pub const REQUEST_DURATION_SECONDS: &str = "loadgen_request_duration_seconds";

/// Bucket bounds in seconds, spanning the profiles' p95/p99 limits
const LATENCY_BUCKETS: [f64; 12] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Builder with the latency histogram buckets configured
pub fn prometheus_builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
        &LATENCY_BUCKETS,
    )
}

/// Register help text for every metric the sink emits
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, Unit::Count, "Requests issued by virtual users");
    describe_counter!(
        REQUEST_FAILURES_TOTAL,
        Unit::Count,
        "Requests that errored or returned an unexpected status"
    );
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of requests that received a response"
    );
}

/// Install the global Prometheus recorder.
///
/// With `listen` set, a scrape endpoint is served on that address for the
/// whole run and no handle is returned. Without it, the returned handle
/// renders the metrics on demand.
pub fn install_recorder(
    listen: Option<SocketAddr>,
) -> Result<Option<PrometheusHandle>, BuildError> {
    let builder = prometheus_builder()?;
    let handle = match listen {
        Some(addr) => {
            builder.with_http_listener(addr).install()?;
            None
        }
        None => Some(builder.install_recorder()?),
    };
    describe_metrics();
    Ok(handle)
}
