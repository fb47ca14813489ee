//! Thread-safe accumulator for request outcomes

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use super::exporter::{REQUEST_DURATION_SECONDS, REQUEST_FAILURES_TOTAL, REQUESTS_TOTAL};
use super::latency::{LatencyStats, as_millis_f64};
use super::report::{LatencySummary, Report, ScenarioSummary};
use crate::profile::{Metric, Statistic, Threshold, ThresholdResult};
use crate::scenario::Scenario;
use crate::transport::RequestError;

/// Result of a single virtual-user request
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub timestamp: DateTime<Utc>,
    pub scenario: Scenario,
    /// Response status; absent when no response arrived
    pub status: Option<u16>,
    pub latency: Duration,
    pub passed: bool,
    pub error: Option<String>,
}

impl RequestOutcome {
    /// Outcome for a request that produced a response
    pub fn response(scenario: Scenario, status: u16, latency: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            scenario,
            status: Some(status),
            latency,
            passed: scenario.expects(status),
            error: None,
        }
    }

    /// Outcome for a request that failed before a response arrived
    pub fn failure(scenario: Scenario, error: &RequestError, latency: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            scenario,
            status: None,
            latency,
            passed: false,
            error: Some(error.to_string()),
        }
    }
}

/// Append-only outcome store shared by all virtual users
///
/// Latency statistics cover requests that received a response; transport
/// failures count toward the failure rate only.
#[derive(Debug, Default)]
pub struct MetricsSink {
    outcomes: Mutex<Vec<RequestOutcome>>,
}

impl MetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RequestOutcome>> {
        // An outcome push cannot leave the vector inconsistent, so a poisoned
        // lock is still safe to use
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, outcome: RequestOutcome) {
        let scenario = outcome.scenario.name();
        counter!(REQUESTS_TOTAL, "scenario" => scenario).increment(1);
        if !outcome.passed {
            counter!(REQUEST_FAILURES_TOTAL, "scenario" => scenario).increment(1);
        }
        if outcome.status.is_some() {
            histogram!(REQUEST_DURATION_SECONDS, "scenario" => scenario)
                .record(outcome.latency);
        }

        match (&outcome.status, &outcome.error) {
            (Some(status), _) => debug!(
                "[{}] {} -> {} ({:.1}ms)",
                if outcome.passed { "ok" } else { "FAIL" },
                scenario,
                status,
                as_millis_f64(outcome.latency)
            ),
            (None, error) => debug!(
                "[FAIL] {} -> {} ({:.1}ms)",
                scenario,
                error.as_deref().unwrap_or("no response"),
                as_millis_f64(outcome.latency)
            ),
        }

        self.lock().push(outcome);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn latency_stats(&self) -> LatencyStats {
        let samples = self
            .lock()
            .iter()
            .filter(|o| o.status.is_some())
            .map(|o| o.latency)
            .collect();
        LatencyStats::from_samples(samples)
    }

    /// (count, failures, failure rate); the rate is 0.0 with no outcomes
    fn failure_counts(&self) -> (u64, u64, f64) {
        let outcomes = self.lock();
        let count = outcomes.len() as u64;
        let failures = outcomes.iter().filter(|o| !o.passed).count() as u64;
        let rate = if count > 0 {
            failures as f64 / count as f64
        } else {
            0.0
        };
        (count, failures, rate)
    }

    /// Aggregate everything recorded so far
    pub fn summarize(&self) -> Report {
        let (count, failures, failure_rate) = self.failure_counts();
        let stats = self.latency_stats();

        let mut scenarios: BTreeMap<String, ScenarioSummary> = BTreeMap::new();
        for outcome in self.lock().iter() {
            let entry = scenarios
                .entry(outcome.scenario.name().to_string())
                .or_default();
            entry.count += 1;
            if !outcome.passed {
                entry.failures += 1;
            }
        }

        Report {
            count,
            failures,
            failure_rate,
            latency: LatencySummary::from_stats(&stats),
            scenarios,
            ..Report::default()
        }
    }

    /// Check each threshold against the recorded outcomes
    ///
    /// Latency thresholds pass when there are no latency samples.
    pub fn evaluate(&self, thresholds: &[Threshold]) -> Vec<ThresholdResult> {
        let (_, _, failure_rate) = self.failure_counts();
        let stats = self.latency_stats();

        thresholds
            .iter()
            .map(|threshold| {
                let observed = match (threshold.metric, threshold.statistic) {
                    (Metric::HttpReqFailed, _) => Some(failure_rate),
                    (Metric::HttpReqDuration, statistic) => stats.statistic_ms(statistic),
                };
                let passed = match observed {
                    Some(value) => threshold.check(value),
                    None => threshold.statistic != Statistic::Rate,
                };
                ThresholdResult {
                    threshold: threshold.to_string(),
                    observed,
                    passed,
                }
            })
            .collect()
    }
}
