//! End-of-run report: JSON for machines, text summary for humans

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use super::latency::{LatencyStats, as_millis_f64};
use crate::profile::ThresholdResult;

/// Latency statistics in milliseconds (absent when nothing was measured)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub min_ms: Option<f64>,
    pub avg_ms: Option<f64>,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

impl LatencySummary {
    pub fn from_stats(stats: &LatencyStats) -> Self {
        Self {
            min_ms: stats.min().map(as_millis_f64),
            avg_ms: stats.mean().map(as_millis_f64),
            p50_ms: stats.p50().map(as_millis_f64),
            p95_ms: stats.p95().map(as_millis_f64),
            p99_ms: stats.p99().map(as_millis_f64),
            max_ms: stats.max().map(as_millis_f64),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub count: u64,
    pub failures: u64,
}

/// Aggregated results of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub profile: String,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
    pub count: u64,
    pub failures: u64,
    pub failure_rate: f64,
    pub throughput_rps: f64,
    pub latency: LatencySummary,
    pub scenarios: BTreeMap<String, ScenarioSummary>,
    pub thresholds: Vec<ThresholdResult>,
    pub passed: bool,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            profile: String::new(),
            started_at: None,
            duration_secs: 0.0,
            count: 0,
            failures: 0,
            failure_rate: 0.0,
            throughput_rps: 0.0,
            latency: LatencySummary::default(),
            scenarios: BTreeMap::new(),
            thresholds: Vec::new(),
            passed: true,
        }
    }
}

impl Report {
    /// Attach run metadata and derive throughput
    pub fn with_run(mut self, profile: &str, started_at: DateTime<Utc>, elapsed: Duration) -> Self {
        self.profile = profile.to_string();
        self.started_at = Some(started_at);
        self.duration_secs = elapsed.as_secs_f64();
        self.throughput_rps = if self.duration_secs > 0.0 {
            self.count as f64 / self.duration_secs
        } else {
            0.0
        };
        self
    }

    /// Attach threshold results; the report passes only if all of them do
    pub fn with_thresholds(mut self, results: Vec<ThresholdResult>) -> Self {
        self.passed = results.iter().all(|r| r.passed);
        self.thresholds = results;
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
    }

    /// Human-readable summary for stdout
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "═══════════════════════════════════════════════════════════════";

        // Writing into a String cannot fail
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, " LOAD TEST SUMMARY: {}", self.profile);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "   Total Requests: {}", self.count);
        let _ = writeln!(out, "   Failed:         {}", self.failures);
        let _ = writeln!(out, "   Error Rate:     {:.2}%", self.failure_rate * 100.0);
        let _ = writeln!(out, "   Duration:       {:.1}s", self.duration_secs);
        let _ = writeln!(out, "   Throughput:     {:.1} req/s", self.throughput_rps);
        let _ = writeln!(out);
        let _ = writeln!(out, " ─── Latency ─────────────────────────────────────────────────");
        let _ = writeln!(
            out,
            "   min {}  avg {}  p50 {}  p95 {}  p99 {}  max {}",
            fmt_ms(self.latency.min_ms),
            fmt_ms(self.latency.avg_ms),
            fmt_ms(self.latency.p50_ms),
            fmt_ms(self.latency.p95_ms),
            fmt_ms(self.latency.p99_ms),
            fmt_ms(self.latency.max_ms),
        );

        if !self.scenarios.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, " ─── Scenarios ───────────────────────────────────────────────");
            for (name, s) in &self.scenarios {
                let _ = writeln!(
                    out,
                    "   {:14} {:>8} requests {:>6} failed",
                    name, s.count, s.failures
                );
            }
        }

        if !self.thresholds.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, " ─── Thresholds ──────────────────────────────────────────────");
            for t in &self.thresholds {
                let observed = t
                    .observed
                    .map(|v| format!("{:.4}", v))
                    .unwrap_or_else(|| "N/A".to_string());
                let _ = writeln!(
                    out,
                    "   [{}] {} (observed {})",
                    if t.passed { "PASS" } else { "FAIL" },
                    t.threshold,
                    observed
                );
            }
        }

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            " OVERALL: {}",
            if self.passed { "PASS" } else { "FAIL (threshold crossed)" }
        );
        let _ = writeln!(out, "{}", rule);
        out
    }
}

fn fmt_ms(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}ms", v),
        None => "N/A".to_string(),
    }
}
