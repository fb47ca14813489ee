//! Exact latency statistics over retained samples
//!
//! All samples are kept and sorted once per query. Percentiles use the
//! nearest-rank index `round(p/100 * (n-1))`. Memory grows with run size,
//! which stays manageable at load-test scale.

use std::time::Duration;

use crate::profile::Statistic;

/// Sorted latency samples
#[derive(Debug, Default, Clone)]
pub struct LatencyStats {
    sorted: Vec<Duration>,
}

impl LatencyStats {
    pub fn from_samples(mut samples: Vec<Duration>) -> Self {
        samples.sort_unstable();
        Self { sorted: samples }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Calculate percentile (0-100)
    pub fn percentile(&self, p: f64) -> Option<Duration> {
        if self.sorted.is_empty() {
            return None;
        }
        let p = p.clamp(0.0, 100.0);
        let idx = ((p / 100.0) * (self.sorted.len() - 1) as f64).round() as usize;
        Some(self.sorted[idx.min(self.sorted.len() - 1)])
    }

    pub fn p50(&self) -> Option<Duration> {
        self.percentile(50.0)
    }

    pub fn p95(&self) -> Option<Duration> {
        self.percentile(95.0)
    }

    pub fn p99(&self) -> Option<Duration> {
        self.percentile(99.0)
    }

    pub fn min(&self) -> Option<Duration> {
        self.sorted.first().copied()
    }

    pub fn max(&self) -> Option<Duration> {
        self.sorted.last().copied()
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.sorted.is_empty() {
            return None;
        }
        let total: Duration = self.sorted.iter().sum();
        Some(total / self.sorted.len() as u32)
    }

    /// Value of a latency statistic in milliseconds
    pub fn statistic_ms(&self, statistic: Statistic) -> Option<f64> {
        let value = match statistic {
            Statistic::Percentile(p) => self.percentile(p),
            Statistic::Avg => self.mean(),
            Statistic::Min => self.min(),
            Statistic::Med => self.p50(),
            Statistic::Max => self.max(),
            Statistic::Rate => None,
        };
        value.map(as_millis_f64)
    }
}

pub fn as_millis_f64(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}
