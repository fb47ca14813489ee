//! Pass/fail thresholds evaluated against aggregated run metrics
//!
//! Thresholds are written in the expression form load-testing tools commonly
//! use, e.g. `p(95)<500` on `http_req_duration` or `rate<0.01` on
//! `http_req_failed`. Latency bounds are in milliseconds.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::ProfileError;

/// Aggregated metric a threshold applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Request latency in milliseconds
    HttpReqDuration,
    /// Fraction of requests whose outcome failed
    HttpReqFailed,
}

impl Metric {
    pub fn parse(name: &str) -> Result<Self, ProfileError> {
        match name {
            "http_req_duration" | "latency" => Ok(Metric::HttpReqDuration),
            "http_req_failed" | "errors" => Ok(Metric::HttpReqFailed),
            other => Err(ProfileError::InvalidThreshold(format!(
                "unknown metric '{}'",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::HttpReqDuration => "http_req_duration",
            Metric::HttpReqFailed => "http_req_failed",
        }
    }
}

/// Statistic computed over a metric's samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Statistic {
    Percentile(f64),
    Avg,
    Min,
    Med,
    Max,
    Rate,
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Percentile(p) => write!(f, "p({})", p),
            Statistic::Avg => f.write_str("avg"),
            Statistic::Min => f.write_str("min"),
            Statistic::Med => f.write_str("med"),
            Statistic::Max => f.write_str("max"),
            Statistic::Rate => f.write_str("rate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
}

impl Comparator {
    pub fn holds(&self, value: f64, bound: f64) -> bool {
        match self {
            Comparator::Lt => value < bound,
            Comparator::Le => value <= bound,
            Comparator::Gt => value > bound,
            Comparator::Ge => value >= bound,
            Comparator::Eq => value == bound,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Eq => "==",
        }
    }
}

/// A single bound on an aggregated metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub metric: Metric,
    pub statistic: Statistic,
    pub comparator: Comparator,
    pub bound: f64,
}

impl Threshold {
    /// Parse an expression such as `p(95)<500` for the given metric name
    pub fn parse(metric: &str, expr: &str) -> Result<Self, ProfileError> {
        let metric = Metric::parse(metric)?;
        let expr: String = expr.chars().filter(|c| !c.is_whitespace()).collect();

        // Two-character operators must be tried before their one-character prefixes
        let (op_idx, comparator, op_len) = [
            ("<=", Comparator::Le),
            (">=", Comparator::Ge),
            ("==", Comparator::Eq),
            ("<", Comparator::Lt),
            (">", Comparator::Gt),
        ]
        .iter()
        .find_map(|(sym, cmp)| expr.find(sym).map(|idx| (idx, *cmp, sym.len())))
        .ok_or_else(|| ProfileError::InvalidThreshold(format!("missing comparator in '{}'", expr)))?;

        let stat = &expr[..op_idx];
        let bound_str = &expr[op_idx + op_len..];

        let statistic = parse_statistic(stat)
            .ok_or_else(|| ProfileError::InvalidThreshold(format!("unknown statistic '{}'", stat)))?;
        let bound: f64 = bound_str
            .parse()
            .ok()
            .filter(|b: &f64| b.is_finite())
            .ok_or_else(|| ProfileError::InvalidThreshold(format!("invalid bound '{}'", bound_str)))?;

        let valid = match metric {
            Metric::HttpReqFailed => statistic == Statistic::Rate,
            Metric::HttpReqDuration => statistic != Statistic::Rate,
        };
        if !valid {
            return Err(ProfileError::InvalidThreshold(format!(
                "statistic '{}' does not apply to {}",
                statistic,
                metric.name()
            )));
        }

        Ok(Self {
            metric,
            statistic,
            comparator,
            bound,
        })
    }

    /// Whether an observed value satisfies this threshold
    pub fn check(&self, observed: f64) -> bool {
        self.comparator.holds(observed, self.bound)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}{}{}",
            self.metric.name(),
            self.statistic,
            self.comparator.symbol(),
            self.bound
        )
    }
}

fn parse_statistic(s: &str) -> Option<Statistic> {
    match s {
        "avg" => Some(Statistic::Avg),
        "min" => Some(Statistic::Min),
        "med" => Some(Statistic::Med),
        "max" => Some(Statistic::Max),
        "rate" => Some(Statistic::Rate),
        _ => {
            let p: f64 = s.strip_prefix("p(")?.strip_suffix(')')?.parse().ok()?;
            (0.0..=100.0).contains(&p).then_some(Statistic::Percentile(p))
        }
    }
}

/// Outcome of evaluating one threshold at run end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    /// Human-readable form, e.g. `http_req_duration: p(95)<500`
    pub threshold: String,
    /// Observed value (absent when there were no latency samples)
    pub observed: Option<f64>,
    pub passed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percentile() {
        let t = Threshold::parse("http_req_duration", "p(95)<500").unwrap();
        assert_eq!(t.metric, Metric::HttpReqDuration);
        assert_eq!(t.statistic, Statistic::Percentile(95.0));
        assert_eq!(t.comparator, Comparator::Lt);
        assert_eq!(t.bound, 500.0);
    }

    #[test]
    fn test_parse_rate_with_alias() {
        let t = Threshold::parse("errors", "rate<0.05").unwrap();
        assert_eq!(t.metric, Metric::HttpReqFailed);
        assert_eq!(t.statistic, Statistic::Rate);
        assert_eq!(t.bound, 0.05);
    }

    #[test]
    fn test_parse_two_char_comparator() {
        let t = Threshold::parse("http_req_duration", "avg <= 200").unwrap();
        assert_eq!(t.comparator, Comparator::Le);
        assert_eq!(t.statistic, Statistic::Avg);
        assert!(t.check(200.0));
        assert!(!t.check(200.1));
    }

    #[test]
    fn test_rate_is_strictly_less() {
        let t = Threshold::parse("http_req_failed", "rate<0.05").unwrap();
        assert!(!t.check(0.05));
        assert!(t.check(0.049));
    }

    #[test]
    fn test_rejects_mismatched_statistic() {
        assert!(Threshold::parse("http_req_failed", "p(95)<500").is_err());
        assert!(Threshold::parse("http_req_duration", "rate<0.1").is_err());
    }

    #[test]
    fn test_rejects_malformed_expressions() {
        assert!(Threshold::parse("http_req_duration", "p(95)500").is_err());
        assert!(Threshold::parse("http_req_duration", "p(101)<500").is_err());
        assert!(Threshold::parse("http_req_duration", "p95<500").is_err());
        assert!(Threshold::parse("http_req_duration", "max<abc").is_err());
        assert!(Threshold::parse("bogus_metric", "max<1").is_err());
    }

    #[test]
    fn test_display_round_trips_expression() {
        let t = Threshold::parse("http_req_duration", "p(99)<1000").unwrap();
        assert_eq!(t.to_string(), "http_req_duration: p(99)<1000");
    }
}
