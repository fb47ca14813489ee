//! Weighted scenario dispatch
//!
//! Weights are accumulated into a normalized table at construction. A draw
//! `r` in `[0, 1)` selects the first entry whose cumulative bound is greater
//! than `r`, so entry `i` owns the half-open interval `[c(i-1), c(i))`.

use thiserror::Error;

use super::types::Scenario;

#[derive(Debug, Error, PartialEq)]
pub enum RouterError {
    #[error("Scenario table is empty")]
    Empty,

    #[error("Invalid weight {weight} for scenario {scenario}")]
    InvalidWeight { scenario: Scenario, weight: f64 },

    #[error("Scenario weights sum to zero")]
    ZeroTotal,
}

/// Cumulative-weight table over scenarios
#[derive(Debug, Clone)]
pub struct ScenarioRouter {
    scenarios: Vec<Scenario>,
    cumulative: Vec<f64>,
}

impl ScenarioRouter {
    pub fn new(weights: &[(Scenario, f64)]) -> Result<Self, RouterError> {
        if weights.is_empty() {
            return Err(RouterError::Empty);
        }
        for &(scenario, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RouterError::InvalidWeight { scenario, weight });
            }
        }

        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Err(RouterError::ZeroTotal);
        }

        // Tables that already sum to one are used as written so the
        // boundaries stay exactly where the weights put them
        let scale = if (total - 1.0).abs() < 1e-9 { 1.0 } else { total };

        let mut running = 0.0;
        let mut cumulative = Vec::with_capacity(weights.len());
        for (_, weight) in weights {
            running += weight / scale;
            cumulative.push(running);
        }
        // Rounding must not leave a gap at the top of the range
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }

        Ok(Self {
            scenarios: weights.iter().map(|(s, _)| *s).collect(),
            cumulative,
        })
    }

    /// Select the scenario owning `r`; values outside `[0, 1)` are clamped
    pub fn pick(&self, r: f64) -> Scenario {
        let r = if r.is_nan() { 0.0 } else { r.clamp(0.0, 1.0) };
        let idx = self.cumulative.partition_point(|&c| c <= r);
        self.scenarios[idx.min(self.scenarios.len() - 1)]
    }

    /// Probability of each scenario, in table order
    pub fn probabilities(&self) -> Vec<(Scenario, f64)> {
        let mut prev = 0.0;
        self.scenarios
            .iter()
            .zip(&self.cumulative)
            .map(|(s, &c)| {
                let p = c - prev;
                prev = c;
                (*s, p)
            })
            .collect()
    }
}
