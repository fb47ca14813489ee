//! Profile-related types and error definitions

use rand::Rng;
use std::time::Duration;
use thiserror::Error;

use super::threshold::Threshold;
use crate::scenario::Scenario;

/// Errors that can occur when resolving or building load profiles
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Unknown profile '{name}' (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Profile '{0}' has no stages")]
    NoStages(String),
}

/// A time-bounded segment of a load profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    /// Wall-clock length of the stage (zero jumps straight to the target)
    pub duration: Duration,
    /// Concurrency to reach by the end of the stage
    pub target: usize,
}

impl Stage {
    pub const fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }

    pub const fn secs(secs: u64, target: usize) -> Self {
        Self::new(Duration::from_secs(secs), target)
    }

    pub const fn mins(mins: u64, target: usize) -> Self {
        Self::new(Duration::from_secs(mins * 60), target)
    }

    pub const fn hours(hours: u64, target: usize) -> Self {
        Self::new(Duration::from_secs(hours * 60 * 60), target)
    }
}

/// Randomized pause between a virtual user's consecutive requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkTime {
    pub base: Duration,
    pub jitter: Duration,
}

impl ThinkTime {
    pub const fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// `base + uniform(0, jitter)`
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }
        self.base + self.jitter.mul_f64(rng.random::<f64>())
    }
}

impl Default for ThinkTime {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(2))
    }
}

/// A named load profile: stages, scenario mix, and pass/fail thresholds
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub stages: Vec<Stage>,
    pub thresholds: Vec<Threshold>,
    /// Scenario weights; normalized by the router
    pub mix: Vec<(Scenario, f64)>,
    pub think_time: ThinkTime,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        stages: Vec<Stage>,
        thresholds: Vec<Threshold>,
        mix: Vec<(Scenario, f64)>,
        think_time: ThinkTime,
    ) -> Result<Self, ProfileError> {
        let name = name.into();
        if stages.is_empty() {
            return Err(ProfileError::NoStages(name));
        }
        Ok(Self {
            name,
            stages,
            thresholds,
            mix,
            think_time,
        })
    }

    /// Sum of all stage durations
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Highest concurrency any stage reaches
    pub fn peak_target(&self) -> usize {
        self.stages.iter().map(|s| s.target).max().unwrap_or(0)
    }
}
