//! Built-in load profiles, keyed by name
//!
//! | Profile | Shape                                   | Peak VUs | Length |
//! |---------|-----------------------------------------|----------|--------|
//! | smoke   | short ramp and hold for CI              | 5        | 30s    |
//! | ramp    | staged ramp to a small spike            | 50       | 10m    |
//! | load    | expected normal load                    | 500      | 14m    |
//! | stress  | stepwise climb to find breaking points  | 2000     | 37m    |
//! | spike   | sudden burst and recovery               | 2000     | 16m    |
//! | soak    | long hold for stability                 | 500      | 3h10m  |

use std::collections::BTreeMap;
use std::time::Duration;

use super::threshold::Threshold;
use super::types::{Profile, ProfileError, Stage, ThinkTime};
use crate::scenario::Scenario;

/// Name used when no profile is requested
pub const DEFAULT_PROFILE: &str = "load";

/// Immutable set of named profiles, built once at startup
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileCatalog {
    pub fn new(profiles: impl IntoIterator<Item = Profile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    /// Catalog of the profiles the service is routinely tested with
    pub fn builtin() -> Result<Self, ProfileError> {
        let standard_think = ThinkTime::new(Duration::from_secs(1), Duration::from_secs(2));

        let profiles = vec![
            Profile::new(
                "smoke",
                vec![Stage::secs(5, 5), Stage::secs(20, 5), Stage::secs(5, 0)],
                thresholds(&[
                    ("http_req_duration", "p(95)<500"),
                    ("http_req_duration", "p(99)<1000"),
                    ("http_req_failed", "rate<0.01"),
                ])?,
                standard_mix(),
                ThinkTime::new(Duration::from_millis(500), Duration::from_secs(1)),
            )?,
            Profile::new(
                "ramp",
                vec![
                    Stage::mins(1, 10),
                    Stage::mins(3, 30),
                    Stage::mins(2, 50),
                    Stage::mins(3, 50),
                    Stage::mins(1, 0),
                ],
                thresholds(&[
                    ("http_req_duration", "p(95)<500"),
                    ("http_req_duration", "p(99)<1000"),
                    ("errors", "rate<0.05"),
                ])?,
                all_endpoints_mix(),
                ThinkTime::new(Duration::ZERO, Duration::from_secs(2)),
            )?,
            Profile::new(
                "load",
                vec![Stage::mins(2, 500), Stage::mins(10, 500), Stage::mins(2, 0)],
                thresholds(&[
                    ("http_req_duration", "p(95)<2500"),
                    ("http_req_duration", "p(99)<5000"),
                    ("http_req_failed", "rate<0.01"),
                ])?,
                standard_mix(),
                standard_think,
            )?,
            Profile::new(
                "stress",
                vec![
                    Stage::mins(2, 500),
                    Stage::mins(5, 750),
                    Stage::mins(5, 1000),
                    Stage::mins(5, 1250),
                    Stage::mins(5, 2000),
                    Stage::mins(10, 2000),
                    Stage::mins(5, 0),
                ],
                thresholds(&[
                    ("http_req_duration", "p(95)<5000"),
                    ("http_req_duration", "p(99)<10000"),
                    ("http_req_failed", "rate<0.05"),
                ])?,
                standard_mix(),
                standard_think,
            )?,
            Profile::new(
                "spike",
                vec![
                    Stage::mins(2, 500),
                    Stage::mins(2, 2000),
                    Stage::mins(5, 2000),
                    Stage::mins(2, 500),
                    Stage::mins(3, 500),
                    Stage::mins(2, 0),
                ],
                thresholds(&[
                    ("http_req_duration", "p(95)<5000"),
                    ("http_req_duration", "p(99)<10000"),
                    ("http_req_failed", "rate<0.10"),
                ])?,
                standard_mix(),
                standard_think,
            )?,
            Profile::new(
                "soak",
                vec![Stage::mins(5, 500), Stage::hours(3, 500), Stage::mins(5, 0)],
                thresholds(&[
                    ("http_req_duration", "p(95)<2500"),
                    ("http_req_duration", "p(99)<5000"),
                    ("http_req_failed", "rate<0.01"),
                ])?,
                standard_mix(),
                standard_think,
            )?,
        ];

        Ok(Self::new(profiles))
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Result<&Profile, ProfileError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ProfileError::UnknownProfile {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Profile names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Every endpoint equally often, plus the invalid-input check
fn all_endpoints_mix() -> Vec<(Scenario, f64)> {
    let share = 0.95 / 3.0;
    vec![
        (Scenario::Homepage, share),
        (Scenario::TimeLookup, share),
        (Scenario::TimezoneList, share),
        (Scenario::InvalidInput, 0.05),
    ]
}

/// Homepage most common, time lookups moderate, timezone list least,
/// plus a small share of deliberately invalid lookups
fn standard_mix() -> Vec<(Scenario, f64)> {
    vec![
        (Scenario::Homepage, 0.60),
        (Scenario::TimeLookup, 0.30),
        (Scenario::TimezoneList, 0.05),
        (Scenario::InvalidInput, 0.05),
    ]
}

fn thresholds(specs: &[(&str, &str)]) -> Result<Vec<Threshold>, ProfileError> {
    specs
        .iter()
        .map(|(metric, expr)| Threshold::parse(metric, expr))
        .collect()
}
