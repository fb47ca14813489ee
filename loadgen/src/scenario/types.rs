//! Scenario definitions: what each virtual-user request looks like

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zones of the major cities the service displays
pub const TIMEZONES: [&str; 12] = [
    "America/New_York",
    "Europe/London",
    "Asia/Tokyo",
    "Australia/Sydney",
    "Asia/Dubai",
    "Asia/Singapore",
    "America/Sao_Paulo",
    "Asia/Kolkata",
    "Europe/Paris",
    "America/Los_Angeles",
    "Asia/Hong_Kong",
    "Europe/Berlin",
];

/// Zone name the service must reject
pub const INVALID_TIMEZONE: &str = "Invalid/Timezone";

/// A kind of request a virtual user can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// `GET /`
    Homepage,
    /// `GET /api/time?timezone=<zone>` for a random major-city zone
    TimeLookup,
    /// `GET /api/timezones`
    TimezoneList,
    /// `GET /api/time?timezone=Invalid/Timezone`, expected to be rejected with 400
    InvalidInput,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Homepage,
        Scenario::TimeLookup,
        Scenario::TimezoneList,
        Scenario::InvalidInput,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Homepage => "homepage",
            Scenario::TimeLookup => "time",
            Scenario::TimezoneList => "timezones",
            Scenario::InvalidInput => "invalid_input",
        }
    }

    /// Build the concrete request for one iteration
    pub fn build_request<R: Rng>(&self, rng: &mut R) -> PreparedRequest {
        let path_and_query = match self {
            Scenario::Homepage => "/".to_string(),
            Scenario::TimeLookup => {
                let zone = TIMEZONES.choose(rng).copied().unwrap_or(TIMEZONES[0]);
                format!("/api/time?timezone={}", zone)
            }
            Scenario::TimezoneList => "/api/timezones".to_string(),
            Scenario::InvalidInput => format!("/api/time?timezone={}", INVALID_TIMEZONE),
        };
        PreparedRequest {
            scenario: *self,
            path_and_query,
        }
    }

    /// Whether a response status counts as a pass for this scenario
    pub fn expects(&self, status: u16) -> bool {
        match self {
            Scenario::InvalidInput => status == 400,
            Scenario::Homepage | Scenario::TimeLookup | Scenario::TimezoneList => {
                (200..300).contains(&status)
            }
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A request ready to send: always a `GET` relative to the target base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub scenario: Scenario,
    pub path_and_query: String,
}
