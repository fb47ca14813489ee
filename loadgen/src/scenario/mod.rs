//! Request scenarios and weighted dispatch between them

mod router;
mod types;

pub use router::{RouterError, ScenarioRouter};
pub use types::{INVALID_TIMEZONE, PreparedRequest, Scenario, TIMEZONES};
