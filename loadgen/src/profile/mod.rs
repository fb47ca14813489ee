//! Load profiles: stages, thresholds, and the named catalog
//!
//! This module provides:
//! - `Profile`/`Stage` describing how concurrency evolves over a run
//! - `Threshold` parsing and checking of pass/fail bounds
//! - `ProfileCatalog` with the built-in profiles

mod catalog;
mod threshold;
mod types;

pub use catalog::{DEFAULT_PROFILE, ProfileCatalog};
pub use threshold::{Comparator, Metric, Statistic, Threshold, ThresholdResult};
pub use types::{Profile, ProfileError, Stage, ThinkTime};
