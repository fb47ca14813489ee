//! Load generator configuration
//!
//! Configuration is loaded from environment variables:
//! - `BASE_URL`: target application (default `http://localhost`)
//! - `TEST_TYPE`: profile name (default `load`)
//! - `REPORT_PATH`: JSON report destination (default `/tmp/summary.json`)
//! - `REQUEST_TIMEOUT_SECS`: per-request timeout (default 5)
//! - `TICK_INTERVAL_MS`: scheduler tick (default 1000)
//! - `LOADGEN_SEED`: fixed RNG seed for reproducible runs
//! - `METRICS_ADDR`: serve Prometheus metrics on this address during the run

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::profile::DEFAULT_PROFILE;
use crate::runner::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_TICK, RunOptions};

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the application under test
    pub base_url: String,
    /// Name of the load profile to run
    pub test_type: String,
    /// Where the JSON report is written
    pub report_path: PathBuf,
    pub request_timeout: Duration,
    /// Interval between concurrency updates
    pub tick_interval: Duration,
    /// Seed for every virtual user's RNG; random when unset
    pub seed: Option<u64>,
    /// Prometheus scrape address; metrics are only kept in-process when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            test_type: DEFAULT_PROFILE.to_string(),
            report_path: PathBuf::from("/tmp/summary.json"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tick_interval: DEFAULT_TICK,
            seed: None,
            metrics_addr: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unparsable values keep defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BASE_URL")
            && !url.is_empty()
        {
            config.base_url = url;
        }
        if let Some(test_type) = lookup("TEST_TYPE")
            && !test_type.is_empty()
        {
            config.test_type = test_type;
        }
        if let Some(path) = lookup("REPORT_PATH")
            && !path.is_empty()
        {
            config.report_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS")
            && let Ok(s) = secs.parse::<u64>()
            && s > 0
        {
            config.request_timeout = Duration::from_secs(s);
        }
        if let Some(ms) = lookup("TICK_INTERVAL_MS")
            && let Ok(m) = ms.parse::<u64>()
            && m > 0
        {
            config.tick_interval = Duration::from_millis(m);
        }
        if let Some(seed) = lookup("LOADGEN_SEED")
            && let Ok(s) = seed.parse()
        {
            config.seed = Some(s);
        }
        if let Some(addr) = lookup("METRICS_ADDR")
            && let Ok(a) = addr.parse()
        {
            config.metrics_addr = Some(a);
        }

        config
    }

    /// Runner options derived from this config
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            tick: self.tick_interval,
            request_timeout: self.request_timeout,
            seed: self.seed.unwrap_or_else(rand::random),
        }
    }
}
