//! Load execution: scheduler, virtual users and their pool
//!
//! A `Runner` drives one profile against one `Transport`:
//! - `StageScheduler` computes the target concurrency each tick
//! - `UserPool` spawns or retires `VirtualUser` tasks to match it
//! - every outcome lands in a shared `MetricsSink`
//!
//! When the last stage ends (or `RunState::stop` is called) the pool is
//! drained and the sink is summarized into a `Report`.

mod pool;
mod scheduler;
mod state;
mod user;

pub use pool::UserPool;
pub use scheduler::{DEFAULT_TICK, StageScheduler, ramp_target};
pub use state::RunState;
pub use user::{UserContext, VirtualUser};

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::profile::Profile;
use crate::scenario::{RouterError, ScenarioRouter};
use crate::stats::{MetricsSink, Report};
use crate::transport::Transport;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub tick: Duration,
    pub request_timeout: Duration,
    pub seed: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            seed: rand::random(),
        }
    }
}

pub struct Runner {
    options: RunOptions,
    state: Arc<RunState>,
}

impl Runner {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            state: Arc::new(RunState::new()),
        }
    }

    /// Handle for observing progress or aborting the run from elsewhere
    pub fn state(&self) -> Arc<RunState> {
        self.state.clone()
    }

    /// Execute `profile` once. The run state is reset first, so a runner
    /// may be reused; a stop requested before this call is discarded.
    pub async fn run(
        &self,
        profile: &Profile,
        transport: Arc<dyn Transport>,
    ) -> Result<Report, RouterError> {
        let router = Arc::new(ScenarioRouter::new(&profile.mix)?);
        self.state.reset();
        let sink = Arc::new(MetricsSink::new());

        let ctx = UserContext {
            router,
            transport,
            sink: sink.clone(),
            state: self.state.clone(),
            think_time: profile.think_time,
            request_timeout: self.options.request_timeout,
        };
        let mut pool = UserPool::new(ctx, self.options.seed);
        let scheduler = StageScheduler::new(self.options.tick);

        info!(
            "Starting profile '{}': {} stages, peak {} users, {:?} total (seed {})",
            profile.name,
            profile.stages.len(),
            profile.peak_target(),
            profile.total_duration(),
            self.options.seed
        );

        let started_at = Utc::now();
        let start = Instant::now();

        scheduler
            .run(profile, &self.state, |target, _| pool.scale_to(target))
            .await;
        // Run time covers the schedule only, not the drain below
        let elapsed = start.elapsed();

        let panicked = pool.shutdown().await;
        if panicked > 0 {
            warn!("{} virtual users panicked during the run", panicked);
        }

        let results = sink.evaluate(&profile.thresholds);
        let report = sink
            .summarize()
            .with_run(&profile.name, started_at, elapsed)
            .with_thresholds(results);

        info!(
            "Profile '{}' finished: {} requests, {:.2}% failed, {}",
            profile.name,
            report.count,
            report.failure_rate * 100.0,
            if report.passed { "PASS" } else { "FAIL" }
        );

        Ok(report)
    }
}
