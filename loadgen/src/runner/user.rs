//! Virtual user loop: pick a scenario, send it, record, think, repeat

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::trace;

use super::state::RunState;
use crate::profile::ThinkTime;
use crate::scenario::ScenarioRouter;
use crate::stats::{MetricsSink, RequestOutcome};
use crate::transport::{RequestError, Transport};

/// Everything a virtual user shares with its siblings
#[derive(Clone)]
pub struct UserContext {
    pub router: Arc<ScenarioRouter>,
    pub transport: Arc<dyn Transport>,
    pub sink: Arc<MetricsSink>,
    pub state: Arc<RunState>,
    pub think_time: ThinkTime,
    pub request_timeout: Duration,
}

/// One simulated client
pub struct VirtualUser {
    id: usize,
    ctx: UserContext,
    rng: ChaCha8Rng,
    retired: watch::Receiver<bool>,
}

impl VirtualUser {
    /// `retired` flips to true when the pool no longer wants this user;
    /// a dropped sender counts as retirement too.
    pub fn new(
        id: usize,
        ctx: UserContext,
        rng: ChaCha8Rng,
        retired: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            ctx,
            rng,
            retired,
        }
    }

    fn is_retired(&self) -> bool {
        *self.retired.borrow() || self.retired.has_changed().is_err()
    }

    fn should_stop(&self) -> bool {
        self.ctx.state.is_stopped() || self.is_retired()
    }

    /// Issue one request and record its outcome
    pub async fn iterate(&mut self) {
        let scenario = self.ctx.router.pick(self.rng.random::<f64>());
        let request = scenario.build_request(&mut self.rng);

        let start = Instant::now();
        let result =
            match tokio::time::timeout(self.ctx.request_timeout, self.ctx.transport.send(&request))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(RequestError::Timeout(self.ctx.request_timeout)),
            };
        let latency = start.elapsed();

        let outcome = match result {
            Ok(status) => RequestOutcome::response(scenario, status, latency),
            Err(e) => RequestOutcome::failure(scenario, &e, latency),
        };
        self.ctx.sink.record(outcome);
    }

    /// Loop until the run stops or this user is retired. An in-flight
    /// request always completes; the think-time pause does not.
    pub async fn run(mut self) {
        trace!("Virtual user {} started", self.id);
        let mut iterations = 0u64;

        while !self.should_stop() {
            self.iterate().await;
            iterations += 1;

            let pause = self.ctx.think_time.sample(&mut self.rng);
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = self.ctx.state.stopped() => {}
                _ = self.retired.wait_for(|retired| *retired) => {}
            }
        }

        trace!(
            "Virtual user {} exiting after {} iterations",
            self.id, iterations
        );
    }
}
