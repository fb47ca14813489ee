//! Pool of virtual-user tasks scaled to the scheduler's target

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

use super::user::{UserContext, VirtualUser};

pub struct UserPool {
    ctx: UserContext,
    seed: u64,
    next_id: usize,
    /// Retire switches of live users, oldest first
    live: Vec<watch::Sender<bool>>,
    tasks: JoinSet<()>,
    panicked: usize,
}

impl UserPool {
    pub fn new(ctx: UserContext, seed: u64) -> Self {
        Self {
            ctx,
            seed,
            next_id: 0,
            live: Vec::new(),
            tasks: JoinSet::new(),
            panicked: 0,
        }
    }

    /// Users that have been asked to run and not yet retired
    pub fn active(&self) -> usize {
        self.live.len()
    }

    /// User tasks that ended in a panic so far
    pub fn panicked(&self) -> usize {
        self.panicked
    }

    /// Spawn or retire users until `target` are live. Retired users finish
    /// their current request before exiting.
    pub fn scale_to(&mut self, target: usize) {
        let current = self.live.len();
        if target > current {
            for _ in current..target {
                self.spawn_one();
            }
            debug!("Scaled up {} -> {} users", current, target);
        } else if target < current {
            for retire in self.live.drain(target..) {
                retire.send_replace(true);
            }
            debug!("Scaled down {} -> {} users", current, target);
        }
        self.reap();
    }

    fn spawn_one(&mut self) {
        let id = self.next_id;
        self.next_id += 1;

        let rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(id as u64));
        let (retire, retired) = watch::channel(false);
        let user = VirtualUser::new(id, self.ctx.clone(), rng, retired);
        self.tasks.spawn(user.run());

        self.live.push(retire);
    }

    /// Collect users that already exited
    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            self.on_exit(result);
        }
    }

    fn on_exit(&mut self, result: Result<(), JoinError>) {
        if let Err(e) = result {
            self.panicked += 1;
            warn!("Virtual user task failed: {}", e);
        }
    }

    /// Retire everyone and wait for every in-flight request to finish.
    /// Returns the number of users that panicked during the run.
    pub async fn shutdown(mut self) -> usize {
        self.scale_to(0);
        while let Some(result) = self.tasks.join_next().await {
            self.on_exit(result);
        }
        self.panicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Stage;
    use crate::runner::{RunState, StageScheduler};
    use crate::scenario::Scenario;
    use crate::test_utils::{MockTransport, profile_with_stages, user_context};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_scale_up_and_down() {
        let transport = Arc::new(MockTransport::healthy());
        let ctx = user_context(transport, &[(Scenario::Homepage, 1.0)]);
        let mut pool = UserPool::new(ctx, 7);

        pool.scale_to(50);
        assert_eq!(pool.active(), 50);

        pool.scale_to(20);
        assert_eq!(pool.active(), 20);

        pool.scale_to(20);
        assert_eq!(pool.active(), 20);

        pool.scale_to(0);
        assert_eq!(pool.active(), 0);

        assert_eq!(pool.shutdown().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_stage_reaches_target_at_once() {
        let transport = Arc::new(MockTransport::healthy());
        let ctx = user_context(transport, &[(Scenario::Homepage, 1.0)]);
        let mut pool = UserPool::new(ctx, 1);
        let profile = profile_with_stages(vec![Stage::secs(0, 50)]);
        let state = RunState::new();
        let mut active_after_tick = Vec::new();

        StageScheduler::default()
            .run(&profile, &state, |target, _| {
                pool.scale_to(target);
                active_after_tick.push(pool.active());
            })
            .await;

        assert_eq!(active_after_tick, vec![50]);
        pool.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_users_track_each_tick() {
        let transport = Arc::new(MockTransport::healthy());
        let ctx = user_context(transport, &[(Scenario::Homepage, 1.0)]);
        let mut pool = UserPool::new(ctx, 2);
        let profile = profile_with_stages(vec![Stage::secs(10, 30), Stage::secs(5, 0)]);
        let state = RunState::new();
        let mut ticks = Vec::new();

        StageScheduler::new(Duration::from_secs(1))
            .run(&profile, &state, |target, _| {
                pool.scale_to(target);
                ticks.push((target, pool.active()));
            })
            .await;

        for (target, active) in ticks {
            assert_eq!(active, target);
        }
        pool.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_only_for_in_flight_requests() {
        let transport =
            Arc::new(MockTransport::healthy().with_delay(Duration::from_millis(800)));
        let ctx = user_context(transport, &[(Scenario::TimeLookup, 1.0)]);
        let sink = ctx.sink.clone();
        let mut pool = UserPool::new(ctx, 11);

        pool.scale_to(5);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let start = Instant::now();
        pool.shutdown().await;

        // Every user had one request in flight; all of them must be recorded,
        // and nobody sits out a think-time pause afterwards
        assert_eq!(sink.len(), 5);
        assert_eq!(start.elapsed(), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retired_users_stop_issuing_requests() {
        let transport = Arc::new(MockTransport::healthy());
        let ctx = user_context(transport.clone(), &[(Scenario::Homepage, 1.0)]);
        let mut pool = UserPool::new(ctx, 3);

        pool.scale_to(4);
        tokio::time::sleep(Duration::from_secs(5)).await;
        pool.scale_to(0);
        tokio::time::sleep(Duration::from_secs(1)).await;
        let after_retire = transport.requests().len();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.requests().len(), after_retire);
        pool.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicked_users_are_counted_before_shutdown() {
        let transport = Arc::new(MockTransport::panicking());
        let ctx = user_context(transport, &[(Scenario::Homepage, 1.0)]);
        let mut pool = UserPool::new(ctx, 5);

        pool.scale_to(3);
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Scaling collects tasks that already ended
        pool.scale_to(3);
        assert_eq!(pool.panicked(), 3);
        assert_eq!(pool.shutdown().await, 3);
    }
}
