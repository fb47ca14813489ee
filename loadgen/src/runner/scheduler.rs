//! Stage scheduler: turns a profile's stages into a concurrency signal
//!
//! Within each stage the target concurrency moves linearly from the previous
//! stage's final target to this stage's target. The scheduler reports the
//! current target every tick and once more at the exact end of the stage,
//! so total run time is the sum of the stage durations.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::state::RunState;
use crate::profile::Profile;

/// Default interval between concurrency updates
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Smallest tick accepted, to keep the update loop from spinning
const MIN_TICK: Duration = Duration::from_millis(10);

/// Linear interpolation between two concurrency levels
pub fn ramp_target(from: usize, to: usize, elapsed: Duration, duration: Duration) -> usize {
    if duration.is_zero() || elapsed >= duration {
        return to;
    }
    let fraction = elapsed.as_secs_f64() / duration.as_secs_f64();
    let value = from as f64 + (to as f64 - from as f64) * fraction;
    value.round().max(0.0) as usize
}

pub struct StageScheduler {
    tick: Duration,
}

impl StageScheduler {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick: tick.max(MIN_TICK),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Walk every stage, calling `on_tick(target, elapsed_in_stage)` as the
    /// target evolves. Sets the stop flag before returning.
    pub async fn run<F>(&self, profile: &Profile, state: &RunState, mut on_tick: F)
    where
        F: FnMut(usize, Duration),
    {
        let mut previous = 0usize;

        for (index, stage) in profile.stages.iter().enumerate() {
            if state.is_stopped() {
                info!("Run stopped before stage {}", index + 1);
                break;
            }
            state.enter_stage(index);

            if stage.duration.is_zero() {
                debug!(
                    "Stage {}/{}: jump to {} users",
                    index + 1,
                    profile.stages.len(),
                    stage.target
                );
                state.update(stage.target, Duration::ZERO);
                on_tick(stage.target, Duration::ZERO);
                previous = stage.target;
                continue;
            }

            info!(
                "Stage {}/{}: {} -> {} users over {:?}",
                index + 1,
                profile.stages.len(),
                previous,
                stage.target,
                stage.duration
            );

            let start = Instant::now();
            let end = start + stage.duration;
            let mut next = start;

            loop {
                let elapsed = Instant::now()
                    .saturating_duration_since(start)
                    .min(stage.duration);
                let current = ramp_target(previous, stage.target, elapsed, stage.duration);
                state.update(current, elapsed);
                on_tick(current, elapsed);

                if elapsed >= stage.duration || state.is_stopped() {
                    break;
                }

                next += self.tick;
                tokio::time::sleep_until(next.min(end)).await;
            }

            previous = stage.target;
        }

        state.stop();
    }
}

impl Default for StageScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Stage;
    use crate::test_utils::profile_with_stages;
    use std::sync::Arc;

    #[test]
    fn test_ramp_target_interpolates() {
        let d = Duration::from_secs(10);
        assert_eq!(ramp_target(0, 10, Duration::ZERO, d), 0);
        assert_eq!(ramp_target(0, 10, Duration::from_secs(5), d), 5);
        assert_eq!(ramp_target(0, 10, d, d), 10);
        assert_eq!(ramp_target(50, 0, Duration::from_secs(5), d), 25);
        assert_eq!(ramp_target(30, 30, Duration::from_secs(3), d), 30);
        assert_eq!(ramp_target(0, 500, Duration::from_secs(1), Duration::from_secs(120)), 4);
    }

    #[test]
    fn test_ramp_target_zero_duration_jumps() {
        assert_eq!(ramp_target(0, 50, Duration::ZERO, Duration::ZERO), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_duration_equals_sum_of_stages() {
        let profile = profile_with_stages(vec![
            Stage::secs(10, 10),
            Stage::secs(5, 10),
            Stage::new(Duration::from_millis(2500), 0),
        ]);
        let state = RunState::new();
        let scheduler = StageScheduler::new(Duration::from_secs(1));

        let start = Instant::now();
        scheduler.run(&profile, &state, |_, _| {}).await;
        let elapsed = start.elapsed();

        let total = profile.total_duration();
        assert!(
            elapsed >= total && elapsed <= total + scheduler.tick(),
            "elapsed {:?} vs total {:?}",
            elapsed,
            total
        );
        assert!(state.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_ramp_ticks() {
        let profile = profile_with_stages(vec![Stage::secs(10, 10)]);
        let state = RunState::new();
        let mut targets = Vec::new();

        StageScheduler::new(Duration::from_secs(1))
            .run(&profile, &state, |target, _| targets.push(target))
            .await;

        assert_eq!(targets, (0..=10).collect::<Vec<_>>());
        assert_eq!(state.target(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ramp_continues_from_previous_stage() {
        let profile = profile_with_stages(vec![Stage::secs(2, 10), Stage::secs(2, 30)]);
        let state = RunState::new();
        let mut ticks = Vec::new();

        StageScheduler::new(Duration::from_secs(1))
            .run(&profile, &state, |target, elapsed| ticks.push((target, elapsed)))
            .await;

        let targets: Vec<usize> = ticks.iter().map(|(t, _)| *t).collect();
        assert_eq!(targets, vec![0, 5, 10, 10, 20, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_tick_lands_on_stage_end() {
        let profile = profile_with_stages(vec![Stage::new(Duration::from_millis(2500), 20)]);
        let state = RunState::new();
        let mut ticks = Vec::new();

        StageScheduler::new(Duration::from_secs(1))
            .run(&profile, &state, |target, elapsed| ticks.push((target, elapsed)))
            .await;

        assert_eq!(
            ticks.last().copied(),
            Some((20, Duration::from_millis(2500)))
        );
        assert_eq!(ticks.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_stage_jumps_immediately() {
        let profile = profile_with_stages(vec![Stage::secs(0, 50)]);
        let state = RunState::new();
        let mut ticks = Vec::new();

        let start = Instant::now();
        StageScheduler::default()
            .run(&profile, &state, |target, elapsed| ticks.push((target, elapsed)))
            .await;

        assert_eq!(ticks, vec![(50, Duration::ZERO)]);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(state.target(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_steps_never_exceed_ramp_step() {
        let stage = Stage::secs(20, 100);
        let profile = profile_with_stages(vec![stage]);
        let state = RunState::new();
        let tick = Duration::from_secs(1);
        let step = (stage.target as f64 * tick.as_secs_f64() / stage.duration.as_secs_f64()).ceil()
            as usize;

        let mut targets = Vec::new();
        StageScheduler::new(tick)
            .run(&profile, &state, |target, _| targets.push(target))
            .await;

        for pair in targets.windows(2) {
            assert!(pair[1].abs_diff(pair[0]) <= step, "{:?}", pair);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_stop_ends_run_early() {
        let profile = profile_with_stages(vec![Stage::secs(60, 10), Stage::secs(60, 10)]);
        let state = Arc::new(RunState::new());

        let stopper = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3500)).await;
            stopper.stop();
        });

        let start = Instant::now();
        StageScheduler::new(Duration::from_secs(1))
            .run(&profile, &state, |_, _| {})
            .await;

        assert!(start.elapsed() <= Duration::from_secs(5));
        assert_eq!(state.stage_index(), 0);
    }
}
