//! Shared run state: written by the scheduler, read by virtual users

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Progress and stop signal for one execution
///
/// Single writer (the scheduler), many readers. The stop flag may also be
/// raised by an external abort signal. It lives in a watch channel so that
/// users sleeping between requests wake as soon as it is raised.
#[derive(Debug)]
pub struct RunState {
    stage_index: AtomicUsize,
    elapsed_in_stage_ms: AtomicU64,
    target: AtomicUsize,
    stopped: watch::Sender<bool>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            stage_index: AtomicUsize::new(0),
            elapsed_in_stage_ms: AtomicU64::new(0),
            target: AtomicUsize::new(0),
            stopped: watch::channel(false).0,
        }
    }
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_index(&self) -> usize {
        self.stage_index.load(Ordering::Acquire)
    }

    pub fn elapsed_in_stage(&self) -> Duration {
        Duration::from_millis(self.elapsed_in_stage_ms.load(Ordering::Acquire))
    }

    /// Concurrency the scheduler currently asks for
    pub fn target(&self) -> usize {
        self.target.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Resolves once `stop` has been called (immediately if it already was)
    pub async fn stopped(&self) {
        let mut rx = self.stopped.subscribe();
        // The sender lives in `self`, so this only returns once stopped
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    pub(crate) fn enter_stage(&self, index: usize) {
        self.stage_index.store(index, Ordering::Release);
        self.elapsed_in_stage_ms.store(0, Ordering::Release);
    }

    pub(crate) fn update(&self, target: usize, elapsed_in_stage: Duration) {
        self.elapsed_in_stage_ms
            .store(elapsed_in_stage.as_millis() as u64, Ordering::Release);
        self.target.store(target, Ordering::Release);
    }

    /// Back to the initial state before another execution
    pub(crate) fn reset(&self) {
        self.stage_index.store(0, Ordering::Release);
        self.elapsed_in_stage_ms.store(0, Ordering::Release);
        self.target.store(0, Ordering::Release);
        self.stopped.send_replace(false);
    }

    /// Ask every virtual user to finish its current iteration and exit
    pub fn stop(&self) {
        self.stopped.send_replace(true);
    }
}
