//! Test Utilities Module
//!
//! Fixtures and a scriptable transport for unit tests.
//! This module is only compiled when running tests.

#![cfg(test)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::profile::{Profile, Stage, ThinkTime};
use crate::runner::{RunState, UserContext};
use crate::scenario::{PreparedRequest, Scenario, ScenarioRouter};
use crate::stats::MetricsSink;
use crate::transport::{RequestError, Transport};

// ============================================================================
// Fixtures
// ============================================================================

/// A profile with the given stages, the standard mix and no thresholds
pub fn profile_with_stages(stages: Vec<Stage>) -> Profile {
    Profile::new(
        "test",
        stages,
        Vec::new(),
        vec![
            (Scenario::Homepage, 0.6),
            (Scenario::TimeLookup, 0.3),
            (Scenario::TimezoneList, 0.05),
            (Scenario::InvalidInput, 0.05),
        ],
        ThinkTime::default(),
    )
    .expect("test profile has stages")
}

/// A user context over `transport` with a fresh sink and run state
pub fn user_context(transport: Arc<dyn Transport>, mix: &[(Scenario, f64)]) -> UserContext {
    UserContext {
        router: Arc::new(ScenarioRouter::new(mix).expect("valid test mix")),
        transport,
        sink: Arc::new(MetricsSink::new()),
        state: Arc::new(RunState::new()),
        think_time: ThinkTime::default(),
        request_timeout: Duration::from_secs(5),
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

/// In-process transport answering like a healthy (or broken) world-clock app
pub struct MockTransport {
    fail: bool,
    panic: bool,
    delay: Duration,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    /// 400 for the invalid timezone, 200 for everything else
    pub fn healthy() -> Self {
        Self {
            fail: false,
            panic: false,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request fails with a network error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::healthy()
        }
    }

    /// Every request panics inside the transport
    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::healthy()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<u16, RequestError> {
        self.requests
            .lock()
            .unwrap()
            .push(request.path_and_query.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panic {
            panic!("transport failure injected by test");
        }
        if self.fail {
            return Err(RequestError::Network("connection refused".to_string()));
        }

        Ok(match request.scenario {
            Scenario::InvalidInput => 400,
            _ => 200,
        })
    }
}
