//! Circuit breaker
//!
//! Wraps any async operation with a failure threshold, per-call timeout and
//! reset cooldown so a failing collaborator (an LLM endpoint, a build tool)
//! cannot be hammered in a retry loop. Deliberately transparent: state,
//! counters and time-until-retry are all inspectable.

use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    /// Normal operation, calls pass through.
    Closed,
    /// Rejecting calls until the reset cooldown elapses.
    Open,
    /// Allowing a bounded number of trial calls.
    HalfOpen,
}

#[derive(Debug, Error)]
pub enum BreakerError<E> {
    #[error("circuit '{name}' is open after {failures} consecutive failures; retry in {retry_in:?}")]
    Open {
        name: String,
        failures: u32,
        retry_in: Duration,
    },
    #[error("circuit '{name}': call timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
    #[error("circuit '{name}': {inner}")]
    Inner { name: String, inner: E },
}

/// Counters kept across the breaker's lifetime.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct BreakerStats {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub consecutive_failures: u32,
}

/// Snapshot for observability.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStatus {
    pub name: String,
    pub state: BreakerState,
    pub stats: BreakerStats,
    pub retry_in: Option<Duration>,
}

pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    call_timeout: Duration,
    reset_timeout: Duration,
    half_open_max_calls: u32,

    state: BreakerState,
    stats: BreakerStats,
    last_state_change: Instant,
    half_open_calls: u32,
}

impl CircuitBreaker {
    pub fn new(
        name: impl Into<String>,
        failure_threshold: u32,
        call_timeout: Duration,
        reset_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            failure_threshold,
            call_timeout,
            reset_timeout,
            half_open_max_calls: 1,
            state: BreakerState::Closed,
            stats: BreakerStats::default(),
            last_state_change: Instant::now(),
            half_open_calls: 0,
        }
    }

    /// Run `operation` through the breaker: rejected immediately when open,
    /// timed out per call, and counted toward the failure threshold.
    pub async fn call<F, Fut, T, E>(&mut self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.can_attempt() {
            return Err(BreakerError::Open {
                name: self.name.clone(),
                failures: self.stats.consecutive_failures,
                retry_in: self.time_until_retry().unwrap_or_default(),
            });
        }

        self.stats.total_calls += 1;

        match tokio::time::timeout(self.call_timeout, operation()).await {
            Ok(Ok(value)) => {
                self.on_success();
                Ok(value)
            }
            Ok(Err(inner)) => {
                self.on_failure();
                Err(BreakerError::Inner {
                    name: self.name.clone(),
                    inner,
                })
            }
            Err(_) => {
                self.on_failure();
                Err(BreakerError::Timeout {
                    name: self.name.clone(),
                    timeout: self.call_timeout,
                })
            }
        }
    }

    fn can_attempt(&mut self) -> bool {
        self.refresh_state();
        match self.state {
            BreakerState::Closed => true,
            BreakerState::HalfOpen => {
                if self.half_open_calls < self.half_open_max_calls {
                    self.half_open_calls += 1;
                    true
                } else {
                    false
                }
            }
            BreakerState::Open => false,
        }
    }

    fn refresh_state(&mut self) {
        if self.state == BreakerState::Open
            && self.last_state_change.elapsed() > self.reset_timeout
        {
            info!(name = %self.name, "circuit moving to half-open");
            self.transition(BreakerState::HalfOpen);
        }
    }

    fn on_success(&mut self) {
        self.stats.successful_calls += 1;
        self.stats.consecutive_failures = 0;
        if self.state == BreakerState::HalfOpen {
            info!(name = %self.name, "circuit recovered, closing");
            self.transition(BreakerState::Closed);
        }
    }

    fn on_failure(&mut self) {
        self.stats.failed_calls += 1;
        self.stats.consecutive_failures += 1;
        if self.state == BreakerState::HalfOpen {
            warn!(name = %self.name, "trial call failed, reopening circuit");
            self.transition(BreakerState::Open);
        } else if self.stats.consecutive_failures >= self.failure_threshold
            && self.state != BreakerState::Open
        {
            warn!(
                name = %self.name,
                failures = self.stats.consecutive_failures,
                "circuit opening"
            );
            self.transition(BreakerState::Open);
        }
    }

    fn transition(&mut self, state: BreakerState) {
        self.state = state;
        self.last_state_change = Instant::now();
        self.half_open_calls = 0;
    }

    fn time_until_retry(&self) -> Option<Duration> {
        match self.state {
            BreakerState::Open => Some(
                self.reset_timeout
                    .saturating_sub(self.last_state_change.elapsed()),
            ),
            _ => None,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn status(&self) -> BreakerStatus {
        BreakerStatus {
            name: self.name.clone(),
            state: self.state,
            stats: self.stats,
            retry_in: self.time_until_retry(),
        }
    }

    /// Manual reset, e.g. at the start of a new generation session.
    pub fn reset(&mut self) {
        self.stats = BreakerStats::default();
        self.transition(BreakerState::Closed);
    }
}
