use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Runtime circuit state for an upstream operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Sliding window thresholds and timers.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Number of most recent calls kept in the window.
    pub window_size: usize,
    /// Calls required in the window before the failure rate is evaluated.
    pub minimum_calls: usize,
    /// Failure rate, in percent, at which the circuit opens.
    pub failure_rate_threshold: f64,
    pub open_timeout_secs: u64,
}

impl CircuitBreakerConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            minimum_calls: 5,
            failure_rate_threshold: 50.0,
            open_timeout_secs: 30,
        }
    }
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    // true for a failed call
    outcomes: VecDeque<bool>,
    opened_at: Option<Instant>,
    // set while the single HalfOpen trial call is outstanding
    trial_started: Option<Instant>,
}

/// Thread-safe circuit breaker for a single upstream operation.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    window_size: usize,
    minimum_calls: usize,
    failure_rate_threshold: f64,
    open_timeout: Duration,
    inner: Mutex<CircuitInner>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: &CircuitBreakerConfig) -> Self {
        let window_size = config.window_size.max(1);
        Self {
            name,
            window_size,
            minimum_calls: config.minimum_calls.clamp(1, window_size),
            failure_rate_threshold: config.failure_rate_threshold,
            open_timeout: config.open_timeout(),
            inner: Mutex::new(CircuitInner {
                state: CircuitState::Closed,
                outcomes: VecDeque::with_capacity(window_size),
                opened_at: None,
                trial_started: None,
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(name: &'static str, threshold: usize, timeout: Duration) -> Self {
        let mut breaker = Self::new(
            name,
            &CircuitBreakerConfig {
                window_size: threshold,
                minimum_calls: threshold,
                failure_rate_threshold: 100.0,
                open_timeout_secs: 0,
            },
        );
        breaker.open_timeout = timeout;
        breaker
    }

    fn lock(&self) -> MutexGuard<'_, CircuitInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns whether a call may go through, moving an expired `Open`
    /// circuit to `HalfOpen`. Only one trial call is let through while
    /// `HalfOpen`; another is granted if it has not reported back within the
    /// open timeout.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                let trial_lost = inner
                    .trial_started
                    .is_none_or(|started| started.elapsed() >= self.open_timeout);
                if trial_lost {
                    inner.trial_started = Some(Instant::now());
                }
                trial_lost
            }
            CircuitState::Open => {
                let can_probe = inner
                    .opened_at
                    .is_some_and(|opened_at| opened_at.elapsed() >= self.open_timeout);

                if can_probe {
                    debug!(breaker = self.name, "Circuit half-open, allowing trial call");
                    inner.state = CircuitState::HalfOpen;
                    inner.opened_at = None;
                    inner.trial_started = Some(Instant::now());
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            debug!(breaker = self.name, "Trial call succeeded, closing circuit");
            inner.state = CircuitState::Closed;
            inner.trial_started = None;
            inner.outcomes.clear();
            return;
        }
        self.push_outcome(&mut inner, false);
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            self.trip(&mut inner);
            return;
        }
        self.push_outcome(&mut inner, true);

        if inner.outcomes.len() >= self.minimum_calls
            && failure_rate(&inner.outcomes) >= self.failure_rate_threshold
        {
            self.trip(&mut inner);
        }
    }

    fn push_outcome(&self, inner: &mut CircuitInner, failed: bool) {
        if inner.outcomes.len() == self.window_size {
            inner.outcomes.pop_front();
        }
        inner.outcomes.push_back(failed);
    }

    fn trip(&self, inner: &mut CircuitInner) {
        warn!(breaker = self.name, "Circuit opened");
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.trial_started = None;
        inner.outcomes.clear();
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }
}

fn failure_rate(outcomes: &VecDeque<bool>) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    let failures = outcomes.iter().filter(|failed| **failed).count();
    failures as f64 * 100.0 / outcomes.len() as f64
}
