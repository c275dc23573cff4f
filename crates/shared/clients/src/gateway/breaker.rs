//! Per-target circuit breaker with a count-based sliding window.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use common::ResilienceConfig;

/// State of the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow through; outcomes feed the window
    Closed,
    /// Calls are rejected until the open duration elapses
    Open,
    /// A limited number of trial calls decide between closing and reopening
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of most recent outcomes kept
    pub window_size: usize,
    /// Outcomes required before the failure rate is evaluated
    pub minimum_calls: usize,
    /// Failure percentage that opens the breaker
    pub failure_rate_threshold: f64,
    /// Time spent open before trials are allowed
    pub open_duration: Duration,
    /// Concurrent trial calls allowed while half-open
    pub half_open_trials: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::from(&ResilienceConfig::default())
    }
}

impl From<&ResilienceConfig> for CircuitBreakerConfig {
    fn from(config: &ResilienceConfig) -> Self {
        let window_size = config.window_size.max(1);
        Self {
            window_size,
            minimum_calls: config.minimum_calls.clamp(1, window_size),
            failure_rate_threshold: config.failure_rate_threshold,
            open_duration: Duration::from_millis(config.open_duration_ms),
            half_open_trials: config.half_open_trials.max(1),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_window(mut self, window_size: usize, minimum_calls: usize) -> Self {
        self.window_size = window_size.max(1);
        self.minimum_calls = minimum_calls.clamp(1, self.window_size);
        self
    }

    pub fn with_open_duration(mut self, open_duration: Duration) -> Self {
        self.open_duration = open_duration;
        self
    }

    pub fn with_half_open_trials(mut self, trials: u32) -> Self {
        self.half_open_trials = trials.max(1);
        self
    }
}

struct BreakerInner {
    state: CircuitState,
    /// `true` marks a failed call
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    trials_in_flight: u32,
}

impl BreakerInner {
    fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|failed| **failed).count();
        failures as f64 * 100.0 / self.window.len() as f64
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.trials_in_flight = 0;
        self.window.clear();
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.opened_at = None;
        self.trials_in_flight = 0;
        self.window.clear();
    }
}

/// Circuit breaker guarding one peer target.
///
/// All state lives behind one lock, so every admission decision and every
/// recorded outcome is a single atomic mutation.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let window = VecDeque::with_capacity(config.window_size);
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                window,
                opened_at: None,
                trials_in_flight: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state as last recorded (an expired open period is reported as
    /// open until the next call attempts admission).
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Failure percentage over the current window.
    pub fn failure_rate(&self) -> f64 {
        self.inner.lock().failure_rate()
    }

    /// Ask to place one call. `None` means fail fast.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Some(Permit::new(self, false)),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.open_duration)
                    .unwrap_or(true);
                if !elapsed {
                    return None;
                }
                inner.state = CircuitState::HalfOpen;
                inner.trials_in_flight = 1;
                info!("Circuit breaker for {} transitioning to HALF_OPEN", self.name);
                Some(Permit::new(self, true))
            }
            CircuitState::HalfOpen => {
                if inner.trials_in_flight < self.config.half_open_trials {
                    inner.trials_in_flight += 1;
                    Some(Permit::new(self, true))
                } else {
                    None
                }
            }
        }
    }

    fn record_success(&self, trial: bool) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen if trial => {
                inner.close();
                info!("Circuit breaker for {} recovered, transitioning to CLOSED", self.name);
            }
            CircuitState::Closed => self.push_outcome(&mut inner, false),
            // Outcome of a call admitted under a previous state
            _ => {}
        }
    }

    fn record_failure(&self, trial: bool) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen if trial => {
                inner.open();
                warn!(
                    "Circuit breaker for {} reopened after failed trial call",
                    self.name
                );
            }
            CircuitState::Closed => {
                self.push_outcome(&mut inner, true);
                if inner.window.len() >= self.config.minimum_calls
                    && inner.failure_rate() >= self.config.failure_rate_threshold
                {
                    let rate = inner.failure_rate();
                    inner.open();
                    warn!(
                        "Circuit breaker for {} opened (failure rate {:.0}%)",
                        self.name, rate
                    );
                }
            }
            _ => {}
        }
    }

    fn release_trial(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
        }
    }

    fn push_outcome(&self, inner: &mut BreakerInner, failed: bool) {
        if inner.window.len() == self.config.window_size {
            inner.window.pop_front();
        }
        inner.window.push_back(failed);
        debug!(
            "Circuit breaker {} window {}/{} failure rate {:.0}%",
            self.name,
            inner.window.len(),
            self.config.window_size,
            inner.failure_rate()
        );
    }

    /// Force the breaker back to closed with an empty window.
    pub fn reset(&self) {
        self.inner.lock().close();
        debug!("Circuit breaker for {} reset", self.name);
    }
}

/// Admission ticket for one call. Report the outcome with
/// [`Permit::success`] or [`Permit::failure`]; dropping it unreported frees a
/// half-open trial slot without recording anything.
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            settled: false,
        }
    }

    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.record_success(self.trial);
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure(self.trial);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.release_trial();
        }
    }
}
