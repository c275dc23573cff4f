//! Resilient call gateway: circuit breaker plus bounded retry around any
//! async peer call.
//!
//! Every peer client funnels its requests through [`ResilientClient`]. The
//! breaker state is kept per [`CallTarget`] in a [`ResilienceRegistry`] that is
//! built once at startup and shared by all clients.

mod breaker;
mod registry;
mod retry;

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use common::{AppError, PeerServicesConfig, ResilienceConfig};

pub use breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Permit};
pub use registry::ResilienceRegistry;
pub use retry::RetryPolicy;

/// A peer service as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallTarget {
    name: Arc<str>,
    base_url: Arc<str>,
}

impl CallTarget {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            name: Arc::from(name.into()),
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Display for CallTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.base_url)
    }
}

/// Outcome of a single failed attempt, as classified by the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// I/O failure, timeout or 5xx. Retried and counted against the breaker.
    Transient(String),
    /// The peer answered with a 4xx. Returned at once.
    Rejected { status: u16, message: String },
    /// The peer answered but the payload could not be used.
    Invalid(String),
}

/// Terminal failure of a gateway call.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("circuit open for {target}")]
    CircuitOpen { target: String },

    #[error("{target} failed after {attempts} attempt(s): {last}")]
    Exhausted {
        target: String,
        attempts: u32,
        last: String,
    },

    #[error("peer rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid peer response: {0}")]
    Invalid(String),
}

impl CallError {
    pub fn status(&self) -> Option<u16> {
        match self {
            CallError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The peer could not be reached (open breaker or retries used up).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CallError::CircuitOpen { .. } | CallError::Exhausted { .. })
    }
}

impl From<CallError> for AppError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::CircuitOpen { target } => AppError::ServiceUnavailable(target),
            CallError::Exhausted { target, .. } => AppError::ServiceUnavailable(target),
            CallError::Rejected { status: 404, message } => AppError::NotFound(message),
            CallError::Rejected { status: 409, message } => AppError::Conflict(message),
            CallError::Rejected { status: 400 | 422, message } => AppError::Validation(message),
            CallError::Rejected { status, message } => {
                AppError::internal(format!("Peer returned {}: {}", status, message))
            }
            CallError::Invalid(msg) => AppError::internal(format!("Invalid peer response: {}", msg)),
        }
    }
}

/// Generic resilient caller shared by all peer clients.
#[derive(Clone)]
pub struct ResilientClient {
    registry: Arc<ResilienceRegistry>,
    retry: RetryPolicy,
}

impl ResilientClient {
    pub fn new(registry: Arc<ResilienceRegistry>, retry: RetryPolicy) -> Self {
        Self { registry, retry }
    }

    /// Build the registry and retry policy from configuration.
    pub fn from_config(resilience: &ResilienceConfig, peers: &PeerServicesConfig) -> Self {
        let registry = ResilienceRegistry::new(CircuitBreakerConfig::from(resilience));
        Self::new(
            Arc::new(registry),
            RetryPolicy::from_config(resilience, peers),
        )
    }

    pub fn registry(&self) -> &Arc<ResilienceRegistry> {
        &self.registry
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn state(&self, target: &CallTarget) -> CircuitState {
        self.registry.breaker(target).state()
    }

    /// Run `operation` against `target` under the breaker and retry policy.
    ///
    /// The operation is invoked once per attempt. Transient failures and
    /// timeouts are retried after the configured delay; rejections and
    /// invalid payloads end the call immediately. An open breaker ends the
    /// call without invoking the operation, also between attempts.
    pub async fn execute<T, F, Fut>(&self, target: &CallTarget, mut operation: F) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let breaker = self.registry.breaker(target);
        let max_attempts = self.retry.max_attempts;
        let mut last = String::new();

        for attempt in 1..=max_attempts {
            let Some(permit) = breaker.try_acquire() else {
                debug!("Circuit open for {}, skipping call", target.name());
                return Err(CallError::CircuitOpen {
                    target: target.name().to_string(),
                });
            };

            match tokio::time::timeout(self.retry.attempt_timeout, operation()).await {
                Ok(Ok(value)) => {
                    permit.success();
                    return Ok(value);
                }
                Ok(Err(AttemptError::Rejected { status, message })) => {
                    permit.success();
                    return Err(CallError::Rejected { status, message });
                }
                Ok(Err(AttemptError::Invalid(msg))) => {
                    permit.success();
                    return Err(CallError::Invalid(msg));
                }
                Ok(Err(AttemptError::Transient(msg))) => {
                    permit.failure();
                    last = msg;
                }
                Err(_) => {
                    permit.failure();
                    last = format!("timed out after {:?}", self.retry.attempt_timeout);
                }
            }

            if attempt < max_attempts {
                warn!(
                    "Call to {} failed (attempt {}/{}): {}, retrying in {:?}",
                    target.name(),
                    attempt,
                    max_attempts,
                    last,
                    self.retry.delay
                );
                tokio::time::sleep(self.retry.delay).await;
            }
        }

        warn!(
            "Call to {} failed after {} attempt(s): {}",
            target.name(),
            max_attempts,
            last
        );
        Err(CallError::Exhausted {
            target: target.name().to_string(),
            attempts: max_attempts,
            last,
        })
    }

    /// Like [`execute`](Self::execute) but never fails: any terminal failure
    /// yields `fallback`.
    pub async fn call<T, F, Fut>(&self, target: &CallTarget, operation: F, fallback: T) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        match self.execute(target, operation).await {
            Ok(value) => value,
            Err(err) => {
                debug!("Using fallback for {}: {}", target.name(), err);
                fallback
            }
        }
    }
}
