//! Registry of circuit breakers by call target.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use super::CallTarget;

/// One breaker per [`CallTarget`], created on first use and kept for the
/// lifetime of the registry. Build one at startup and share it.
pub struct ResilienceRegistry {
    breakers: RwLock<HashMap<CallTarget, Arc<CircuitBreaker>>>,
    config: CircuitBreakerConfig,
}

impl ResilienceRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get or create the breaker for a target
    pub fn breaker(&self, target: &CallTarget) -> Arc<CircuitBreaker> {
        if let Some(cb) = self.breakers.read().get(target) {
            return Arc::clone(cb);
        }

        let mut breakers = self.breakers.write();
        // Another caller may have inserted it meanwhile
        Arc::clone(breakers.entry(target.clone()).or_insert_with(|| {
            Arc::new(CircuitBreaker::new(target.name(), self.config.clone()))
        }))
    }

    /// Register a target up front so it shows in health reports before the
    /// first call.
    pub fn register(&self, target: &CallTarget) {
        self.breaker(target);
    }

    /// Current state of every known target, sorted by name.
    pub fn snapshot(&self) -> Vec<(CallTarget, CircuitState)> {
        let mut states: Vec<_> = self
            .breakers
            .read()
            .iter()
            .map(|(target, cb)| (target.clone(), cb.state()))
            .collect();
        states.sort_by(|a, b| a.0.name().cmp(b.0.name()));
        states
    }

    pub fn reset_all(&self) {
        for cb in self.breakers.read().values() {
            cb.reset();
        }
    }
}

impl Default for ResilienceRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
