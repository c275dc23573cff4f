//! Peer-service clients for the pet-shop services.
//!
//! This crate provides:
//! - The resilient call gateway (circuit breaker, retry, breaker registry)
//! - Catalog, customer and pet clients built on top of it
//! - [`PeerClients`], the bundle a service wires up at startup

pub mod catalog_client;
pub mod customer_client;
pub mod gateway;
pub mod http;
pub mod pet_client;

use std::sync::Arc;

use common::{AppResult, PeerServicesConfig, ResilienceConfig};

pub use catalog_client::{CatalogApi, CatalogClient};
pub use customer_client::{CustomerApi, CustomerClient};
pub use gateway::{
    AttemptError, CallError, CallTarget, CircuitBreakerConfig, CircuitState, ResilienceRegistry,
    ResilientClient, RetryPolicy,
};
pub use pet_client::{PetApi, PetClient};

#[cfg(any(test, feature = "test-utils"))]
pub use catalog_client::MockCatalogApi;
#[cfg(any(test, feature = "test-utils"))]
pub use customer_client::MockCustomerApi;
#[cfg(any(test, feature = "test-utils"))]
pub use pet_client::MockPetApi;

/// All peer clients of a service, sharing one gateway and breaker registry.
#[derive(Clone)]
pub struct PeerClients {
    pub gateway: ResilientClient,
    pub catalog: Arc<CatalogClient>,
    pub customers: Arc<CustomerClient>,
    pub pets: Arc<PetClient>,
}

impl PeerClients {
    pub fn from_config(peers: &PeerServicesConfig, resilience: &ResilienceConfig) -> AppResult<Self> {
        let gateway = ResilientClient::from_config(resilience, peers);
        let http = http::build_http_client(peers)?;

        Ok(Self {
            catalog: Arc::new(CatalogClient::new(
                gateway.clone(),
                http.clone(),
                &peers.catalog_url,
            )),
            customers: Arc::new(CustomerClient::new(
                gateway.clone(),
                http.clone(),
                &peers.customer_url,
            )),
            pets: Arc::new(PetClient::new(gateway.clone(), http, &peers.pet_url)),
            gateway,
        })
    }

    /// Circuit state of every registered peer, for health reporting.
    pub fn circuit_states(&self) -> Vec<(String, CircuitState)> {
        self.gateway
            .registry()
            .snapshot()
            .into_iter()
            .map(|(target, state)| (target.name().to_string(), state))
            .collect()
    }
}
