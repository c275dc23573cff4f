//! Order Service Library
//!
//! HTTP API for placing and fulfilling orders. Stock lives in the catalog
//! service and is reserved, restored and compensated through the resilient
//! peer clients. Runs standalone or embedded in the combined binary.

pub mod config;
pub mod handlers;
pub mod infra;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use clients::PeerClients;
use common::auth::JwtTokenService;
use common::AuthorizationGate;

pub use common::db::MigrateAction;

use crate::config::OrderServiceConfig;
use crate::infra::{Database, Migrator};
use crate::repository::OrderStore;
use crate::routes::create_router;
use crate::service::OrderFulfillment;
use crate::state::AppState;

/// Run the order service as an embedded component (for combined binary).
pub async fn run_embedded(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = OrderServiceConfig::from_env();
    run_server_with_config(host, port, config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = OrderServiceConfig::from_env();
    common::db::run_migration_action::<Migrator>(&config.database, action).await?;
    Ok(())
}

/// Run the HTTP server with the given configuration.
async fn run_server_with_config(
    host: &str,
    port: u16,
    config: OrderServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Database::connect(&config.database).await?;

    // Token verification and peer clients
    let tokens = Arc::new(JwtTokenService::from_config(&config.jwt)?);
    let gate = AuthorizationGate::new(tokens);
    let peers = PeerClients::from_config(&config.peers, &config.resilience)?;

    // Create repository and workflow
    let repo = Arc::new(OrderStore::new(db.get_connection()));
    let orders = Arc::new(OrderFulfillment::new(
        repo,
        peers.catalog.clone(),
        peers.customers.clone(),
    ));

    let state = AppState::new(orders, gate, peers.gateway.clone(), Some(db));
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Build address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Order service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
