//! Appointment Service Library
//!
//! HTTP API for booking grooming and care appointments. Checks customers,
//! pets and services against their peer services through the resilient
//! clients and keeps every daily slot to a single active booking. Runs
//! standalone or embedded in the combined binary.

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

use crate::config::AppointmentServiceConfig;
use crate::infra::{Database, Migrator};
use crate::repository::AppointmentStore;
use crate::routes::create_router;
use crate::service::AppointmentBooking;
use crate::state::AppState;

/// Run the appointment service as an embedded component (for combined binary).
pub async fn run_embedded(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppointmentServiceConfig::from_env();
    run_server_with_config(host, port, config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppointmentServiceConfig::from_env();
    common::db::run_migration_action::<Migrator>(&config.database, action).await?;
    Ok(())
}

async fn run_server_with_config(
    host: &str,
    port: u16,
    config: AppointmentServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect(&config.database).await?;

    let tokens = Arc::new(JwtTokenService::from_config(&config.jwt)?);
    let gate = AuthorizationGate::new(tokens);
    let peers = PeerClients::from_config(&config.peers, &config.resilience)?;

    let repo = Arc::new(AppointmentStore::new(db.get_connection()));
    let appointments = Arc::new(AppointmentBooking::new(
        repo,
        peers.catalog.clone(),
        peers.customers.clone(),
        peers.pets.clone(),
    ));

    let state = AppState::new(appointments, gate, peers.gateway.clone(), Some(db));
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Appointment service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
