//! Health check handlers.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use clients::CircuitState;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: ServiceHealth,
    /// Circuit state per peer service
    pub circuits: BTreeMap<String, String>,
}

/// Service health with optional error message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create health routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// Database connectivity and peer circuit states
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service healthy or degraded", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = match &state.database {
        Some(db) => match db.ping().await {
            Ok(()) => ServiceHealth {
                status: "healthy".to_string(),
                error: None,
            },
            Err(e) => ServiceHealth {
                status: "unhealthy".to_string(),
                error: Some(e.to_string()),
            },
        },
        None => ServiceHealth {
            status: "not configured".to_string(),
            error: None,
        },
    };

    let snapshot = state.gateway.registry().snapshot();
    let any_open = snapshot
        .iter()
        .any(|(_, circuit)| *circuit != CircuitState::Closed);
    let circuits = snapshot
        .into_iter()
        .map(|(target, circuit)| (target.name().to_string(), circuit.to_string()))
        .collect();

    let db_down = database.status == "unhealthy";
    let status = if db_down || any_open { "degraded" } else { "healthy" };

    let response = HealthResponse {
        status: status.to_string(),
        database,
        circuits,
    };

    if db_down {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response()
    } else {
        (StatusCode::OK, Json(response)).into_response()
    }
}
