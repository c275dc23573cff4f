//! Route configuration.

use axum::{middleware, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::auth::auth_middleware;

use crate::handlers::{appointment_routes, health_routes, slot_routes};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let gate = state.gate.clone();
    let auth = || middleware::from_fn_with_state(gate.clone(), auth_middleware);

    Router::new()
        // Health check (no auth)
        .nest("/health", health_routes())
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Booking routes (auth required)
        .nest("/agendamentos", appointment_routes().route_layer(auth()))
        .nest("/horarios-disponiveis", slot_routes().route_layer(auth()))
        .with_state(state)
}
