//! Route configuration.

use axum::{middleware, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::auth::auth_middleware;

use crate::handlers::{health_routes, order_routes};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no auth)
        .nest("/health", health_routes())
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Order routes (auth required)
        .nest(
            "/pedidos",
            order_routes().route_layer(middleware::from_fn_with_state(
                state.gate.clone(),
                auth_middleware,
            )),
        )
        .with_state(state)
}
