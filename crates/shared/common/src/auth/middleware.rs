//! Authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use super::gate::AuthorizationGate;
use crate::error::AppError;

/// Resolves the caller through the gate and stores the [`domain::Identity`]
/// in request extensions. Requests without a valid identity get `401`.
pub async fn auth_middleware(
    State(gate): State<AuthorizationGate>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = gate.authorize(request.headers());
    if !identity.valid {
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
