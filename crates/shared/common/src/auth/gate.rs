//! Authorization gate: bearer token -> scoped identity, plus the role and
//! ownership checks every workflow relies on.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::debug;

use domain::{Identity, Role, BEARER_TOKEN_PREFIX};

use crate::error::{AppError, AppResult};

/// Outcome of checking a token with the token service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenVerification {
    pub subject: String,
    /// Raw role claim; unknown values invalidate the identity
    pub role: String,
    pub owner_id: Option<i64>,
    pub valid: bool,
}

impl TokenVerification {
    pub fn invalid() -> Self {
        Self {
            subject: String::new(),
            role: String::new(),
            owner_id: None,
            valid: false,
        }
    }
}

/// Opaque token verifier (signing and validation internals live behind it).
pub trait TokenService: Send + Sync {
    fn verify(&self, token: &str) -> TokenVerification;
}

/// Turns request headers into an [`Identity`] and centralises role and
/// ownership checks.
#[derive(Clone)]
pub struct AuthorizationGate {
    tokens: Arc<dyn TokenService>,
}

impl AuthorizationGate {
    pub fn new(tokens: Arc<dyn TokenService>) -> Self {
        Self { tokens }
    }

    /// Resolve the caller. Never fails: a missing or rejected token yields an
    /// invalid identity and the caller decides to answer `Unauthorized`.
    pub fn authorize(&self, headers: &HeaderMap) -> Identity {
        let Some(token) = extract_bearer(headers) else {
            debug!("Request without bearer token");
            return Identity::invalid();
        };

        let verification = self.tokens.verify(token);
        if !verification.valid {
            debug!("Token rejected by token service");
            return Identity::invalid();
        }

        match verification.role.parse::<Role>() {
            Ok(role) => Identity::verified(verification.subject, role, verification.owner_id),
            Err(_) => {
                debug!("Token carries unknown role '{}'", verification.role);
                Identity::invalid()
            }
        }
    }

    /// Resolve the caller and require one of `allowed` roles.
    pub fn authorize_role(&self, headers: &HeaderMap, allowed: &[Role]) -> AppResult<Identity> {
        let identity = self.authorize(headers);
        Self::require_role(&identity, allowed)?;
        Ok(identity)
    }

    /// `Unauthorized` for invalid identities, `Forbidden` for a role outside
    /// `allowed`.
    pub fn require_role(identity: &Identity, allowed: &[Role]) -> AppResult<()> {
        let role = valid_role(identity)?;
        if allowed.contains(&role) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Customers may only act on resources they own; admins act on anything.
    pub fn require_ownership(identity: &Identity, resource_owner_id: i64) -> AppResult<()> {
        match valid_role(identity)? {
            Role::Admin => Ok(()),
            Role::Customer => {
                if identity.owner_id == Some(resource_owner_id) {
                    Ok(())
                } else {
                    Err(AppError::Forbidden)
                }
            }
        }
    }

    /// Owner filter to apply to listings: customers are pinned to their own
    /// id, admins see what they asked for.
    pub fn scope_owner_filter(identity: &Identity, requested: Option<i64>) -> AppResult<Option<i64>> {
        match valid_role(identity)? {
            Role::Admin => Ok(requested),
            Role::Customer => {
                let own = identity.owner_id.ok_or(AppError::Forbidden)?;
                match requested {
                    Some(other) if other != own => Err(AppError::Forbidden),
                    _ => Ok(Some(own)),
                }
            }
        }
    }
}

fn valid_role(identity: &Identity) -> AppResult<Role> {
    match (identity.valid, identity.role) {
        (true, Some(role)) => Ok(role),
        _ => Err(AppError::Unauthorized),
    }
}

/// Extract the bearer token from the Authorization header.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_TOKEN_PREFIX)?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
