//! JWT-backed token service.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use domain::{Role, MIN_JWT_SECRET_LENGTH};

use super::gate::{TokenService, TokenVerification};
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    /// Customer the token acts for (absent for staff)
    #[serde(rename = "clienteId", default, skip_serializing_if = "Option::is_none")]
    pub cliente_id: Option<i64>,
    pub exp: i64,
    pub iat: i64,
}

/// HS256 token service shared by every pet-shop service.
pub struct JwtTokenService {
    secret: String,
    expiration_hours: i64,
}

impl JwtTokenService {
    /// Create a token service; the secret must be at least
    /// [`MIN_JWT_SECRET_LENGTH`] bytes.
    pub fn new(secret: impl Into<String>, expiration_hours: i64) -> AppResult<Self> {
        let secret = secret.into();
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::internal(format!(
                "JWT secret must be at least {} characters",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        Ok(Self {
            secret,
            expiration_hours,
        })
    }

    pub fn from_config(config: &JwtConfig) -> AppResult<Self> {
        Self::new(config.secret.clone(), config.expiration_hours)
    }

    /// Sign a token. Used by tests and local tooling; real users obtain
    /// their tokens from the identity provider.
    pub fn issue(&self, subject: &str, role: Role, owner_id: Option<i64>) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.expiration_hours);

        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            cliente_id: owner_id,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    fn decode_claims(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

impl TokenService for JwtTokenService {
    fn verify(&self, token: &str) -> TokenVerification {
        match self.decode_claims(token) {
            Ok(claims) => TokenVerification {
                subject: claims.sub,
                role: claims.role,
                owner_id: claims.cliente_id,
                valid: true,
            },
            Err(e) => {
                debug!("JWT verification failed: {}", e);
                TokenVerification::invalid()
            }
        }
    }
}
