//! Authorization: token verification, identity resolution and access checks.

mod gate;
#[cfg(feature = "jwt")]
mod jwt;
mod middleware;

pub use gate::{AuthorizationGate, TokenService, TokenVerification};
#[cfg(feature = "jwt")]
pub use jwt::{Claims, JwtTokenService};
pub use middleware::auth_middleware;
